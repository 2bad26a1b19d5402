//! Cross-map trade detection
//!
//! A team's jungler "focused" a lane when it was active in the first ten
//! minutes (kills + assists > 0) and that lane's carry saw more early action
//! than the opposite side lane. A game is a cross-map trade when one team
//! focused bot lane and the other focused top lane.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::dataset::{PlayerRow, Position};

/// Lane the jungler spent its early pressure on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GankFocus {
    Bot,
    Top,
}

impl GankFocus {
    pub const ALL: [Self; 2] = [Self::Bot, Self::Top];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bot => "bot",
            Self::Top => "top",
        }
    }

    /// Binary encoding used as a model feature (`bot` = 1).
    #[must_use]
    pub fn encoded(self) -> f64 {
        match self {
            Self::Bot => 1.0,
            Self::Top => 0.0,
        }
    }

    /// Classifies a team's early game from kills + assists at 10 minutes.
    ///
    /// ```
    /// use botortop_analysis::trade::GankFocus;
    ///
    /// assert_eq!(GankFocus::classify(2.0, 3.0, 1.0), Some(GankFocus::Bot));
    /// assert_eq!(GankFocus::classify(2.0, 0.0, 1.0), Some(GankFocus::Top));
    /// assert_eq!(GankFocus::classify(2.0, 1.0, 1.0), None);
    /// // An inactive jungler focused nothing
    /// assert_eq!(GankFocus::classify(0.0, 3.0, 1.0), None);
    /// ```
    #[must_use]
    pub fn classify(jng_ka10: f64, bot_ka10: f64, top_ka10: f64) -> Option<Self> {
        if jng_ka10 <= 0.0 {
            return None;
        }
        if bot_ka10 > top_ka10 {
            Some(Self::Bot)
        } else if top_ka10 > bot_ka10 {
            Some(Self::Top)
        } else {
            None
        }
    }
}

impl fmt::Display for GankFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Early-game activity of one team in one game.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamGankSummary {
    pub gameid: String,
    pub teamid: String,
    pub side: Option<String>,
    pub result: f64,
    pub jng_ka10: f64,
    pub bot_ka10: f64,
    pub top_ka10: f64,
    pub gank_focus: Option<GankFocus>,
}

/// Player rows grouped by `(gameid, teamid)`, in key order.
///
/// Rows without a team id are left out.
#[must_use]
pub fn group_by_team(rows: &[PlayerRow]) -> BTreeMap<(&str, &str), Vec<&PlayerRow>> {
    let mut groups = BTreeMap::<_, Vec<_>>::new();
    for row in rows {
        if let Some(teamid) = &row.teamid {
            groups
                .entry((row.gameid.as_str(), teamid.as_str()))
                .or_default()
                .push(row);
        }
    }
    groups
}

fn first_with<'a>(rows: &[&'a PlayerRow], position: &Position) -> Option<&'a PlayerRow> {
    rows.iter()
        .copied()
        .find(|row| row.position.as_ref() == Some(position))
}

/// Summarizes every team that fielded a jungler with a known result.
#[must_use]
pub fn summarize_teams(rows: &[PlayerRow]) -> Vec<TeamGankSummary> {
    let mut summaries = vec![];
    for ((gameid, teamid), team_rows) in group_by_team(rows) {
        let Some(jungler) = first_with(&team_rows, &Position::Jungle) else {
            continue;
        };
        let Some(result) = jungler.result else {
            tracing::debug!(gameid, teamid, "skipping team without result");
            continue;
        };
        let jng_ka10 = jungler.kills_assists_at_10();
        let bot_ka10 =
            first_with(&team_rows, &Position::Bottom).map_or(0.0, PlayerRow::kills_assists_at_10);
        let top_ka10 =
            first_with(&team_rows, &Position::Top).map_or(0.0, PlayerRow::kills_assists_at_10);

        summaries.push(TeamGankSummary {
            gameid: gameid.to_owned(),
            teamid: teamid.to_owned(),
            side: jungler.side.clone(),
            result,
            jng_ka10,
            bot_ka10,
            top_ka10,
            gank_focus: GankFocus::classify(jng_ka10, bot_ka10, top_ka10),
        });
    }
    summaries
}

/// Keeps the team summaries of games where exactly two teams traded lanes.
///
/// The returned summaries all have a gank focus and come in pairs per game.
#[must_use]
pub fn trade_games(summaries: Vec<TeamGankSummary>) -> Vec<TeamGankSummary> {
    let mut by_game = BTreeMap::<String, Vec<TeamGankSummary>>::new();
    for summary in summaries {
        by_game
            .entry(summary.gameid.clone())
            .or_default()
            .push(summary);
    }

    let games = by_game.len();
    let trades = by_game
        .into_values()
        .filter(|teams| {
            let [a, b] = teams.as_slice() else {
                return false;
            };
            matches!(
                (a.gank_focus, b.gank_focus),
                (Some(GankFocus::Bot), Some(GankFocus::Top))
                    | (Some(GankFocus::Top), Some(GankFocus::Bot))
            )
        })
        .flatten()
        .collect::<Vec<_>>();

    tracing::info!(
        games,
        trade_games = trades.len() / 2,
        "identified cross-map trade games"
    );
    trades
}
