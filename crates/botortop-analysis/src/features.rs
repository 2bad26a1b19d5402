//! Per-team features of cross-map trade games.

use serde::{Deserialize, Serialize};

use botortop_stats::descriptive;

use crate::{
    dataset::{PlayerRow, Position},
    trade::{self, GankFocus, TeamGankSummary},
};

/// Weight of the XP difference in the lane impact index (the CS weight is the rest).
pub const LII_XP_WEIGHT: f64 = 0.5;

/// One team of one trade game, with its engineered features.
///
/// This is the record written to `processed_data.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRow {
    pub gameid: String,
    pub teamid: String,
    pub side: Option<String>,
    pub gank_focus: GankFocus,
    pub result: f64,
    pub jng_ka10: f64,
    pub bot_ka10: f64,
    pub top_ka10: f64,
    pub dragons: f64,
    pub heralds: f64,
    /// 1 when the team took a dragon or a herald, else 0
    pub obj_conversion: f64,
    pub top_xpdiff10: f64,
    pub bot_xpdiff10: f64,
    pub top_csdiff10: f64,
    pub bot_csdiff10: f64,
    pub lii_top: f64,
    pub lii_bot: f64,
    /// `lii_bot - lii_top`
    pub lii_diff: f64,
}

impl TradeRow {
    #[must_use]
    pub fn is_win(&self) -> bool {
        self.result >= 0.5
    }
}

/// Lane impact index: a weighted blend of XP and CS differences at 10 minutes.
///
/// ```
/// use botortop_analysis::features::lane_impact_index;
///
/// assert_eq!(lane_impact_index(200.0, 10.0), 105.0);
/// ```
#[must_use]
pub fn lane_impact_index(xpdiff10: f64, csdiff10: f64) -> f64 {
    LII_XP_WEIGHT * xpdiff10 + (1.0 - LII_XP_WEIGHT) * csdiff10
}

fn max_of(rows: &[&PlayerRow], field: impl Fn(&PlayerRow) -> Option<f64>) -> f64 {
    rows.iter()
        .filter_map(|row| field(row))
        .reduce(f64::max)
        .unwrap_or(0.0)
}

fn lane_diffs(rows: &[&PlayerRow], position: &Position) -> (f64, f64) {
    rows.iter()
        .find(|row| row.position.as_ref() == Some(position))
        .map_or((0.0, 0.0), |row| {
            (
                row.xpdiffat10.unwrap_or(0.0),
                row.csdiffat10.unwrap_or(0.0),
            )
        })
}

/// Attaches objective and lane features to trade-game team summaries.
///
/// `rows` are all player rows of the dataset; the team's rows are looked up by
/// `(gameid, teamid)`. Summaries without a gank focus are skipped.
#[must_use]
pub fn engineer_features(trades: Vec<TeamGankSummary>, rows: &[PlayerRow]) -> Vec<TradeRow> {
    let teams = trade::group_by_team(rows);
    trades
        .into_iter()
        .filter_map(|summary| {
            let gank_focus = summary.gank_focus?;
            let team_rows = teams
                .get(&(summary.gameid.as_str(), summary.teamid.as_str()))
                .map_or(&[][..], Vec::as_slice);

            let dragons = max_of(team_rows, |row| row.dragons);
            let heralds = max_of(team_rows, |row| row.heralds);
            let obj_conversion = if dragons > 0.0 || heralds > 0.0 {
                1.0
            } else {
                0.0
            };
            let (top_xpdiff10, top_csdiff10) = lane_diffs(team_rows, &Position::Top);
            let (bot_xpdiff10, bot_csdiff10) = lane_diffs(team_rows, &Position::Bottom);
            let lii_top = lane_impact_index(top_xpdiff10, top_csdiff10);
            let lii_bot = lane_impact_index(bot_xpdiff10, bot_csdiff10);

            Some(TradeRow {
                gameid: summary.gameid,
                teamid: summary.teamid,
                side: summary.side,
                gank_focus,
                result: summary.result,
                jng_ka10: summary.jng_ka10,
                bot_ka10: summary.bot_ka10,
                top_ka10: summary.top_ka10,
                dragons,
                heralds,
                obj_conversion,
                top_xpdiff10,
                bot_xpdiff10,
                top_csdiff10,
                bot_csdiff10,
                lii_top,
                lii_bot,
                lii_diff: lii_bot - lii_top,
            })
        })
        .collect()
}

/// Runs trade detection and feature engineering over all player rows.
#[must_use]
pub fn build_trade_rows(rows: &[PlayerRow]) -> Vec<TradeRow> {
    let summaries = trade::summarize_teams(rows);
    tracing::debug!(teams = summaries.len(), "summarized team early games");
    let trades = trade::trade_games(summaries);
    engineer_features(trades, rows)
}

/// Headline numbers written to `summary_stats.json`.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryStats {
    pub total_trade_games: usize,
    pub bot_focus_count: usize,
    pub top_focus_count: usize,
    pub bot_focus_winrate: f64,
    pub top_focus_winrate: f64,
    pub bot_focus_obj_rate: f64,
    pub top_focus_obj_rate: f64,
}

/// Values of `field` for the rows with the given focus.
#[must_use]
pub fn focus_values(
    rows: &[TradeRow],
    focus: GankFocus,
    field: impl Fn(&TradeRow) -> f64,
) -> Vec<f64> {
    rows.iter()
        .filter(|row| row.gank_focus == focus)
        .map(field)
        .collect()
}

impl SummaryStats {
    /// Rates are `NaN` for a focus with no rows.
    #[must_use]
    pub fn new(rows: &[TradeRow]) -> Self {
        let bot_wins = focus_values(rows, GankFocus::Bot, |r| r.result);
        let top_wins = focus_values(rows, GankFocus::Top, |r| r.result);
        Self {
            total_trade_games: rows.len() / 2,
            bot_focus_count: bot_wins.len(),
            top_focus_count: top_wins.len(),
            bot_focus_winrate: descriptive::mean(&bot_wins),
            top_focus_winrate: descriptive::mean(&top_wins),
            bot_focus_obj_rate: descriptive::mean(&focus_values(rows, GankFocus::Bot, |r| {
                r.obj_conversion
            })),
            top_focus_obj_rate: descriptive::mean(&focus_values(rows, GankFocus::Top, |r| {
                r.obj_conversion
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{player, trade_game};

    fn enriched_game(gameid: &str) -> Vec<PlayerRow> {
        let mut rows = trade_game(gameid);
        rows[1].xpdiffat10 = Some(100.0);
        rows[1].csdiffat10 = Some(10.0);
        rows[2].xpdiffat10 = Some(-40.0);
        rows[2].csdiffat10 = None;
        // Team-level objectives live on the summary row
        let mut team = player(gameid, "t1", Position::Other("team".to_owned()), 0.0, 0.0);
        team.dragons = Some(1.0);
        rows.push(team);
        rows[4].heralds = Some(0.0);
        rows
    }

    #[test]
    fn test_build_trade_rows() {
        let rows = build_trade_rows(&enriched_game("g1"));
        assert_eq!(rows.len(), 2);

        let bot = &rows[0];
        assert_eq!(bot.gank_focus, GankFocus::Bot);
        assert_eq!(bot.dragons, 1.0);
        assert_eq!(bot.obj_conversion, 1.0);
        assert_eq!(bot.lii_bot, 55.0);
        assert_eq!(bot.lii_top, -20.0);
        assert_eq!(bot.lii_diff, 75.0);
        assert!(bot.is_win());

        let top = &rows[1];
        assert_eq!(top.gank_focus, GankFocus::Top);
        assert_eq!(top.dragons, 0.0);
        assert_eq!(top.heralds, 0.0);
        assert_eq!(top.obj_conversion, 0.0);
        assert_eq!(top.lii_diff, 0.0);
    }

    #[test]
    fn test_summary_stats() {
        let mut all = enriched_game("g1");
        all.extend(trade_game("g2"));
        let rows = build_trade_rows(&all);
        let summary = SummaryStats::new(&rows);
        assert_eq!(summary.total_trade_games, 2);
        assert_eq!(summary.bot_focus_count, 2);
        assert_eq!(summary.top_focus_count, 2);
        assert_eq!(summary.bot_focus_winrate, 1.0);
        assert_eq!(summary.top_focus_winrate, 0.0);
        assert_eq!(summary.bot_focus_obj_rate, 0.5);
        assert_eq!(summary.top_focus_obj_rate, 0.0);
    }

    #[test]
    fn test_trade_row_json_shape() {
        let rows = build_trade_rows(&trade_game("g1"));
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["gank_focus"], "bot");
        assert_eq!(json["side"], "Blue");
        assert!(json.get("lii_diff").is_some());

        let back: TradeRow = serde_json::from_value(json).unwrap();
        assert_eq!(back, rows[0]);
    }

    #[test]
    fn test_infinite_lane_diffs_stay_finite() {
        let csv = "\
gameid,teamid,side,position,result,killsat10,assistsat10,xpdiffat10,csdiffat10
g1,t1,Blue,jng,1,1,0,,
g1,t1,Blue,bot,1,2,0,inf,3
g1,t1,Blue,top,1,0,0,-inf,2
g1,t2,Red,jng,0,0,1,,
g1,t2,Red,top,0,1,0,infinity,1
g1,t2,Red,bot,0,0,0,5,inf
";
        let table = crate::dataset::RawTable::from_reader(csv.as_bytes()).unwrap();
        let rows = build_trade_rows(&table.player_rows().unwrap());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].lii_bot, 1.5);
        assert_eq!(rows[0].lii_top, 1.0);
        assert!(rows.iter().all(|r| r.lii_diff.is_finite()));

        let json = serde_json::to_string(&rows).unwrap();
        let back: Vec<TradeRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rows);
        assert!(crate::eda::EdaReport::new(&back).lii_distribution.is_some());
    }
}
