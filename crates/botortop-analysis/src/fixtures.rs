//! Synthetic match rows shared by the unit tests.

use crate::dataset::{PlayerRow, Position};

/// A player row of team `teamid`; teams ending in `1` play blue side and win.
pub(crate) fn player(
    gameid: &str,
    teamid: &str,
    position: Position,
    kills: f64,
    assists: f64,
) -> PlayerRow {
    let blue = teamid.ends_with('1');
    PlayerRow {
        gameid: gameid.to_owned(),
        teamid: Some(teamid.to_owned()),
        side: Some(if blue { "Blue" } else { "Red" }.to_owned()),
        position: Some(position),
        result: Some(if blue { 1.0 } else { 0.0 }),
        killsat10: Some(kills),
        assistsat10: Some(assists),
        dragons: None,
        heralds: None,
        xpdiffat10: None,
        csdiffat10: None,
    }
}

/// One game in which `t1` focuses bot and `t2` focuses top.
pub(crate) fn trade_game(gameid: &str) -> Vec<PlayerRow> {
    vec![
        player(gameid, "t1", Position::Jungle, 1.0, 1.0),
        player(gameid, "t1", Position::Bottom, 2.0, 0.0),
        player(gameid, "t1", Position::Top, 0.0, 0.0),
        player(gameid, "t2", Position::Jungle, 0.0, 1.0),
        player(gameid, "t2", Position::Bottom, 0.0, 0.0),
        player(gameid, "t2", Position::Top, 1.0, 1.0),
    ]
}
