//! Exploratory summaries of the processed trade rows.

use std::collections::BTreeMap;

use serde::Serialize;

use botortop_stats::{
    comprehensive::ComprehensiveStats,
    descriptive::{self, DescriptiveStats},
    percentiles,
};

use crate::{features::TradeRow, trade::GankFocus};

pub const HEAD_ROWS: usize = 5;
pub const LII_HISTOGRAM_BINS: usize = 30;
pub const LII_QUANTILE_BINS: usize = 10;
/// Normal quantile for a two-sided 95% confidence interval.
pub const Z_95: f64 = 1.96;

/// Column subset of a trade row shown as a preview.
#[derive(Debug, Clone, Serialize)]
pub struct HeadRow {
    pub gameid: String,
    pub teamid: String,
    pub gank_focus: GankFocus,
    pub result: f64,
    pub obj_conversion: f64,
    pub lii_diff: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SidePivot {
    pub side: String,
    pub gank_focus: GankFocus,
    /// Mean win rate
    pub result: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjConversionByFocus {
    pub gank_focus: GankFocus,
    pub result: f64,
    pub obj_conversion: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WinrateByFocus {
    pub gank_focus: GankFocus,
    pub winrate: f64,
    pub count: usize,
    /// Standard error of the mean (`NaN` for a single row)
    pub sem: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiiBin {
    pub gank_focus: GankFocus,
    pub lii_bin: usize,
    pub win_rate: f64,
    pub lii_diff: f64,
    pub count: usize,
}

/// Every exploratory table, one export file each.
#[derive(Debug, Clone, Serialize)]
pub struct EdaReport {
    pub head: Vec<HeadRow>,
    /// `None` when there are no rows
    pub lii_distribution: Option<ComprehensiveStats>,
    pub pivot: Vec<SidePivot>,
    pub obj_conversion_by_focus: Vec<ObjConversionByFocus>,
    pub winrate_by_focus: Vec<WinrateByFocus>,
    pub lii_binned: Vec<LiiBin>,
}

impl EdaReport {
    #[must_use]
    pub fn new(rows: &[TradeRow]) -> Self {
        let report = Self {
            head: head(rows),
            lii_distribution: ComprehensiveStats::with_default_percentiles(
                rows.iter().map(|r| r.lii_diff),
                LII_HISTOGRAM_BINS,
            ),
            pivot: pivot_by_side(rows),
            obj_conversion_by_focus: obj_conversion_by_focus(rows),
            winrate_by_focus: winrate_by_focus(rows),
            lii_binned: lii_binned(rows),
        };
        tracing::debug!(
            pivot = report.pivot.len(),
            lii_bins = report.lii_binned.len(),
            "built exploratory tables"
        );
        report
    }
}

fn group_values<K, F, V>(rows: &[TradeRow], key: F, value: V) -> BTreeMap<K, Vec<f64>>
where
    K: Ord,
    F: Fn(&TradeRow) -> Option<K>,
    V: Fn(&TradeRow) -> f64,
{
    let mut groups = BTreeMap::<K, Vec<f64>>::new();
    for row in rows {
        if let Some(k) = key(row) {
            groups.entry(k).or_default().push(value(row));
        }
    }
    groups
}

#[must_use]
pub fn head(rows: &[TradeRow]) -> Vec<HeadRow> {
    rows.iter()
        .take(HEAD_ROWS)
        .map(|row| HeadRow {
            gameid: row.gameid.clone(),
            teamid: row.teamid.clone(),
            gank_focus: row.gank_focus,
            result: row.result,
            obj_conversion: row.obj_conversion,
            lii_diff: row.lii_diff,
        })
        .collect()
}

/// Mean win rate by `(side, gank_focus)`; rows without a side are left out.
#[must_use]
pub fn pivot_by_side(rows: &[TradeRow]) -> Vec<SidePivot> {
    group_values(
        rows,
        |r| r.side.clone().map(|side| (side, r.gank_focus)),
        |r| r.result,
    )
    .into_iter()
    .map(|((side, gank_focus), wins)| SidePivot {
        side,
        gank_focus,
        result: descriptive::mean(&wins),
    })
    .collect()
}

/// Mean objective conversion by `(gank_focus, result)`.
#[must_use]
pub fn obj_conversion_by_focus(rows: &[TradeRow]) -> Vec<ObjConversionByFocus> {
    group_values(
        rows,
        |r| Some((r.gank_focus, r.is_win())),
        |r| r.obj_conversion,
    )
    .into_iter()
    .map(|((gank_focus, win), obj)| ObjConversionByFocus {
        gank_focus,
        result: if win { 1.0 } else { 0.0 },
        obj_conversion: descriptive::mean(&obj),
    })
    .collect()
}

/// Win rate per focus with a normal-approximation 95% interval.
#[must_use]
pub fn winrate_by_focus(rows: &[TradeRow]) -> Vec<WinrateByFocus> {
    group_values(rows, |r| Some(r.gank_focus), |r| r.result)
        .into_iter()
        .filter_map(|(gank_focus, wins)| {
            let stats = DescriptiveStats::new(wins)?;
            Some(WinrateByFocus {
                gank_focus,
                winrate: stats.mean,
                count: stats.count,
                sem: stats.std_error,
                ci_lower: stats.mean - Z_95 * stats.std_error,
                ci_upper: stats.mean + Z_95 * stats.std_error,
            })
        })
        .collect()
}

/// `lii_diff` cut into quantile bins, summarized per `(gank_focus, bin)`.
#[must_use]
pub fn lii_binned(rows: &[TradeRow]) -> Vec<LiiBin> {
    let lii = rows.iter().map(|r| r.lii_diff).collect::<Vec<_>>();
    let bins = percentiles::quantile_bins(&lii, LII_QUANTILE_BINS);

    let mut groups = BTreeMap::<(GankFocus, usize), (Vec<f64>, Vec<f64>)>::new();
    for (row, bin) in rows.iter().zip(bins) {
        let (wins, diffs) = groups.entry((row.gank_focus, bin)).or_default();
        wins.push(row.result);
        diffs.push(row.lii_diff);
    }
    groups
        .into_iter()
        .map(|((gank_focus, lii_bin), (wins, diffs))| LiiBin {
            gank_focus,
            lii_bin,
            win_rate: descriptive::mean(&wins),
            lii_diff: descriptive::mean(&diffs),
            count: wins.len(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(gameid: &str, focus: GankFocus, side: &str, result: f64, lii_diff: f64) -> TradeRow {
        TradeRow {
            gameid: gameid.to_owned(),
            teamid: format!("{gameid}-{side}"),
            side: Some(side.to_owned()),
            gank_focus: focus,
            result,
            jng_ka10: 1.0,
            bot_ka10: 0.0,
            top_ka10: 0.0,
            dragons: result,
            heralds: 0.0,
            obj_conversion: result,
            top_xpdiff10: 0.0,
            bot_xpdiff10: 0.0,
            top_csdiff10: 0.0,
            bot_csdiff10: 0.0,
            lii_top: 0.0,
            lii_bot: lii_diff,
            lii_diff,
        }
    }

    fn sample() -> Vec<TradeRow> {
        (0..10)
            .flat_map(|i| {
                let id = format!("g{i}");
                let bot_wins = i % 2 == 0;
                let lii = f64::from(i) * 10.0;
                [
                    row(&id, GankFocus::Bot, "Blue", f64::from(u8::from(bot_wins)), lii),
                    row(&id, GankFocus::Top, "Red", f64::from(u8::from(!bot_wins)), -lii),
                ]
            })
            .collect()
    }

    #[test]
    fn test_head_limited() {
        assert_eq!(head(&sample()).len(), HEAD_ROWS);
        assert_eq!(head(&sample()[..2]).len(), 2);
    }

    #[test]
    fn test_winrate_by_focus() {
        let table = winrate_by_focus(&sample());
        assert_eq!(table.len(), 2);
        let bot = &table[0];
        assert_eq!(bot.gank_focus, GankFocus::Bot);
        assert_eq!(bot.count, 10);
        assert!((bot.winrate - 0.5).abs() < 1e-12);
        assert!(bot.ci_lower < bot.winrate && bot.winrate < bot.ci_upper);
        assert!((bot.ci_upper - bot.winrate - Z_95 * bot.sem).abs() < 1e-12);
    }

    #[test]
    fn test_pivot_and_objectives() {
        let rows = sample();
        let pivot = pivot_by_side(&rows);
        assert_eq!(pivot.len(), 2);
        assert_eq!(pivot[0].side, "Blue");

        let obj = obj_conversion_by_focus(&rows);
        assert_eq!(obj.len(), 4);
        for entry in obj {
            assert_eq!(entry.obj_conversion, entry.result);
        }
    }

    #[test]
    fn test_lii_binned_counts() {
        let rows = sample();
        let binned = lii_binned(&rows);
        assert_eq!(binned.iter().map(|b| b.count).sum::<usize>(), rows.len());
        assert!(binned.iter().all(|b| b.lii_bin < LII_QUANTILE_BINS));
    }

    #[test]
    fn test_report_on_empty_rows() {
        let report = EdaReport::new(&[]);
        assert!(report.head.is_empty());
        assert!(report.lii_distribution.is_none());
        assert!(report.winrate_by_focus.is_empty());
        assert!(report.lii_binned.is_empty());
    }

    #[test]
    fn test_report_distribution() {
        let report = EdaReport::new(&sample());
        let dist = report.lii_distribution.unwrap();
        assert_eq!(dist.stats.count, 20);
        assert_eq!(dist.histogram.bins.len(), LII_HISTOGRAM_BINS);
    }
}
