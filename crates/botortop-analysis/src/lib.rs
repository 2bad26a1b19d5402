//! Jungle gank priority analysis over professional match telemetry.
//!
//! The pipeline runs in stages, each feeding the next:
//!
//! 1. [`dataset`]: load the per-player CSV
//! 2. [`trade`]: summarize each team's early game and keep cross-map trade games
//! 3. [`features`]: attach objective and lane features to each trade-game team
//! 4. [`eda`]: exploratory tables over the trade rows
//! 5. [`hypothesis`]: bot-focus vs top-focus permutation tests
//!
//! [`missingness`] works on the raw table instead and tests whether a column's
//! missing values depend on other columns.
//!
//! Win prediction on the trade rows lives in the `botortop-model` crate.
//!
//! # Examples
//!
//! ```
//! use botortop_analysis::{dataset::RawTable, features};
//!
//! let csv = "\
//! gameid,teamid,side,position,result,killsat10,assistsat10
//! g1,t1,Blue,jng,1,1,0
//! g1,t1,Blue,bot,1,2,0
//! g1,t2,Red,jng,0,0,1
//! g1,t2,Red,top,0,1,0
//! ";
//! let table = RawTable::from_reader(csv.as_bytes())?;
//! let rows = features::build_trade_rows(&table.player_rows()?);
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].gank_focus.as_str(), "bot");
//! # Ok::<(), botortop_analysis::dataset::LoadError>(())
//! ```

pub mod dataset;
pub mod eda;
pub mod features;
pub mod hypothesis;
pub mod missingness;
pub mod trade;

#[cfg(test)]
mod fixtures;
