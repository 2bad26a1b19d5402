//! Match telemetry loading
//!
//! The source data is a flat CSV with one row per player per game plus one
//! summary row per team per game. This module reads it twice over the same
//! records:
//!
//! - [`RawTable`]: headers plus string records, for generic per-column queries
//!   such as "which cells of `ban1` are missing"
//! - [`PlayerRow`]: the typed subset of columns the gank analysis needs
//!
//! # Missing Values
//!
//! A cell is missing when it is empty or holds one of the usual missing-value
//! markers (`NA`, `NaN`, `null`, ...). Numeric cells that fail to parse are
//! treated as missing as well.
//!
//! # Examples
//!
//! ```
//! use botortop_analysis::dataset::{Position, RawTable};
//!
//! let csv = "gameid,teamid,position,result,killsat10\n\
//!            g1,t1,jng,1,2\n\
//!            g1,t1,bot,1,\n";
//! let table = RawTable::from_reader(csv.as_bytes())?;
//! let rows = table.player_rows()?;
//!
//! assert_eq!(rows.len(), 2);
//! assert_eq!(rows[0].position, Some(Position::Jungle));
//! assert_eq!(rows[1].position, Some(Position::Bottom));
//! assert_eq!(rows[1].killsat10, None);
//! # Ok::<(), botortop_analysis::dataset::LoadError>(())
//! ```

use std::{fs::File, io, path::Path};

use csv::StringRecord;
use serde::{Deserialize, Deserializer};

/// Markers treated as a missing cell, compared case-insensitively.
const MISSING_MARKERS: [&str; 7] = ["", "na", "nan", "n/a", "#n/a", "null", "none"];

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum LoadError {
    #[display("failed to open data file")]
    #[from]
    Io(io::Error),
    #[display("failed to read CSV data")]
    #[from]
    Csv(csv::Error),
    #[display("column '{column}' not found")]
    MissingColumn { column: String },
    #[display("CSV has no data rows")]
    Empty,
}

/// Returns whether a raw CSV cell counts as missing.
///
/// ```
/// use botortop_analysis::dataset::is_missing_cell;
///
/// assert!(is_missing_cell(""));
/// assert!(is_missing_cell(" NaN "));
/// assert!(!is_missing_cell("0"));
/// ```
#[must_use]
pub fn is_missing_cell(cell: &str) -> bool {
    let cell = cell.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| cell.eq_ignore_ascii_case(marker))
}

/// The CSV as headers and string records.
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
}

impl RawTable {
    /// Reads a CSV file with a header row.
    pub fn from_path<P>(path: P) -> Result<Self, LoadError>
    where
        P: AsRef<Path>,
    {
        let file = File::open(path)?;
        Self::from_reader(io::BufReader::new(file))
    }

    /// Reads CSV data with a header row from any reader.
    pub fn from_reader<R>(reader: R) -> Result<Self, LoadError>
    where
        R: io::Read,
    {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        if records.is_empty() {
            return Err(LoadError::Empty);
        }
        tracing::debug!(
            columns = headers.len(),
            rows = records.len(),
            "loaded CSV table"
        );
        Ok(Self { headers, records })
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names in file order.
    pub fn headers(&self) -> impl Iterator<Item = &str> + '_ {
        self.headers.iter()
    }

    #[must_use]
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn require_column(&self, column: &str) -> Result<usize, LoadError> {
        self.column_index(column)
            .ok_or_else(|| LoadError::MissingColumn {
                column: column.to_owned(),
            })
    }

    fn cells(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        // Short records (flexible CSV) read as missing
        self.records
            .iter()
            .map(move |record| record.get(index).unwrap_or(""))
    }

    /// Per-row missingness indicator for `column`.
    pub fn is_missing(&self, column: &str) -> Result<Vec<bool>, LoadError> {
        let index = self.require_column(column)?;
        Ok(self.cells(index).map(is_missing_cell).collect())
    }

    /// Per-row numeric values of `column`; missing, unparsable or non-finite
    /// cells are `None`.
    pub fn numeric_column(&self, column: &str) -> Result<Vec<Option<f64>>, LoadError> {
        let index = self.require_column(column)?;
        Ok(self
            .cells(index)
            .map(|cell| {
                if is_missing_cell(cell) {
                    None
                } else {
                    cell.trim().parse::<f64>().ok().filter(|v| v.is_finite())
                }
            })
            .collect())
    }

    /// Per-row text values of `column`; missing cells are `None`.
    pub fn text_column(&self, column: &str) -> Result<Vec<Option<&str>>, LoadError> {
        let index = self.require_column(column)?;
        Ok(self
            .cells(index)
            .map(|cell| (!is_missing_cell(cell)).then(|| cell.trim()))
            .collect())
    }

    /// Missing-cell count of every column that has at least one, most missing first.
    ///
    /// Ties keep file order.
    #[must_use]
    pub fn missing_counts(&self) -> Vec<(String, usize)> {
        let mut counts = (0..self.headers.len())
            .map(|index| {
                let count = self.cells(index).filter(|c| is_missing_cell(c)).count();
                (self.headers[index].to_owned(), count)
            })
            .filter(|(_, count)| *count > 0)
            .collect::<Vec<_>>();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Deserializes every record into a [`PlayerRow`].
    ///
    /// Rows without a position are dropped.
    pub fn player_rows(&self) -> Result<Vec<PlayerRow>, LoadError> {
        self.require_column("gameid")?;
        self.require_column("position")?;
        let mut rows = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let row: PlayerRow = record.deserialize(Some(&self.headers))?;
            if row.position.is_some() {
                rows.push(row);
            }
        }
        tracing::debug!(
            rows = rows.len(),
            dropped = self.records.len() - rows.len(),
            "parsed player rows"
        );
        Ok(rows)
    }
}

/// Normalized player role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Position {
    Top,
    Jungle,
    Mid,
    /// Bottom-lane carry (ADC)
    Bottom,
    Support,
    /// Any other label, such as the per-team summary row (`team`)
    Other(String),
}

impl Position {
    /// Maps a raw position label onto a [`Position`], case-insensitively.
    ///
    /// ```
    /// use botortop_analysis::dataset::Position;
    ///
    /// assert_eq!(Position::from_label("ADC"), Position::Bottom);
    /// assert_eq!(Position::from_label("jungle"), Position::Jungle);
    /// assert_eq!(Position::from_label("team"), Position::Other("team".to_owned()));
    /// ```
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let label = label.trim();
        match label.to_ascii_lowercase().as_str() {
            "top" => Self::Top,
            "jng" | "jungle" => Self::Jungle,
            "mid" => Self::Mid,
            "bot" | "adc" => Self::Bottom,
            "sup" | "support" => Self::Support,
            _ => Self::Other(label.to_owned()),
        }
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Deserializes an optional number, mapping unparsable and non-finite cells
/// (`NaN`, `inf`) to `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = csv::invalid_option(deserializer)?;
    Ok(value.filter(|v| v.is_finite()))
}

/// Deserializes an optional label, mapping missing-value markers to `None`.
fn lenient_label<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !is_missing_cell(v))
        .map(|v| v.trim().to_owned()))
}

/// Position label deserializer honoring missing-value markers.
fn lenient_position<'de, D>(deserializer: D) -> Result<Option<Position>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !is_missing_cell(v))
        .map(|v| Position::from_label(&v)))
}

/// One row of match telemetry (a player, or a team summary row).
///
/// Only the columns used by the gank analysis are kept. Every column except
/// `gameid` may be absent from the file.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRow {
    pub gameid: String,
    #[serde(default, deserialize_with = "lenient_label")]
    pub teamid: Option<String>,
    #[serde(default, deserialize_with = "lenient_label")]
    pub side: Option<String>,
    #[serde(default, deserialize_with = "lenient_position")]
    pub position: Option<Position>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub result: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub killsat10: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub assistsat10: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub dragons: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub heralds: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub xpdiffat10: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub csdiffat10: Option<f64>,
}

impl PlayerRow {
    /// Kills plus assists at 10 minutes, missing values counted as zero.
    #[must_use]
    pub fn kills_assists_at_10(&self) -> f64 {
        self.killsat10.unwrap_or(0.0) + self.assistsat10.unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;

    const SAMPLE: &str = "\
gameid,teamid,side,position,result,killsat10,assistsat10,dragons,heralds,xpdiffat10,csdiffat10,ban1,gamelength
g1,t1,Blue,top,1,1,0,,,120,5,Azir,1800
g1,t1,Blue,jng,1,0,2,,,,,Azir,1800
g1,t1,Blue,,1,,,,,,,Azir,1800
g1,t1,Blue,team,1,3,4,2,1,,,,1800
g1,t2,Red,Support,0,0,1,,,-30,n/a,Ahri,1800
";

    #[test]
    fn test_missing_counts_sorted() {
        let table = RawTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let counts = table.missing_counts();
        assert_eq!(counts[0], ("dragons".to_owned(), 4));
        assert!(counts.iter().any(|(c, n)| c == "ban1" && *n == 1));
        assert!(counts.iter().all(|(c, _)| c != "gameid"));
    }

    #[test]
    fn test_numeric_and_missing_columns() {
        let table = RawTable::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(
            table.numeric_column("csdiffat10").unwrap(),
            vec![Some(5.0), None, None, None, None]
        );
        assert_eq!(
            table.is_missing("ban1").unwrap(),
            vec![false, false, false, true, false]
        );
        assert_eq!(table.text_column("side").unwrap()[4], Some("Red"));
        assert!(matches!(
            table.is_missing("nope"),
            Err(LoadError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_player_rows_drop_missing_position() {
        let table = RawTable::from_reader(SAMPLE.as_bytes()).unwrap();
        let rows = table.player_rows().unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[2].position, Some(Position::Other("team".to_owned())));
        assert_eq!(rows[2].dragons, Some(2.0));
        assert_eq!(rows[3].position, Some(Position::Support));
        assert_eq!(rows[3].csdiffat10, None);
        assert_eq!(rows[1].kills_assists_at_10(), 2.0);
    }

    #[test]
    fn test_player_rows_without_optional_columns() {
        let table = RawTable::from_reader("gameid,position\ng1,mid\n".as_bytes()).unwrap();
        let rows = table.player_rows().unwrap();
        assert_eq!(rows[0].position, Some(Position::Mid));
        assert_eq!(rows[0].teamid, None);
        assert_eq!(rows[0].kills_assists_at_10(), 0.0);
    }

    #[test]
    fn test_non_finite_cells_read_as_missing() {
        let csv = "\
gameid,position,xpdiffat10,csdiffat10
g1,top,inf,NaN
g1,bot,-infinity,4
";
        let table = RawTable::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(
            table.numeric_column("xpdiffat10").unwrap(),
            vec![None, None]
        );
        let rows = table.player_rows().unwrap();
        assert_eq!(rows[0].xpdiffat10, None);
        assert_eq!(rows[0].csdiffat10, None);
        assert_eq!(rows[1].xpdiffat10, None);
        assert_eq!(rows[1].csdiffat10, Some(4.0));
    }

    #[test]
    fn test_empty_table_rejected() {
        assert!(matches!(
            RawTable::from_reader("gameid,position\n".as_bytes()),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let table = RawTable::from_path(file.path()).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.headers().count(), 13);

        assert!(matches!(
            RawTable::from_path(file.path().with_extension("missing")),
            Err(LoadError::Io(_))
        ));
    }
}
