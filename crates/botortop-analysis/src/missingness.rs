//! Assessment of missingness in the raw telemetry.
//!
//! Picks a column with missing values and asks whether its missingness depends
//! on other columns. Each test shuffles the dependent column and re-splits it
//! by the fixed "target is missing" mask; the statistic is the absolute
//! difference of group means, so only the upper tail counts as extreme.
//!
//! A test whose usable rows are all missing the target, or none of them are,
//! is reported as [`INCONCLUSIVE`] instead of failing the whole report.

use rand::Rng;
use serde::Serialize;

use botortop_stats::{
    histogram::Histogram,
    permutation::{AbsDiffMeans, Alternative, PermutationTest, PermutationTestError, TestResult},
};

use crate::dataset::{LoadError, RawTable};

pub const DEFAULT_PERMUTATIONS: usize = 1_000;
pub const PREFERRED_TARGET: &str = "ban1";
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;
pub const NULL_HISTOGRAM_BINS: usize = 50;
/// Interpretation of a test whose rows all fall on one side of the mask.
pub const INCONCLUSIVE: &str = "Inconclusive";

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum MissingnessError {
    #[display("no column has missing values")]
    NothingMissing,
    #[display("failed to read column")]
    #[from]
    Column(LoadError),
    #[display("dependency test on '{column}' failed")]
    Test {
        column: String,
        #[error(source)]
        source: PermutationTestError,
    },
}

/// How a dependent column is turned into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Parsed as a number; missing cells are excluded
    Numeric,
    /// 1 when the cell equals the label, else 0 (missing cells count as 0)
    Indicator(&'static str),
}

/// A column whose relationship to the target's missingness is tested.
#[derive(Debug, Clone, Copy)]
pub struct Dependent {
    pub column: &'static str,
    pub encoding: Encoding,
}

/// Default dependents: game length, and side encoded as Red = 1.
pub const DEFAULT_DEPENDENTS: [Dependent; 2] = [
    Dependent {
        column: "gamelength",
        encoding: Encoding::Numeric,
    },
    Dependent {
        column: "side",
        encoding: Encoding::Indicator("Red"),
    },
];

#[derive(Debug, Clone, Serialize)]
pub struct ColumnMissing {
    pub column: String,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyTest {
    pub dependent_col: String,
    pub observed_stat: f64,
    pub p_value: f64,
    pub interpretation: String,
    /// Rows used after excluding missing dependent values
    pub n_rows: usize,
    pub non_finite_count: usize,
    pub null_histogram: Histogram,
}

/// Contents of `missingness_results.json`.
#[derive(Debug, Clone, Serialize)]
pub struct MissingnessReport {
    pub missing_col: String,
    pub missing_count: usize,
    pub columns_with_missing: Vec<ColumnMissing>,
    pub test1: DependencyTest,
    pub test2: DependencyTest,
}

impl DependencyTest {
    /// A test that could not run because no usable row (or every usable row)
    /// has the target missing.
    fn inconclusive(dependent: Dependent, n_rows: usize) -> Self {
        Self {
            dependent_col: dependent.column.to_owned(),
            observed_stat: f64::NAN,
            p_value: f64::NAN,
            interpretation: INCONCLUSIVE.to_owned(),
            n_rows,
            non_finite_count: 0,
            null_histogram: Histogram::new([], NULL_HISTOGRAM_BINS, None, None),
        }
    }
}

/// `Dependent (MAR)` when significant, else `Independent (MCAR)`.
#[must_use]
pub fn interpret(result: &TestResult) -> &'static str {
    if result.is_significant(SIGNIFICANCE_LEVEL) {
        "Dependent (MAR)"
    } else {
        "Independent (MCAR)"
    }
}

/// Picks the column to analyze: [`PREFERRED_TARGET`] if it has missing
/// values, else the column with the most missing values.
///
/// `counts` must be sorted by missing count, descending (as returned by
/// [`RawTable::missing_counts`]).
pub fn choose_target_column(counts: &[(String, usize)]) -> Result<&str, MissingnessError> {
    counts
        .iter()
        .find(|(column, count)| column == PREFERRED_TARGET && *count > 0)
        .or_else(|| counts.first().filter(|(_, count)| *count > 0))
        .map(|(column, _)| column.as_str())
        .ok_or(MissingnessError::NothingMissing)
}

fn encode(table: &RawTable, dependent: Dependent) -> Result<Vec<Option<f64>>, LoadError> {
    match dependent.encoding {
        Encoding::Numeric => table.numeric_column(dependent.column),
        Encoding::Indicator(label) => Ok(table
            .text_column(dependent.column)?
            .into_iter()
            .map(|cell| Some(if cell == Some(label) { 1.0 } else { 0.0 }))
            .collect()),
    }
}

/// Tests whether missingness of `target` depends on `dependent`.
pub fn dependency_test<R>(
    table: &RawTable,
    target: &str,
    dependent: Dependent,
    n_permutations: usize,
    rng: &mut R,
) -> Result<DependencyTest, MissingnessError>
where
    R: Rng + ?Sized,
{
    let is_missing = table.is_missing(target)?;
    let encoded = encode(table, dependent)?;

    let (values, mask): (Vec<f64>, Vec<bool>) = encoded
        .into_iter()
        .zip(is_missing)
        .filter_map(|(value, missing)| value.map(|v| (v, missing)))
        .unzip();
    tracing::debug!(
        target,
        dependent = dependent.column,
        rows = values.len(),
        missing = mask.iter().filter(|&&m| m).count(),
        "running missingness dependency test"
    );

    let n_rows = values.len();
    let result = match PermutationTest::new(AbsDiffMeans, n_permutations)
        .with_alternative(Alternative::Greater)
        .run_masked(&values, &mask, rng)
    {
        Ok(result) => result,
        Err(PermutationTestError::DegenerateMask) => {
            tracing::warn!(
                target,
                dependent = dependent.column,
                rows = n_rows,
                "target is missing in all or none of the usable rows"
            );
            return Ok(DependencyTest::inconclusive(dependent, n_rows));
        }
        Err(source) => {
            return Err(MissingnessError::Test {
                column: dependent.column.to_owned(),
                source,
            });
        }
    };
    tracing::info!(
        target,
        dependent = dependent.column,
        observed = result.observed(),
        p_value = result.p_value(),
        "missingness test finished"
    );

    Ok(DependencyTest {
        dependent_col: dependent.column.to_owned(),
        observed_stat: result.observed(),
        p_value: result.p_value(),
        interpretation: interpret(&result).to_owned(),
        n_rows,
        non_finite_count: result.non_finite_count(),
        null_histogram: Histogram::new(
            result.null_distribution().iter().copied(),
            NULL_HISTOGRAM_BINS,
            None,
            None,
        ),
    })
}

/// Chooses the target column and tests it against [`DEFAULT_DEPENDENTS`].
pub fn analyze<R>(
    table: &RawTable,
    n_permutations: usize,
    rng: &mut R,
) -> Result<MissingnessReport, MissingnessError>
where
    R: Rng + ?Sized,
{
    let counts = table.missing_counts();
    let target = choose_target_column(&counts)?;
    let missing_count = counts
        .iter()
        .find(|(column, _)| column == target)
        .map_or(0, |(_, count)| *count);
    tracing::info!(target, missing_count, "analyzing missingness");

    let [first, second] = DEFAULT_DEPENDENTS;
    let test1 = dependency_test(table, target, first, n_permutations, rng)?;
    let test2 = dependency_test(table, target, second, n_permutations, rng)?;

    Ok(MissingnessReport {
        missing_col: target.to_owned(),
        missing_count,
        columns_with_missing: counts
            .iter()
            .map(|(column, missing)| ColumnMissing {
                column: column.clone(),
                missing: *missing,
            })
            .collect(),
        test1,
        test2,
    })
}
