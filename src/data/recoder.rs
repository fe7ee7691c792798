//! Traffic Table Recoder
//! Missing-value substitution, category consolidation and derived columns.

use polars::prelude::*;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::data::columns as c;
use crate::data::PEDESTRIAN_LABEL;

/// INJ_SEV code for a fatal injury.
const FATAL_INJURY_CODE: i64 = 4;

/// Speed labels that carry no usable number.
const NON_NUMERIC_SPEEDS: [&str; 4] = [
    PEDESTRIAN_LABEL,
    "Unknown",
    "Not Reported",
    "Stopped Motor Vehicle In Transport",
];

const EMBEDDED_TABLES: &str = include_str!("recode_tables.json");

#[derive(Error, Debug)]
pub enum RecodeError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("invalid recode table: {0}")]
    Table(#[from] serde_json::Error),
}

/// One label-consolidation rule: every label in `from` collapses to `to`.
#[derive(Debug, Deserialize)]
struct Consolidation {
    column: String,
    from: Vec<String>,
    to: String,
}

/// Recode configuration, loaded from the embedded JSON tables.
///
/// The table contents mirror the dataset's codebook and are data, not logic;
/// keeping them in JSON keeps the codebook diffable on its own.
#[derive(Debug, Deserialize)]
pub struct Recoder {
    pedestrian_columns: Vec<String>,
    consolidations: Vec<Consolidation>,
}

impl Recoder {
    pub fn from_embedded_tables() -> Result<Self, RecodeError> {
        Ok(serde_json::from_str(EMBEDDED_TABLES)?)
    }

    /// Apply all recode rules to the merged table and append the derived
    /// columns (numeric speed, speed bucket, fatal flag).
    ///
    /// Pure and deterministic: the same input table always produces the same
    /// output, and nothing downstream ever recomputes these columns.
    pub fn apply(&self, mut df: DataFrame) -> Result<DataFrame, RecodeError> {
        // Null substitution runs first so the consolidation rules only ever
        // see real labels. The "Pedestrian" label is a naming convention for
        // rows that have no vehicle record, not a verified pedestrian check.
        for name in &self.pedestrian_columns {
            map_text_column(&mut df, name, |value| {
                Some(value.unwrap_or(PEDESTRIAN_LABEL).to_string())
            })?;
        }

        for rule in &self.consolidations {
            map_text_column(&mut df, &rule.column, |value| {
                value.map(|label| {
                    if rule.from.iter().any(|from| from == label) {
                        rule.to.clone()
                    } else {
                        label.to_string()
                    }
                })
            })?;
        }

        self.derive_speed(&mut df)?;
        self.derive_fatal_flag(&mut df)?;

        info!(rows = df.height(), "traffic table recoded");
        Ok(df)
    }

    /// Parse TRAV_SPNAME into a numeric speed and a 10-wide bucket label.
    /// Labels that carry no number leave both derived columns null.
    fn derive_speed(&self, df: &mut DataFrame) -> Result<(), RecodeError> {
        let column = df.column(c::TRAVEL_SPEED_NAME)?.cast(&DataType::String)?;
        let labels = column.str()?;

        let mut speeds: Vec<Option<f64>> = Vec::with_capacity(labels.len());
        let mut buckets: Vec<Option<String>> = Vec::with_capacity(labels.len());
        for label in labels {
            let speed = label.and_then(parse_speed);
            speeds.push(speed);
            buckets.push(speed.and_then(speed_bucket));
        }

        df.with_column(Column::new(c::TRAVEL_SPEED.into(), speeds))?;
        df.with_column(Column::new(c::SPEED_RANGE.into(), buckets))?;
        Ok(())
    }

    /// FATAL = 1 iff the injury-severity code is the fatal code; rows with a
    /// null code keep a null flag and are excluded from every aggregation.
    fn derive_fatal_flag(&self, df: &mut DataFrame) -> Result<(), RecodeError> {
        let codes = df.column(c::INJURY_SEVERITY)?.cast(&DataType::Int64)?;

        let flags: Vec<Option<i32>> = codes
            .i64()?
            .into_iter()
            .map(|code| code.map(|code| i32::from(code == FATAL_INJURY_CODE)))
            .collect();

        df.with_column(Column::new(c::FATAL.into(), flags))?;
        Ok(())
    }
}

/// Rebuild a text column by mapping every value through `f`.
fn map_text_column<F>(df: &mut DataFrame, name: &str, f: F) -> Result<(), RecodeError>
where
    F: Fn(Option<&str>) -> Option<String>,
{
    // Cast keeps this working even when an all-null source column inferred
    // as the null dtype.
    let column = df.column(name)?.cast(&DataType::String)?;
    let mapped: Vec<Option<String>> = column.str()?.into_iter().map(f).collect();
    df.with_column(Column::new(name.into(), mapped))?;
    Ok(())
}

fn parse_speed(label: &str) -> Option<f64> {
    if NON_NUMERIC_SPEEDS.contains(&label) {
        return None;
    }
    let text = label.trim();
    let text = text.strip_suffix("MPH").unwrap_or(text).trim();
    let value = text.parse::<f64>().ok()?;
    (value >= 0.0).then_some(value)
}

/// Half-open bins of width 10 from 0, with 100 folded into the top bin.
fn speed_bucket(speed: f64) -> Option<String> {
    if !(0.0..=100.0).contains(&speed) {
        return None;
    }
    let low = ((speed / 10.0).floor() as u32 * 10).min(90);
    Some(format!("{low}-{}", low + 10))
}
