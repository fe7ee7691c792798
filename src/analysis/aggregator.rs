//! Fatality Aggregator
//! Groups the Traffic table by a chosen dimension and computes, per category,
//! how many cases there were and what share of them were fatal.

use polars::prelude::*;
use serde::Serialize;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::data::columns as c;
use crate::data::PEDESTRIAN_LABEL;

/// Categories with fewer cases than this are never shown; percentages from
/// small samples are too unstable to compare.
pub const MIN_SUPPORT: u32 = 100;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// The eight columns a user can break the fatality rate down by.
///
/// An enum rather than a raw column name keeps the accessor typed: an invalid
/// dimension cannot be constructed, so the aggregator never does a stringly
/// lookup that might miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Weather,
    Speed,
    Month,
    DrugInfluence,
    Impairment,
    Distraction,
    VehicleMake,
    AccidentType,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Weather,
        Dimension::Speed,
        Dimension::Month,
        Dimension::DrugInfluence,
        Dimension::Impairment,
        Dimension::Distraction,
        Dimension::VehicleMake,
        Dimension::AccidentType,
    ];

    /// Label shown in the dimension selector.
    pub fn label(self) -> &'static str {
        match self {
            Dimension::Weather => "Weather",
            Dimension::Speed => "Speed",
            Dimension::Month => "Month",
            Dimension::DrugInfluence => "Under the influence of drugs",
            Dimension::Impairment => "Driving impaired",
            Dimension::Distraction => "Driving distracted",
            Dimension::VehicleMake => "Vehicle Make",
            Dimension::AccidentType => "Accident Type",
        }
    }

    /// Traffic-table column this dimension groups by.
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Weather => c::WEATHER,
            Dimension::Speed => c::SPEED_RANGE,
            Dimension::Month => c::MONTH,
            Dimension::DrugInfluence => c::DRUG_RESULT,
            Dimension::Impairment => c::IMPAIRMENT,
            Dimension::Distraction => c::DISTRACTION,
            Dimension::VehicleMake => c::VEHICLE_MAKE,
            Dimension::AccidentType => c::HARM_EVENT,
        }
    }
}

/// How to choose which categories to display.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayMode {
    /// The `count` categories with the most cases.
    TopN { count: usize },
    /// Exactly the categories the user picked.
    Specific { selected: BTreeSet<String> },
}

/// One chart row: a category and its fatality share.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryAggregate {
    pub category: String,
    pub total_cases: u32,
    pub fatal_cases: u32,
    pub fatal_percentage: f64,
}

/// Group the Traffic table by `dimension` and keep the categories `mode`
/// asks for.
///
/// Rows with a null fatal flag, a null dimension value, or the substitute
/// "Pedestrian" label are excluded before grouping, and categories below
/// [`MIN_SUPPORT`] cases are dropped. TopN ranks by case count descending
/// with first-seen order breaking ties; Specific with an empty selection
/// yields an empty result rather than an error.
pub fn aggregate(
    traffic: &DataFrame,
    dimension: Dimension,
    mode: &DisplayMode,
) -> Result<Vec<CategoryAggregate>, AggregateError> {
    let column = dimension.column();
    let grouped = supported_groups(traffic, column);

    let kept = match mode {
        DisplayMode::TopN { count } => grouped
            .sort(
                ["total_cases"],
                SortMultipleOptions::default()
                    .with_order_descending(true)
                    .with_maintain_order(true),
            )
            .limit(*count as IdxSize)
            .collect()?,
        DisplayMode::Specific { selected } => {
            if selected.is_empty() {
                return Ok(Vec::new());
            }
            let wanted = selected.iter().fold(lit(false), |acc, category| {
                acc.or(col(column).eq(lit(category.clone())))
            });
            grouped.filter(wanted).collect()?
        }
    };

    let categories = kept.column(column)?.str()?;
    let totals = kept.column("total_cases")?.cast(&DataType::UInt32)?;
    let totals = totals.u32()?;
    let fatals = kept.column("fatal_cases")?.cast(&DataType::UInt32)?;
    let fatals = fatals.u32()?;

    let mut rows = Vec::with_capacity(kept.height());
    for i in 0..kept.height() {
        let (Some(category), Some(total), Some(fatal)) =
            (categories.get(i), totals.get(i), fatals.get(i))
        else {
            continue;
        };
        rows.push(CategoryAggregate {
            category: category.to_string(),
            total_cases: total,
            fatal_cases: fatal,
            fatal_percentage: 100.0 * f64::from(fatal) / f64::from(total),
        });
    }
    Ok(rows)
}

/// Categories of `dimension` passing the support floor, sorted for display.
///
/// This list bounds the TopN slider and populates the Specific multi-select,
/// so both controls can only ever ask for categories that exist.
pub fn valid_categories(
    traffic: &DataFrame,
    dimension: Dimension,
) -> Result<Vec<String>, AggregateError> {
    let column = dimension.column();
    let kept = supported_groups(traffic, column).collect()?;

    let mut categories: Vec<String> = kept
        .column(column)?
        .str()?
        .into_iter()
        .flatten()
        .map(str::to_string)
        .collect();
    categories.sort();
    Ok(categories)
}

/// Shared head of both queries: exclusions, grouping, support floor.
fn supported_groups(traffic: &DataFrame, column: &str) -> LazyFrame {
    traffic
        .clone()
        .lazy()
        .filter(
            col(c::FATAL)
                .is_not_null()
                .and(col(column).is_not_null())
                .and(col(column).neq(lit(PEDESTRIAN_LABEL))),
        )
        .group_by_stable([col(column)])
        .agg([
            len().alias("total_cases"),
            col(c::FATAL).sum().alias("fatal_cases"),
        ])
        .filter(col("total_cases").gt_eq(lit(MIN_SUPPORT)))
}
