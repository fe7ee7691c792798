//! Source File Loader
//! Reads the six FARS-style CSV sources into memory using Polars.

use polars::prelude::*;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use crate::data::columns as c;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("missing source file: {0}")]
    MissingFile(PathBuf),
    #[error("{file}: missing required column {column}")]
    MissingColumn {
        file: &'static str,
        column: &'static str,
    },
    #[error("{file}: column {column} is {found}, expected {expected}")]
    ColumnType {
        file: &'static str,
        column: &'static str,
        found: String,
        expected: &'static str,
    },
    #[error("failed to read CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("source table count mismatch")]
    SourceCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Integer,
    Text,
}

/// Schema contract for one source file: required columns and their kinds.
struct SourceSpec {
    file: &'static str,
    columns: &'static [(&'static str, ColumnKind)],
}

use ColumnKind::{Integer, Text};

const SOURCES: [SourceSpec; 6] = [
    SourceSpec {
        file: "person.csv",
        columns: &[
            (c::STATE, Integer),
            (c::STATE_NAME, Text),
            (c::CASE, Integer),
            (c::VEHICLE, Integer),
            (c::PERSON, Integer),
            (c::AGE, Integer),
            (c::HOUR, Text),
            (c::HARM_EVENT, Text),
            (c::COLLISION_MANNER, Text),
            (c::INJURY_SEVERITY, Integer),
            (c::INJURY_SEVERITY_NAME, Text),
        ],
    },
    SourceSpec {
        file: "drimpair.csv",
        columns: &[
            (c::CASE, Integer),
            (c::VEHICLE, Integer),
            (c::IMPAIRMENT, Text),
        ],
    },
    SourceSpec {
        file: "distract.csv",
        columns: &[
            (c::CASE, Integer),
            (c::VEHICLE, Integer),
            (c::DISTRACTION, Text),
        ],
    },
    SourceSpec {
        file: "vehicle.csv",
        columns: &[
            (c::CASE, Integer),
            (c::VEHICLE, Integer),
            (c::VEHICLE_MAKE, Text),
            (c::TRAVEL_SPEED_NAME, Text),
            (c::MONTH, Text),
        ],
    },
    SourceSpec {
        file: "drugs.csv",
        columns: &[
            (c::CASE, Integer),
            (c::VEHICLE, Integer),
            (c::PERSON, Integer),
            (c::DRUG_RESULT, Text),
        ],
    },
    SourceSpec {
        file: "accident.csv",
        columns: &[(c::CASE, Integer), (c::WEATHER, Text)],
    },
];

/// The six source tables, loaded and schema-checked but untransformed.
pub struct RawSources {
    pub person: DataFrame,
    pub impairment: DataFrame,
    pub distraction: DataFrame,
    pub vehicle: DataFrame,
    pub drugs: DataFrame,
    pub accident: DataFrame,
}

impl RawSources {
    /// Load all six sources from `dir`.
    ///
    /// Files load in parallel; collecting the results is the barrier that
    /// guarantees every source is in memory before the merge step runs.
    /// Any missing file, missing column or type mismatch fails the whole
    /// load.
    pub fn load(dir: &Path) -> Result<Self, LoadError> {
        let frames: Vec<DataFrame> = SOURCES
            .par_iter()
            .map(|spec| load_source(dir, spec))
            .collect::<Result<_, _>>()?;

        let [person, impairment, distraction, vehicle, drugs, accident]: [DataFrame; 6] =
            frames.try_into().map_err(|_| LoadError::SourceCount)?;

        Ok(Self {
            person,
            impairment,
            distraction,
            vehicle,
            drugs,
            accident,
        })
    }
}

/// Load one CSV and validate it against its schema contract.
fn load_source(dir: &Path, spec: &SourceSpec) -> Result<DataFrame, LoadError> {
    let path = dir.join(spec.file);
    if !path.is_file() {
        return Err(LoadError::MissingFile(path));
    }

    let path_str = path.display().to_string();
    let df = LazyCsvReader::new(path_str.as_str())
        .with_infer_schema_length(Some(10_000))
        .finish()?
        .collect()?;

    for &(name, kind) in spec.columns {
        let Ok(column) = df.column(name) else {
            return Err(LoadError::MissingColumn {
                file: spec.file,
                column: name,
            });
        };
        let ok = match kind {
            ColumnKind::Integer => column.dtype().is_integer(),
            ColumnKind::Text => matches!(column.dtype(), DataType::String | DataType::Null),
        };
        if !ok {
            return Err(LoadError::ColumnType {
                file: spec.file,
                column: name,
                found: column.dtype().to_string(),
                expected: match kind {
                    ColumnKind::Integer => "an integer type",
                    ColumnKind::Text => "a string type",
                },
            });
        }
    }

    // Project down to the contract columns so stray extras in a vendor dump
    // cannot collide during the joins.
    let names: Vec<&str> = spec.columns.iter().map(|&(name, _)| name).collect();
    let df = df.select(names)?;

    info!(file = spec.file, rows = df.height(), "source loaded");
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_sources(dir: &Path) {
        let files: [(&str, &str); 6] = [
            (
                "person.csv",
                "STATE,STATENAME,ST_CASE,VEH_NO,PER_NO,AGE,HOURNAME,HARM_EVNAME,MAN_COLLNAME,INJ_SEV,INJ_SEVNAME\n\
                 1,Alabama,10001,1,1,34,5:00pm-5:59pm,Pedestrian,Not Collision,4,Fatal Injury (K)\n\
                 1,Alabama,10001,2,1,51,5:00pm-5:59pm,Motor Vehicle In-Transport,Front-to-Front,0,No Apparent Injury (O)\n",
            ),
            (
                "drimpair.csv",
                "ST_CASE,VEH_NO,DRIMPAIRNAME\n10001,2,None/Apparently Normal\n",
            ),
            (
                "distract.csv",
                "ST_CASE,VEH_NO,DRDISTRACTNAME\n10001,2,Not Distracted\n",
            ),
            (
                "vehicle.csv",
                "ST_CASE,VEH_NO,MAKENAME,TRAV_SPNAME,MONTHNAME\n10001,2,Ford,035 MPH,July\n",
            ),
            (
                "drugs.csv",
                "ST_CASE,VEH_NO,PER_NO,DRUGRESNAME\n10001,2,1,Test Not Given\n",
            ),
            (
                "accident.csv",
                "ST_CASE,WEATHERNAME\n10001,Clear\n",
            ),
        ];
        for (name, body) in files {
            fs::write(dir.join(name), body).unwrap();
        }
    }

    #[test]
    fn loads_all_six_sources() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());

        let sources = RawSources::load(dir.path()).unwrap();
        assert_eq!(sources.person.height(), 2);
        assert_eq!(sources.accident.height(), 1);
        // Projection keeps exactly the contract columns, in contract order.
        let names: Vec<String> = sources
            .vehicle
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(names, ["ST_CASE", "VEH_NO", "MAKENAME", "TRAV_SPNAME", "MONTHNAME"]);
    }

    #[test]
    fn missing_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        fs::remove_file(dir.path().join("drugs.csv")).unwrap();

        let err = RawSources::load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingFile(_)));
    }

    #[test]
    fn missing_column_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        fs::write(dir.path().join("accident.csv"), "ST_CASE,RAIN\n10001,yes\n").unwrap();

        let err = RawSources::load(dir.path()).unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                file: "accident.csv",
                column: "WEATHERNAME",
            }
        ));
    }

    #[test]
    fn wrong_key_type_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_sources(dir.path());
        fs::write(
            dir.path().join("accident.csv"),
            "ST_CASE,WEATHERNAME\nnot-a-number,Clear\n",
        )
        .unwrap();

        let err = RawSources::load(dir.path()).unwrap_err();
        assert!(matches!(err, LoadError::ColumnType { .. }));
    }
}
