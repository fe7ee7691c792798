//! Source Table Merger
//! Builds the wide denormalized Traffic table with full outer joins.

use polars::prelude::*;
use thiserror::Error;
use tracing::info;

use crate::data::columns as c;
use crate::data::RawSources;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

fn full_outer() -> JoinArgs {
    JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns)
}

/// Merge the six sources into one wide table, one row per
/// (state, case, vehicle, person) combination.
///
/// Every join is a full outer join: a person without a vehicle record (a
/// pedestrian) must survive with nulls in the vehicle-keyed columns rather
/// than being dropped, and vehicle rows without people are kept symmetrically.
/// The join order only affects column layout, not which rows exist.
pub fn merge_sources(sources: RawSources) -> Result<DataFrame, MergeError> {
    let case_vehicle = [col(c::CASE), col(c::VEHICLE)];
    let case_vehicle_person = [col(c::CASE), col(c::VEHICLE), col(c::PERSON)];
    let case = [col(c::CASE)];

    let merged = sources
        .person
        .lazy()
        .join(
            sources.impairment.lazy(),
            case_vehicle.clone(),
            case_vehicle.clone(),
            full_outer(),
        )
        .join(
            sources.distraction.lazy(),
            case_vehicle.clone(),
            case_vehicle.clone(),
            full_outer(),
        )
        .join(
            sources.vehicle.lazy(),
            case_vehicle.clone(),
            case_vehicle,
            full_outer(),
        )
        .join(
            sources.drugs.lazy(),
            case_vehicle_person.clone(),
            case_vehicle_person,
            full_outer(),
        )
        .join(sources.accident.lazy(), case.clone(), case, full_outer())
        .collect()?;

    info!(
        rows = merged.height(),
        columns = merged.width(),
        "traffic table merged"
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources_fixture() -> RawSources {
        // Case 10001: one pedestrian (VEH_NO 0), one driver (VEH_NO 2), and
        // one vehicle record (VEH_NO 3) with no person row at all.
        let person = DataFrame::new(vec![
            Column::new("STATE".into(), vec![1i64, 1]),
            Column::new("STATENAME".into(), vec!["Alabama", "Alabama"]),
            Column::new("ST_CASE".into(), vec![10001i64, 10001]),
            Column::new("VEH_NO".into(), vec![0i64, 2]),
            Column::new("PER_NO".into(), vec![1i64, 1]),
            Column::new("AGE".into(), vec![34i64, 51]),
            Column::new("HOURNAME".into(), vec!["5:00pm-5:59pm", "5:00pm-5:59pm"]),
            Column::new("HARM_EVNAME".into(), vec!["Pedestrian", "Pedestrian"]),
            Column::new("MAN_COLLNAME".into(), vec!["Not Collision", "Not Collision"]),
            Column::new("INJ_SEV".into(), vec![4i64, 0]),
            Column::new(
                "INJ_SEVNAME".into(),
                vec!["Fatal Injury (K)", "No Apparent Injury (O)"],
            ),
        ])
        .unwrap();

        let impairment = DataFrame::new(vec![
            Column::new("ST_CASE".into(), vec![10001i64]),
            Column::new("VEH_NO".into(), vec![2i64]),
            Column::new("DRIMPAIRNAME".into(), vec!["None/Apparently Normal"]),
        ])
        .unwrap();

        let distraction = DataFrame::new(vec![
            Column::new("ST_CASE".into(), vec![10001i64]),
            Column::new("VEH_NO".into(), vec![2i64]),
            Column::new("DRDISTRACTNAME".into(), vec!["Not Distracted"]),
        ])
        .unwrap();

        let vehicle = DataFrame::new(vec![
            Column::new("ST_CASE".into(), vec![10001i64, 10001]),
            Column::new("VEH_NO".into(), vec![2i64, 3]),
            Column::new("MAKENAME".into(), vec!["Ford", "Chevrolet"]),
            Column::new("TRAV_SPNAME".into(), vec!["035 MPH", "Not Reported"]),
            Column::new("MONTHNAME".into(), vec!["July", "July"]),
        ])
        .unwrap();

        let drugs = DataFrame::new(vec![
            Column::new("ST_CASE".into(), vec![10001i64]),
            Column::new("VEH_NO".into(), vec![2i64]),
            Column::new("PER_NO".into(), vec![1i64]),
            Column::new("DRUGRESNAME".into(), vec!["Test Not Given"]),
        ])
        .unwrap();

        let accident = DataFrame::new(vec![
            Column::new("ST_CASE".into(), vec![10001i64]),
            Column::new("WEATHERNAME".into(), vec!["Clear"]),
        ])
        .unwrap();

        RawSources {
            person,
            impairment,
            distraction,
            vehicle,
            drugs,
            accident,
        }
    }

    #[test]
    fn unmatched_rows_survive_on_both_sides() {
        let merged = merge_sources(sources_fixture()).unwrap();

        // 2 person rows + 1 vehicle row with no person.
        assert_eq!(merged.height(), 3);

        let veh = merged.column("VEH_NO").unwrap().i64().unwrap();
        let make = merged.column("MAKENAME").unwrap().str().unwrap();
        let age = merged.column("AGE").unwrap().i64().unwrap();

        for i in 0..merged.height() {
            match veh.get(i) {
                // Pedestrian: no vehicle record, make must be null-filled.
                Some(0) => assert!(make.get(i).is_none()),
                // Matched driver.
                Some(2) => assert_eq!(make.get(i), Some("Ford")),
                // Vehicle with no person: person-side columns null-filled.
                Some(3) => {
                    assert_eq!(make.get(i), Some("Chevrolet"));
                    assert!(age.get(i).is_none());
                }
                other => panic!("unexpected VEH_NO {other:?}"),
            }
        }
    }

    #[test]
    fn case_keyed_weather_reaches_every_row() {
        let merged = merge_sources(sources_fixture()).unwrap();
        let weather = merged.column("WEATHERNAME").unwrap().str().unwrap();
        for i in 0..merged.height() {
            assert_eq!(weather.get(i), Some("Clear"));
        }
    }
}
