use crate::flatten::error::FlattenError;
use crate::flatten::{check_co_registration, unique_names, Alignment, LocationIndex};
use crate::response::query_response::QueryResponse;
use crate::types::location::Location;
use crate::types::measure::{MeasureKind, MeasureSeries, TimeSeriesMeasure};
use crate::types::record::{FlatRecord, FlatTable, Reading, TableLayout};
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::{BTreeMap, HashSet};

type DatedCells = BTreeMap<NaiveDate, Vec<Option<Reading>>>;

/// Unnests time-series measures into one record per location and date.
///
/// For every location (in first-encounter order across `names`) and every
/// date present in that location's datapoints of any named measure (ascending),
/// one record is emitted with one field per measure; a measure without a
/// datapoint at that date leaves the field missing. A `(location, date)` pair
/// repeated within one measure keeps its last datapoint and logs a warning.
///
/// [`Alignment::CoRegistered`] checks that all measures share one grid before
/// unnesting, [`Alignment::ByLocation`] unnests without the check and
/// [`Alignment::Separate`] unnests each measure into its own table.
///
/// # Errors
///
/// [`FlattenError::UnknownMeasure`], [`FlattenError::KindMismatch`], and
/// [`FlattenError::MisalignedGrid`] under co-registration.
pub fn flatten_time_series_measures(
    response: &QueryResponse,
    names: &[&str],
    alignment: Alignment,
) -> Result<Vec<FlatTable>, FlattenError> {
    let measures = unique_names(names)
        .into_iter()
        .map(|name| resolve_time_series(response, name).map(|instances| (name, instances)))
        .collect::<Result<Vec<_>, _>>()?;

    let tables = match alignment {
        Alignment::Separate => measures
            .iter()
            .map(|measure| unnest(std::slice::from_ref(measure)))
            .collect(),
        Alignment::CoRegistered => {
            let grids: Vec<(&str, Vec<&Location>)> = measures
                .iter()
                .map(|(name, instances)| (*name, instances.iter().map(|m| &m.location).collect()))
                .collect();
            check_co_registration(&grids)?;
            vec![unnest(&measures)]
        }
        Alignment::ByLocation => vec![unnest(&measures)],
    };
    debug!(
        "Unnested {} time series measures into {} tables ({} records)",
        measures.len(),
        tables.len(),
        tables.iter().map(FlatTable::len).sum::<usize>()
    );
    Ok(tables)
}

fn resolve_time_series<'a>(
    response: &'a QueryResponse,
    name: &str,
) -> Result<&'a [TimeSeriesMeasure], FlattenError> {
    match response.measure(name) {
        None => Err(FlattenError::UnknownMeasure {
            measure: name.to_string(),
        }),
        Some(MeasureSeries::Empty) => Ok(&[]),
        Some(MeasureSeries::TimeSeries(instances)) => Ok(instances),
        Some(MeasureSeries::Scalar(_)) => Err(FlattenError::KindMismatch {
            measure: name.to_string(),
            expected: MeasureKind::TimeSeries,
            found: MeasureKind::Scalar,
        }),
    }
}

fn unnest(measures: &[(&str, &[TimeSeriesMeasure])]) -> FlatTable {
    let width = measures.len();
    let mut index = LocationIndex::default();
    let mut by_location: Vec<DatedCells> = Vec::new();
    let mut written = HashSet::new();

    for (field, (name, instances)) in measures.iter().enumerate() {
        for instance in instances.iter() {
            let slot = index.slot(&instance.location);
            if slot == by_location.len() {
                by_location.push(BTreeMap::new());
            }
            let dates = &mut by_location[slot];
            for datapoint in &instance.datapoints {
                if !written.insert((slot, datapoint.date, field)) {
                    warn!(
                        "Measure '{}' has more than one datapoint for '{}' on {}; keeping the last",
                        name,
                        instance.location.key(),
                        datapoint.date
                    );
                }
                let cells = dates
                    .entry(datapoint.date)
                    .or_insert_with(|| vec![None; width]);
                cells[field] = Some(datapoint.reading());
            }
        }
    }

    let records = index
        .into_locations()
        .into_iter()
        .zip(by_location)
        .flat_map(|(location, dates)| {
            dates.into_iter().map(move |(date, values)| FlatRecord {
                location: location.clone(),
                date: Some(date),
                values,
            })
        })
        .collect();
    let fields = measures.iter().map(|(name, _)| name.to_string()).collect();
    FlatTable::new(TableLayout::TimeSeries, fields, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::error::ResponseError;
    use serde_json::{json, Value};

    fn series(unit: &str, x: f64, points: &[(&str, f64)]) -> Value {
        let datapoints: Vec<Value> = points
            .iter()
            .map(|(date, value)| json!({ "date": date, "value": value, "unit": unit }))
            .collect();
        json!({ "unit": unit, "datapoints": datapoints, "location": { "centroid": [x, 51.8] } })
    }

    fn temperature_response(mean_cells: usize, max_cells: usize) -> Result<QueryResponse, ResponseError> {
        let dates = [("2020-01-01", 4.0), ("2020-01-02", 5.0), ("2020-01-03", 6.0)];
        let mean: Vec<Value> = (0..mean_cells).map(|i| series("Cel", i as f64, &dates)).collect();
        let max: Vec<Value> = (0..max_cells)
            .map(|i| series("Cel", i as f64, &[("2020-01-01", 9.0), ("2020-01-02", 10.0), ("2020-01-03", 11.0)]))
            .collect();
        QueryResponse::from_json(&json!({
            "data": { "geospatialMeasures": {
                "temperatureMean": mean,
                "temperatureMax": max,
                "soilPH": [{ "unit": "pH", "value": 6.1, "location": { "centroid": [0.0, 51.8] } }]
            } }
        }))
    }

    #[test]
    fn test_two_measures_two_locations_three_dates() -> Result<(), Box<dyn std::error::Error>> {
        let response = temperature_response(2, 2)?;
        let tables = flatten_time_series_measures(
            &response,
            &["temperatureMean", "temperatureMax"],
            Alignment::CoRegistered,
        )?;
        assert_eq!(tables.len(), 1);
        let table = &tables[0];
        dbg!(table);
        assert_eq!(table.layout(), TableLayout::TimeSeries);
        assert_eq!(table.len(), 6);
        for record in table.records() {
            assert!(record.date.is_some());
            assert!(record.values.iter().all(Option::is_some));
        }
        assert_eq!(table.value(0, "temperatureMean"), Some(4.0));
        assert_eq!(table.value(0, "temperatureMax"), Some(9.0));
        Ok(())
    }

    #[test]
    fn test_order_is_location_then_date() -> Result<(), Box<dyn std::error::Error>> {
        let response = QueryResponse::from_json(&json!({
            "rainfall": [
                series("mm", 1.0, &[("2020-01-03", 3.0), ("2020-01-01", 1.0)]),
                series("mm", 0.0, &[("2020-01-02", 2.0)])
            ]
        }))?;
        let tables = flatten_time_series_measures(&response, &["rainfall"], Alignment::CoRegistered)?;
        let order: Vec<(String, String)> = tables[0]
            .records()
            .iter()
            .map(|r| (r.location.key().to_string(), r.date.unwrap().to_string()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("1 51.8".to_string(), "2020-01-01".to_string()),
                ("1 51.8".to_string(), "2020-01-03".to_string()),
                ("0 51.8".to_string(), "2020-01-02".to_string()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_misaligned_grid_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let response = temperature_response(4, 5)?;
        let result = flatten_time_series_measures(
            &response,
            &["temperatureMean", "temperatureMax"],
            Alignment::CoRegistered,
        );
        match result {
            Err(FlattenError::MisalignedGrid { measure, reference, detail }) => {
                assert_eq!(measure, "temperatureMax");
                assert_eq!(reference, "temperatureMean");
                assert_eq!(detail, "5 locations versus 4");
            }
            other => panic!("expected MisalignedGrid, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn test_by_location_outer_joins_ragged_grids() -> Result<(), Box<dyn std::error::Error>> {
        let response = temperature_response(4, 5)?;
        let tables = flatten_time_series_measures(
            &response,
            &["temperatureMean", "temperatureMax"],
            Alignment::ByLocation,
        )?;
        let table = &tables[0];
        assert_eq!(table.len(), 15);
        let last = table.len() - 1;
        assert_eq!(table.value(last, "temperatureMean"), None);
        assert_eq!(table.value(last, "temperatureMax"), Some(11.0));
        Ok(())
    }

    #[test]
    fn test_ragged_dates_are_marked_missing() -> Result<(), Box<dyn std::error::Error>> {
        let response = QueryResponse::from_json(&json!({
            "temperatureMin": [series("Cel", 0.0, &[("2020-01-01", -1.0), ("2020-01-02", -2.0)])],
            "temperatureMax": [series("Cel", 0.0, &[("2020-01-02", 8.0), ("2020-01-03", 9.0)])]
        }))?;
        let tables = flatten_time_series_measures(
            &response,
            &["temperatureMin", "temperatureMax"],
            Alignment::CoRegistered,
        )?;
        let table = &tables[0];
        assert_eq!(table.len(), 3);
        assert_eq!(table.value(0, "temperatureMax"), None);
        assert_eq!(table.value(1, "temperatureMin"), Some(-2.0));
        assert_eq!(table.value(1, "temperatureMax"), Some(8.0));
        assert_eq!(table.value(2, "temperatureMin"), None);
        Ok(())
    }

    #[test]
    fn test_duplicate_date_keeps_last_occurrence() -> Result<(), Box<dyn std::error::Error>> {
        let response = QueryResponse::from_json(&json!({
            "rainfall": [series("mm", 0.0, &[("2020-01-01", 1.0), ("2020-01-02", 2.0), ("2020-01-01", 7.5)])]
        }))?;
        let tables = flatten_time_series_measures(&response, &["rainfall"], Alignment::CoRegistered)?;
        let table = &tables[0];
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0].date, NaiveDate::from_ymd_opt(2020, 1, 1));
        assert_eq!(table.value(0, "rainfall"), Some(7.5));
        Ok(())
    }

    #[test]
    fn test_separate_tables_per_measure() -> Result<(), Box<dyn std::error::Error>> {
        let response = temperature_response(4, 5)?;
        let tables = flatten_time_series_measures(
            &response,
            &["temperatureMean", "temperatureMax"],
            Alignment::Separate,
        )?;
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 12);
        assert_eq!(tables[1].len(), 15);
        assert_eq!(tables[1].fields(), &["temperatureMax".to_string()]);
        Ok(())
    }

    #[test]
    fn test_scalar_is_a_kind_mismatch() -> Result<(), Box<dyn std::error::Error>> {
        let response = temperature_response(1, 1)?;
        let result = flatten_time_series_measures(&response, &["soilPH"], Alignment::CoRegistered);
        assert_eq!(
            result,
            Err(FlattenError::KindMismatch {
                measure: "soilPH".to_string(),
                expected: MeasureKind::TimeSeries,
                found: MeasureKind::Scalar,
            })
        );
        Ok(())
    }

    #[test]
    fn test_unknown_measure() -> Result<(), Box<dyn std::error::Error>> {
        let response = temperature_response(1, 1)?;
        let result = flatten_time_series_measures(&response, &["temperatureMin"], Alignment::ByLocation);
        assert!(matches!(result, Err(FlattenError::UnknownMeasure { measure }) if measure == "temperatureMin"));
        Ok(())
    }
}
