use crate::flatten::error::FlattenError;
use crate::flatten::{check_co_registration, unique_names, Alignment, LocationIndex};
use crate::response::query_response::QueryResponse;
use crate::types::location::Location;
use crate::types::measure::{MeasureKind, MeasureSeries, ScalarMeasure};
use crate::types::record::{FlatRecord, FlatTable, TableLayout};
use log::{debug, warn};
use std::collections::HashSet;

/// Flattens scalar (one value per location) measures.
///
/// With [`Alignment::Separate`] every name yields its own table holding
/// exactly one record per instance, in response order. With
/// [`Alignment::ByLocation`] or [`Alignment::CoRegistered`] all names share
/// one table with one record per distinct location; a measure without a
/// value at a location leaves that field missing. A location repeated within
/// one measure keeps its last value.
///
/// # Errors
///
/// [`FlattenError::UnknownMeasure`] and [`FlattenError::KindMismatch`] for a
/// bad name, [`FlattenError::MisalignedGrid`] when co-registration is
/// declared but the grids differ.
pub fn flatten_scalar_measures(
    response: &QueryResponse,
    names: &[&str],
    alignment: Alignment,
) -> Result<Vec<FlatTable>, FlattenError> {
    let measures = unique_names(names)
        .into_iter()
        .map(|name| resolve_scalar(response, name).map(|instances| (name, instances)))
        .collect::<Result<Vec<_>, _>>()?;

    let tables = match alignment {
        Alignment::Separate => measures
            .iter()
            .map(|(name, instances)| separate(name, instances))
            .collect(),
        Alignment::CoRegistered => {
            let grids: Vec<(&str, Vec<&Location>)> = measures
                .iter()
                .map(|(name, instances)| (*name, instances.iter().map(|m| &m.location).collect()))
                .collect();
            check_co_registration(&grids)?;
            vec![merge_by_location(&measures)]
        }
        Alignment::ByLocation => vec![merge_by_location(&measures)],
    };
    debug!(
        "Flattened {} scalar measures into {} tables ({} records)",
        measures.len(),
        tables.len(),
        tables.iter().map(FlatTable::len).sum::<usize>()
    );
    Ok(tables)
}

fn resolve_scalar<'a>(
    response: &'a QueryResponse,
    name: &str,
) -> Result<&'a [ScalarMeasure], FlattenError> {
    match response.measure(name) {
        None => Err(FlattenError::UnknownMeasure {
            measure: name.to_string(),
        }),
        Some(MeasureSeries::Empty) => Ok(&[]),
        Some(MeasureSeries::Scalar(instances)) => Ok(instances),
        Some(MeasureSeries::TimeSeries(_)) => Err(FlattenError::KindMismatch {
            measure: name.to_string(),
            expected: MeasureKind::Scalar,
            found: MeasureKind::TimeSeries,
        }),
    }
}

fn separate(name: &str, instances: &[ScalarMeasure]) -> FlatTable {
    let records = instances
        .iter()
        .map(|instance| FlatRecord {
            location: instance.location.clone(),
            date: None,
            values: vec![Some(instance.reading())],
        })
        .collect();
    FlatTable::new(TableLayout::Scalar, vec![name.to_string()], records)
}

fn merge_by_location(measures: &[(&str, &[ScalarMeasure])]) -> FlatTable {
    let width = measures.len();
    let mut index = LocationIndex::default();
    let mut cells: Vec<Vec<_>> = Vec::new();
    let mut written = HashSet::new();

    for (field, (name, instances)) in measures.iter().enumerate() {
        for instance in instances.iter() {
            let slot = index.slot(&instance.location);
            if slot == cells.len() {
                cells.push(vec![None; width]);
            }
            if !written.insert((slot, field)) {
                warn!(
                    "Measure '{}' repeats location '{}'; keeping the last value",
                    name,
                    instance.location.key()
                );
            }
            cells[slot][field] = Some(instance.reading());
        }
    }

    let records = index
        .into_locations()
        .into_iter()
        .zip(cells)
        .map(|(location, values)| FlatRecord {
            location,
            date: None,
            values,
        })
        .collect();
    let fields = measures.iter().map(|(name, _)| name.to_string()).collect();
    FlatTable::new(TableLayout::Scalar, fields, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::error::ResponseError;
    use crate::types::record::Reading;
    use serde_json::json;
    use std::collections::HashMap;

    fn soil_response() -> Result<QueryResponse, ResponseError> {
        QueryResponse::from_json(&json!({
            "data": { "geospatialMeasures": {
                "soilPH": [
                    { "unit": "pH", "value": 6.1, "location": { "centroid": [-0.38, 51.81] } },
                    { "unit": "pH", "value": 5.4, "location": { "centroid": [-0.37, 51.81] } },
                    { "unit": "pH", "value": 7.0, "location": { "centroid": [-0.36, 51.81] } }
                ],
                "soilTotalAbundanceOfInvertebrates": [
                    { "unit": "count", "value": 120, "location": { "centroid": [-0.38, 51.81] } }
                ],
                "rainfall": [
                    { "unit": "mm", "datapoints": [], "location": { "centroid": [-0.38, 51.81] } }
                ]
            } }
        }))
    }

    #[test]
    fn test_separate_preserves_cardinality_and_order() -> Result<(), Box<dyn std::error::Error>> {
        let response = soil_response()?;
        let tables = flatten_scalar_measures(
            &response,
            &["soilPH", "soilTotalAbundanceOfInvertebrates"],
            Alignment::Separate,
        )?;
        dbg!(&tables);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].len(), 3);
        assert_eq!(tables[1].len(), 1);

        let values: Vec<Option<f64>> = (0..3).map(|row| tables[0].value(row, "soilPH")).collect();
        assert_eq!(values, vec![Some(6.1), Some(5.4), Some(7.0)]);
        let reading = tables[0].reading(0, "soilPH").unwrap();
        assert_eq!(reading.unit, "pH");
        assert_eq!(tables[0].records()[0].location.key().as_str(), "-0.38 51.81");
        Ok(())
    }

    #[test]
    fn test_regrouping_recovers_unit_value_pairs() -> Result<(), Box<dyn std::error::Error>> {
        let response = soil_response()?;
        let tables = flatten_scalar_measures(&response, &["soilPH"], Alignment::Separate)?;

        let mut regrouped: HashMap<String, (String, Option<f64>)> = HashMap::new();
        for record in tables[0].records() {
            let reading = record.values[0].clone().unwrap();
            regrouped.insert(record.location.key().to_string(), (reading.unit, reading.value));
        }

        if let Some(MeasureSeries::Scalar(instances)) = response.measure("soilPH") {
            assert_eq!(regrouped.len(), instances.len());
            for instance in instances {
                let (unit, value) = &regrouped[instance.location.key().as_str()];
                assert_eq!(unit, &instance.unit);
                assert_eq!(*value, instance.value);
            }
        } else {
            panic!("soilPH should be scalar");
        }
        Ok(())
    }

    #[test]
    fn test_merge_by_identical_location() -> Result<(), Box<dyn std::error::Error>> {
        let response = QueryResponse::from_json(&json!({
            "soilPH": [{ "unit": "pH", "value": 6.1, "location": { "centroid": [-0.38, 51.81] } }],
            "soilTotalAbundanceOfInvertebrates": [
                { "unit": "count", "value": 120, "location": { "centroid": [-0.38, 51.81] } }
            ]
        }))?;
        let mut tables = flatten_scalar_measures(
            &response,
            &["soilPH", "soilTotalAbundanceOfInvertebrates"],
            Alignment::ByLocation,
        )?;
        assert_eq!(tables.len(), 1);
        let table = &mut tables[0];
        table.rename_field("soilTotalAbundanceOfInvertebrates", "abundance")?;

        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].location.wkt(), "POINT (-0.38 51.81)");
        assert_eq!(table.value(0, "soilPH"), Some(6.1));
        assert_eq!(table.value(0, "abundance"), Some(120.0));
        Ok(())
    }

    #[test]
    fn test_merge_marks_missing_fields() -> Result<(), Box<dyn std::error::Error>> {
        let response = soil_response()?;
        let tables = flatten_scalar_measures(
            &response,
            &["soilPH", "soilTotalAbundanceOfInvertebrates"],
            Alignment::ByLocation,
        )?;
        let table = &tables[0];
        assert_eq!(table.len(), 3);
        assert_eq!(table.value(0, "soilTotalAbundanceOfInvertebrates"), Some(120.0));
        assert_eq!(table.value(1, "soilTotalAbundanceOfInvertebrates"), None);
        assert_eq!(table.value(2, "soilTotalAbundanceOfInvertebrates"), None);
        assert_eq!(table.value(1, "soilPH"), Some(5.4));
        Ok(())
    }

    #[test]
    fn test_co_registration_is_checked() -> Result<(), Box<dyn std::error::Error>> {
        let response = soil_response()?;
        let result = flatten_scalar_measures(
            &response,
            &["soilPH", "soilTotalAbundanceOfInvertebrates"],
            Alignment::CoRegistered,
        );
        assert!(matches!(
            result,
            Err(FlattenError::MisalignedGrid { measure, .. }) if measure == "soilTotalAbundanceOfInvertebrates"
        ));
        Ok(())
    }

    #[test]
    fn test_unknown_measure() -> Result<(), Box<dyn std::error::Error>> {
        let response = soil_response()?;
        let result = flatten_scalar_measures(&response, &["soilPh"], Alignment::Separate);
        assert_eq!(
            result,
            Err(FlattenError::UnknownMeasure {
                measure: "soilPh".to_string()
            })
        );
        Ok(())
    }

    #[test]
    fn test_time_series_is_a_kind_mismatch() -> Result<(), Box<dyn std::error::Error>> {
        let response = soil_response()?;
        let result = flatten_scalar_measures(&response, &["soilPH", "rainfall"], Alignment::Separate);
        assert_eq!(
            result,
            Err(FlattenError::KindMismatch {
                measure: "rainfall".to_string(),
                expected: MeasureKind::Scalar,
                found: MeasureKind::TimeSeries,
            })
        );
        Ok(())
    }

    #[test]
    fn test_repeated_location_keeps_last_value() -> Result<(), Box<dyn std::error::Error>> {
        let response = QueryResponse::from_json(&json!({
            "soilPH": [
                { "unit": "pH", "value": 6.1, "location": { "centroid": [0, 0] } },
                { "unit": "pH", "value": 6.4, "location": { "centroid": [0, 0] } }
            ]
        }))?;
        let merged = flatten_scalar_measures(&response, &["soilPH"], Alignment::ByLocation)?;
        assert_eq!(merged[0].len(), 1);
        assert_eq!(merged[0].value(0, "soilPH"), Some(6.4));

        let separate = flatten_scalar_measures(&response, &["soilPH"], Alignment::Separate)?;
        assert_eq!(separate[0].len(), 2);
        Ok(())
    }

    #[test]
    fn test_null_value_keeps_unit() -> Result<(), Box<dyn std::error::Error>> {
        let response = QueryResponse::from_json(&json!({
            "soilPH": [
                { "unit": "pH", "value": null, "location": { "centroid": [0, 0] } },
                { "unit": "pH", "value": 6.4, "location": { "centroid": [1, 0] } }
            ],
            "soilOrganicMatter": [
                { "unit": "%", "value": 3.2, "location": { "centroid": [1, 0] } }
            ]
        }))?;

        let separate = flatten_scalar_measures(&response, &["soilPH"], Alignment::Separate)?;
        let record = &separate[0].records()[0];
        dbg!(record);
        assert_eq!(
            record.values,
            vec![Some(Reading {
                value: None,
                unit: "pH".to_string()
            })]
        );
        assert_eq!(separate[0].value(0, "soilPH"), None);

        let merged = flatten_scalar_measures(
            &response,
            &["soilPH", "soilOrganicMatter"],
            Alignment::ByLocation,
        )?;
        let table = &merged[0];
        assert_eq!(table.len(), 2);
        let ph = table.reading(0, "soilPH").unwrap();
        assert_eq!(ph.value, None);
        assert_eq!(ph.unit, "pH");
        // Absent measure, as opposed to a null value.
        assert!(table.reading(0, "soilOrganicMatter").is_none());
        Ok(())
    }
}
