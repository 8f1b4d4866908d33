//! Wire JSON → [`MeasureSeries`] conversion.
//!
//! Accepts `{ data: { geospatialMeasures: {..} } }`, the same document without
//! the `data` wrapper, or the bare measures object. The scalar/time-series
//! discriminant is an explicit `kind` tag when present, otherwise the presence
//! of `value` versus `datapoints`.

use crate::response::error::ResponseError;
use crate::response::geometry::{json_kind, parse_location};
use crate::types::location::Location;
use crate::types::measure::{
    Datapoint, MeasureKind, MeasureSeries, ScalarMeasure, TimeSeriesMeasure,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::debug;
use serde_json::{Map, Value};

const MEASURES_FIELD: &str = "geospatialMeasures";

pub(crate) fn parse_document(document: &Value) -> Result<Vec<(String, MeasureSeries)>, ResponseError> {
    if let Some(errors) = document.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| e.to_string())
                })
                .collect();
            return Err(ResponseError::GraphQl { messages });
        }
    }

    let root = document.get("data").unwrap_or(document);
    let measures = root.get(MEASURES_FIELD).unwrap_or(root);
    let measures = measures
        .as_object()
        .ok_or_else(|| ResponseError::MissingField {
            path: format!("data.{MEASURES_FIELD}"),
        })?;

    let parsed = measures
        .iter()
        .map(|(name, value)| parse_series(name, value).map(|series| (name.clone(), series)))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(
        "Parsed {} measures ({} instances)",
        parsed.len(),
        parsed.iter().map(|(_, s)| s.len()).sum::<usize>()
    );
    Ok(parsed)
}

fn parse_series(name: &str, value: &Value) -> Result<MeasureSeries, ResponseError> {
    let instances: Vec<&Value> = match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.iter().collect(),
        Value::Object(_) => vec![value],
        _ => {
            return Err(ResponseError::MissingField {
                path: format!("{name}[]"),
            })
        }
    };

    let mut series_kind: Option<MeasureKind> = None;
    let mut scalars = Vec::new();
    let mut time_series = Vec::new();
    for (index, instance) in instances.into_iter().enumerate() {
        let object = instance.as_object().ok_or_else(|| ResponseError::MissingField {
            path: format!("{name}[{index}]"),
        })?;
        let kind = instance_kind(name, index, object)?;
        match series_kind {
            Some(expected) if expected != kind => {
                return Err(ResponseError::MixedKinds {
                    measure: name.to_string(),
                    index,
                    expected,
                    found: kind,
                })
            }
            _ => series_kind = Some(kind),
        }
        match kind {
            MeasureKind::Scalar => scalars.push(parse_scalar(name, index, object)?),
            MeasureKind::TimeSeries => time_series.push(parse_time_series(name, index, object)?),
        }
    }

    Ok(match series_kind {
        None => MeasureSeries::Empty,
        Some(MeasureKind::Scalar) => MeasureSeries::Scalar(scalars),
        Some(MeasureKind::TimeSeries) => MeasureSeries::TimeSeries(time_series),
    })
}

fn instance_kind(
    name: &str,
    index: usize,
    object: &Map<String, Value>,
) -> Result<MeasureKind, ResponseError> {
    match object.get("kind") {
        None | Some(Value::Null) => {}
        Some(tag) => {
            return tag
                .as_str()
                .and_then(MeasureKind::from_tag)
                .ok_or_else(|| ResponseError::UnknownKind {
                    measure: name.to_string(),
                    index,
                    tag: tag.to_string(),
                })
        }
    }
    match (object.contains_key("value"), object.contains_key("datapoints")) {
        (true, false) => Ok(MeasureKind::Scalar),
        (false, true) => Ok(MeasureKind::TimeSeries),
        _ => Err(ResponseError::AmbiguousKind {
            measure: name.to_string(),
            index,
        }),
    }
}

fn parse_scalar(
    name: &str,
    index: usize,
    object: &Map<String, Value>,
) -> Result<ScalarMeasure, ResponseError> {
    let unit = required_str(object, "unit", || format!("{name}[{index}].unit"))?;
    Ok(ScalarMeasure {
        unit: unit.to_string(),
        value: parse_value(object.get("value")).map_err(|raw| ResponseError::MalformedValue {
            measure: name.to_string(),
            index,
            raw,
        })?,
        location: location(name, index, object)?,
    })
}

fn parse_time_series(
    name: &str,
    index: usize,
    object: &Map<String, Value>,
) -> Result<TimeSeriesMeasure, ResponseError> {
    let measure_unit = object.get("unit").and_then(Value::as_str);
    let raw_points: &[Value] = match object.get("datapoints") {
        Some(Value::Array(points)) => points.as_slice(),
        Some(Value::Null) | None => &[],
        Some(_) => {
            return Err(ResponseError::MissingField {
                path: format!("{name}[{index}].datapoints[]"),
            })
        }
    };

    let mut datapoints = Vec::with_capacity(raw_points.len());
    for (point_index, point) in raw_points.iter().enumerate() {
        let path = || format!("{name}[{index}].datapoints[{point_index}]");
        let point = point
            .as_object()
            .ok_or_else(|| ResponseError::MissingField { path: path() })?;
        let raw_date = required_str(point, "date", || format!("{}.date", path()))?;
        let date = parse_date(raw_date).ok_or_else(|| ResponseError::MalformedDate {
            measure: name.to_string(),
            index,
            datapoint: point_index,
            raw: raw_date.to_string(),
        })?;
        let unit = point
            .get("unit")
            .and_then(Value::as_str)
            .or(measure_unit)
            .ok_or_else(|| ResponseError::MissingField {
                path: format!("{}.unit", path()),
            })?;
        datapoints.push(Datapoint {
            date,
            value: parse_value(point.get("value")).map_err(|raw| {
                ResponseError::MalformedDatapointValue {
                    measure: name.to_string(),
                    index,
                    datapoint: point_index,
                    raw,
                }
            })?,
            unit: unit.to_string(),
        });
    }

    let unit = match (measure_unit, datapoints.first()) {
        (Some(unit), _) => unit.to_string(),
        (None, Some(first)) => first.unit.clone(),
        (None, None) => {
            return Err(ResponseError::MissingField {
                path: format!("{name}[{index}].unit"),
            })
        }
    };
    if let Some(odd) = datapoints.iter().find(|p| p.unit != unit) {
        return Err(ResponseError::InconsistentUnit {
            measure: name.to_string(),
            index,
            expected: unit,
            found: odd.unit.clone(),
        });
    }

    Ok(TimeSeriesMeasure {
        unit,
        location: location(name, index, object)?,
        datapoints,
    })
}

fn location(
    name: &str,
    index: usize,
    object: &Map<String, Value>,
) -> Result<Location, ResponseError> {
    let value = object
        .get("location")
        .filter(|v| !v.is_null())
        .ok_or_else(|| ResponseError::MissingField {
            path: format!("{name}[{index}].location"),
        })?;
    parse_location(value).map_err(|reason| ResponseError::MalformedGeometry {
        measure: name.to_string(),
        index,
        reason,
    })
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: impl FnOnce() -> String,
) -> Result<&'a str, ResponseError> {
    object
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ResponseError::MissingField { path: path() })
}

/// `null` and absent values are missing; the error carries the raw text.
fn parse_value(value: Option<&Value>) -> Result<Option<f64>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_f64().map(Some).ok_or_else(|| n.to_string()),
        Some(Value::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|_| s.clone()),
        Some(other) => Err(json_kind(other).to_string()),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}
