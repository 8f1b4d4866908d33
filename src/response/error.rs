use crate::types::measure::MeasureKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("Failed to parse JSON response")]
    Json(#[from] serde_json::Error),

    #[error("Required field '{path}' is missing or null")]
    MissingField { path: String },

    #[error("GraphQL query returned errors: {}", .messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("Malformed geometry for measure '{measure}' at index {index}: {reason}")]
    MalformedGeometry {
        measure: String,
        index: usize,
        reason: String,
    },

    #[error("Measure '{measure}' at index {index} must carry exactly one of 'value' or 'datapoints'")]
    AmbiguousKind { measure: String, index: usize },

    #[error("Unknown kind tag {tag} in measure '{measure}' at index {index}")]
    UnknownKind {
        measure: String,
        index: usize,
        tag: String,
    },

    #[error("Measure '{measure}' at index {index} is {found} but earlier instances are {expected}")]
    MixedKinds {
        measure: String,
        index: usize,
        expected: MeasureKind,
        found: MeasureKind,
    },

    #[error("Datapoints of measure '{measure}' at index {index} mix units '{expected}' and '{found}'")]
    InconsistentUnit {
        measure: String,
        index: usize,
        expected: String,
        found: String,
    },

    #[error("Unparseable date '{raw}' in measure '{measure}' at index {index}, datapoint {datapoint}")]
    MalformedDate {
        measure: String,
        index: usize,
        datapoint: usize,
        raw: String,
    },

    #[error("Non-numeric value in measure '{measure}' at index {index}: {raw}")]
    MalformedValue {
        measure: String,
        index: usize,
        raw: String,
    },

    #[error("Non-numeric value in measure '{measure}' at index {index}, datapoint {datapoint}: {raw}")]
    MalformedDatapointValue {
        measure: String,
        index: usize,
        datapoint: usize,
        raw: String,
    },
}
