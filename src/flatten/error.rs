use crate::types::measure::MeasureKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlattenError {
    #[error("Measure '{measure}' is not present in the response")]
    UnknownMeasure { measure: String },

    #[error("Measure '{measure}' is {found}, expected {expected}")]
    KindMismatch {
        measure: String,
        expected: MeasureKind,
        found: MeasureKind,
    },

    #[error("Measure '{measure}' is not co-registered with '{reference}': {detail}")]
    MisalignedGrid {
        measure: String,
        reference: String,
        detail: String,
    },

    #[error("No geometry fragment matches location '{key}' (row {row})")]
    GeometryResolution { key: String, row: usize },
}
