use crate::export::writer::ExportFormat;
use crate::fields::error::FieldNameError;
use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    FieldNames(#[from] FieldNameError),

    #[error("Failed building DataFrame: {0}")]
    Polars(#[from] PolarsError),

    #[error("I/O error writing '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed serializing GeoJSON to '{0}'")]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("Encoding error writing {format} file '{path}'")]
    Encode {
        path: PathBuf,
        format: ExportFormat,
        #[source]
        source: PolarsError,
    },
}
