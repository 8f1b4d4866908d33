use crate::export::error::ExportError;
use crate::fields::error::FieldNameError;
use crate::flatten::error::FlattenError;
use crate::response::error::ResponseError;
use crate::transport::error::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeoMeasuresError {
    #[error(transparent)]
    Response(#[from] ResponseError),

    #[error(transparent)]
    Flatten(#[from] FlattenError),

    #[error(transparent)]
    FieldNames(#[from] FieldNameError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
