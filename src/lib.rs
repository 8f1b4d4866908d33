//! Flattens GraphQL geospatial measure responses into flat, geometry-attached
//! tables, and writes those tables as CSV, Parquet or GeoJSON.

mod error;
mod export;
mod fields;
mod flatten;
mod response;
mod transport;
mod types;

pub use error::GeoMeasuresError;

pub use types::location::{to_wkt, Location, LocationKey};
pub use types::measure::{Datapoint, MeasureKind, MeasureSeries, ScalarMeasure, TimeSeriesMeasure};
pub use types::record::{FlatRecord, FlatTable, Reading, TableLayout};

pub use response::error::ResponseError;
pub use response::query_response::QueryResponse;

pub use flatten::error::FlattenError;
pub use flatten::geometry::{attach_geometry, GeometrySource};
pub use flatten::scalar::flatten_scalar_measures;
pub use flatten::time_series::flatten_time_series_measures;
pub use flatten::Alignment;

pub use fields::error::FieldNameError;
pub use fields::normalize::{normalize_field_names, FieldNameMap, SHAPEFILE_FIELD_LENGTH};

pub use export::error::ExportError;
pub use export::frame::{DATE_COLUMN, GEOMETRY_COLUMN, UNIT_SUFFIX};
pub use export::writer::{to_feature_collection, write_table, ExportFormat};

pub use transport::client::{GraphQlClient, DEFAULT_API_KEY_HEADER, DEFAULT_ENDPOINT};
pub use transport::error::TransportError;
