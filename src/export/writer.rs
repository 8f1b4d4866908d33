use crate::export::error::ExportError;
use crate::export::frame::{build_frame, output_name, unit_column, DATE_COLUMN};
use crate::fields::normalize::{normalize_field_names, FieldNameMap};
use crate::types::record::FlatTable;
use geojson::{Feature, FeatureCollection, JsonObject};
use log::info;
use polars::prelude::*;
use serde_json::Value;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Csv,
    Parquet,
    /// A `FeatureCollection` of the record geometries.
    GeoJson,
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Csv => "CSV",
            ExportFormat::Parquet => "Parquet",
            ExportFormat::GeoJson => "GeoJSON",
        };
        f.write_str(name)
    }
}

/// Writes a flattened table to `path`.
///
/// When `max_field_length` is given, every column name is first normalized to
/// fit it (see [`normalize_field_names`]).
///
/// # Examples
///
/// ```no_run
/// use geomeasures::{write_table, ExportFormat, QueryResponse, SHAPEFILE_FIELD_LENGTH};
/// use std::path::Path;
///
/// # fn run(response: QueryResponse) -> Result<(), Box<dyn std::error::Error>> {
/// let tables = response.scalar_measures(&["soilPH"]).call()?;
/// write_table()
///     .table(&tables[0])
///     .path(Path::new("soil_ph.geojson"))
///     .format(ExportFormat::GeoJson)
///     .max_field_length(SHAPEFILE_FIELD_LENGTH)
///     .call()?;
/// # Ok(())
/// # }
/// ```
#[bon::builder]
pub fn write_table(
    table: &FlatTable,
    path: &Path,
    format: ExportFormat,
    max_field_length: Option<usize>,
) -> Result<(), ExportError> {
    table.check_column_names()?;
    let names = max_field_length
        .map(|max| normalize_field_names(&table.column_names(), max))
        .transpose()?;

    // Nothing is created on disk until the table has been converted.
    match format {
        ExportFormat::Csv => {
            let mut df = build_frame(table, names.as_ref())?;
            CsvWriter::new(create_file(path)?)
                .include_header(true)
                .finish(&mut df)
                .map_err(|source| ExportError::Encode {
                    path: path.to_path_buf(),
                    format,
                    source,
                })?;
        }
        ExportFormat::Parquet => {
            let mut df = build_frame(table, names.as_ref())?;
            ParquetWriter::new(create_file(path)?)
                .with_compression(ParquetCompression::Snappy)
                .finish(&mut df)
                .map_err(|source| ExportError::Encode {
                    path: path.to_path_buf(),
                    format,
                    source,
                })?;
        }
        ExportFormat::GeoJson => {
            let collection = to_feature_collection(table, names.as_ref())?;
            let mut writer = BufWriter::new(create_file(path)?);
            serde_json::to_writer(&mut writer, &collection)
                .map_err(|e| ExportError::Json(path.to_path_buf(), e))?;
            writer
                .flush()
                .map_err(|e| ExportError::Io(path.to_path_buf(), e))?;
        }
    }

    info!(
        "Wrote {} records ({} fields) as {} to {}",
        table.len(),
        table.fields().len(),
        format,
        path.display()
    );
    Ok(())
}

fn create_file(path: &Path) -> Result<File, ExportError> {
    File::create(path).map_err(|e| ExportError::Io(path.to_path_buf(), e))
}

/// Builds one GeoJSON feature per record. Properties hold the date (time
/// series only), each field value and its unit; missing values are `null`.
///
/// # Errors
///
/// [`ExportError::FieldNames`] when a field clashes with another property name.
pub fn to_feature_collection(
    table: &FlatTable,
    names: Option<&FieldNameMap>,
) -> Result<FeatureCollection, ExportError> {
    table.check_column_names()?;
    let features = table
        .records()
        .iter()
        .map(|record| {
            let mut properties = JsonObject::new();
            if let Some(date) = record.date {
                properties.insert(
                    output_name(names, DATE_COLUMN).to_string(),
                    Value::String(date.format("%Y-%m-%d").to_string()),
                );
            }
            for (field, cell) in table.fields().iter().zip(&record.values) {
                let unit_name = unit_column(field);
                let (value, unit) = match cell {
                    Some(reading) => (
                        reading.value.map_or(Value::Null, Value::from),
                        Value::from(reading.unit.as_str()),
                    ),
                    None => (Value::Null, Value::Null),
                };
                properties.insert(output_name(names, field).to_string(), value);
                properties.insert(output_name(names, &unit_name).to_string(), unit);
            }

            let geometry = record.location.geometry();
            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}
