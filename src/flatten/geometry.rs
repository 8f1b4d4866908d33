//! Attaching externally resolved geometry (typically cell shapes) to records.

use crate::flatten::error::FlattenError;
use crate::response::error::ResponseError;
use crate::response::geometry::parse_location;
use crate::response::query_response::QueryResponse;
use crate::types::location::LocationKey;
use crate::types::record::FlatTable;
use geo_types::Geometry;
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

const FRAGMENTS: &str = "<geometry fragments>";

/// Geometry fragments keyed by the location they belong to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometrySource {
    fragments: HashMap<LocationKey, Geometry<f64>>,
}

impl GeometrySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a fragment, returning the one it replaced.
    pub fn insert(&mut self, key: LocationKey, geometry: Geometry<f64>) -> Option<Geometry<f64>> {
        self.fragments.insert(key, geometry)
    }

    pub fn get(&self, key: &LocationKey) -> Option<&Geometry<f64>> {
        self.fragments.get(key)
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Collects the geometry of every instance of `measure` (shape when the
    /// query selected one, centroid otherwise), keyed by its location key.
    pub fn from_measure(response: &QueryResponse, measure: &str) -> Result<Self, FlattenError> {
        let series = response
            .measure(measure)
            .ok_or_else(|| FlattenError::UnknownMeasure {
                measure: measure.to_string(),
            })?;
        let mut source = Self::new();
        for location in series.locations() {
            source.insert(location.key().clone(), location.geometry());
        }
        debug!("Collected {} geometry fragments from '{}'", source.len(), measure);
        Ok(source)
    }

    /// Parses a JSON array of location sub-selections (`{ centroid, shape }`,
    /// optionally wrapped as `{ location: {..} }`).
    pub fn from_fragments(fragments: &Value) -> Result<Self, ResponseError> {
        let items = fragments
            .as_array()
            .ok_or_else(|| ResponseError::MissingField {
                path: format!("{FRAGMENTS}[]"),
            })?;
        let mut source = Self::new();
        for (index, item) in items.iter().enumerate() {
            let fragment = item.get("location").unwrap_or(item);
            let location = parse_location(fragment).map_err(|reason| {
                ResponseError::MalformedGeometry {
                    measure: FRAGMENTS.to_string(),
                    index,
                    reason,
                }
            })?;
            source.insert(location.key().clone(), location.geometry());
        }
        Ok(source)
    }
}

/// Replaces every record's geometry with the fragment matching its location key.
///
/// # Errors
///
/// [`FlattenError::GeometryResolution`] for the first record whose key has no
/// fragment; no records are returned in that case.
pub fn attach_geometry(table: FlatTable, source: &GeometrySource) -> Result<FlatTable, FlattenError> {
    let FlatTable {
        layout,
        fields,
        records,
    } = table;
    let records = records
        .into_iter()
        .enumerate()
        .map(|(row, mut record)| {
            let geometry = source.get(record.location.key()).ok_or_else(|| {
                FlattenError::GeometryResolution {
                    key: record.location.key().to_string(),
                    row,
                }
            })?;
            record.location = record.location.with_shape(geometry.clone());
            Ok(record)
        })
        .collect::<Result<Vec<_>, FlattenError>>()?;
    Ok(FlatTable::new(layout, fields, records))
}
