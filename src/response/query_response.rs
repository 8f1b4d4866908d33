//! The parsed result of one geospatial measures query.

use crate::flatten::error::FlattenError;
use crate::flatten::scalar::flatten_scalar_measures;
use crate::flatten::time_series::flatten_time_series_measures;
use crate::flatten::Alignment;
use crate::response::error::ResponseError;
use crate::response::parse::parse_document;
use crate::types::measure::MeasureSeries;
use crate::types::record::FlatTable;
use bon::bon;
use serde_json::Value;
use std::str::FromStr;

/// Measure name → all instances returned for it, in response order.
///
/// Obtain one with [`QueryResponse::from_json`], by parsing a string
/// (`"...".parse::<QueryResponse>()`), or from
/// [`crate::GraphQlClient::fetch_measures`].
///
/// # Examples
///
/// ```
/// use geomeasures::{Alignment, QueryResponse};
/// use serde_json::json;
///
/// let response = QueryResponse::from_json(&json!({
///     "data": { "geospatialMeasures": {
///         "soilPH": [{ "unit": "pH", "value": 6.1, "location": { "centroid": [-0.38, 51.81] } }],
///         "soilTotalAbundanceOfInvertebrates": [{
///             "unit": "count", "value": 120, "location": { "centroid": [-0.38, 51.81] }
///         }]
///     } }
/// }))?;
///
/// let tables = response
///     .scalar_measures(&["soilPH", "soilTotalAbundanceOfInvertebrates"])
///     .alignment(Alignment::ByLocation)
///     .call()?;
/// assert_eq!(tables[0].len(), 1);
/// assert_eq!(tables[0].value(0, "soilPH"), Some(6.1));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResponse {
    measures: Vec<(String, MeasureSeries)>,
}

#[bon]
impl QueryResponse {
    /// Parses a GraphQL response document.
    ///
    /// # Errors
    ///
    /// Returns a [`ResponseError`] naming the offending measure and instance when
    /// the document carries GraphQL errors, lacks required fields, has malformed
    /// geometry or dates, or mixes scalar and time-series instances.
    pub fn from_json(document: &Value) -> Result<Self, ResponseError> {
        Ok(Self {
            measures: parse_document(document)?,
        })
    }

    /// Adds or replaces a measure.
    pub fn insert(&mut self, name: impl Into<String>, series: MeasureSeries) {
        let name = name.into();
        match self.measures.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = series,
            None => self.measures.push((name, series)),
        }
    }

    pub fn measure(&self, name: &str) -> Option<&MeasureSeries> {
        self.measures
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, series)| series)
    }

    pub fn measure_names(&self) -> impl Iterator<Item = &str> {
        self.measures.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.measures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measures.is_empty()
    }

    /// Flattens scalar measures.
    ///
    /// Start with the measure names, optionally set `.alignment(..)` (default
    /// [`Alignment::Separate`]: one table per measure), then `.call()`.
    /// See [`flatten_scalar_measures`].
    #[builder(start_fn = scalar_measures)]
    #[doc(hidden)]
    pub fn build_scalar_measures(
        &self,
        #[builder(start_fn)] names: &[&str],
        alignment: Option<Alignment>,
    ) -> Result<Vec<FlatTable>, FlattenError> {
        flatten_scalar_measures(self, names, alignment.unwrap_or(Alignment::Separate))
    }

    /// Flattens co-registered time-series measures.
    ///
    /// Start with the measure names, optionally set `.alignment(..)` (default
    /// [`Alignment::CoRegistered`], which is checked), then `.call()`.
    /// See [`flatten_time_series_measures`].
    #[builder(start_fn = time_series_measures)]
    #[doc(hidden)]
    pub fn build_time_series_measures(
        &self,
        #[builder(start_fn)] names: &[&str],
        alignment: Option<Alignment>,
    ) -> Result<Vec<FlatTable>, FlattenError> {
        flatten_time_series_measures(self, names, alignment.unwrap_or(Alignment::CoRegistered))
    }
}

impl FromStr for QueryResponse {
    type Err = ResponseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let document: Value = serde_json::from_str(s)?;
        Self::from_json(&document)
    }
}

impl FromIterator<(String, MeasureSeries)> for QueryResponse {
    fn from_iter<T: IntoIterator<Item = (String, MeasureSeries)>>(iter: T) -> Self {
        let mut response = QueryResponse::default();
        for (name, series) in iter {
            response.insert(name, series);
        }
        response
    }
}
