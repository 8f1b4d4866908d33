//! In-memory tabular form of a [`FlatTable`] as a polars `DataFrame`.

use crate::export::error::ExportError;
use crate::fields::error::FieldNameError;
use crate::fields::normalize::{normalize_field_names, FieldNameMap};
use crate::types::record::{FlatTable, TableLayout};
use polars::prelude::*;
use std::collections::HashSet;

/// Name of the WKT geometry column.
pub const GEOMETRY_COLUMN: &str = "geometry";
/// Name of the date column of time-series tables.
pub const DATE_COLUMN: &str = "date";
/// Suffix of the unit column written next to each value column.
pub const UNIT_SUFFIX: &str = "_unit";

pub(crate) fn unit_column(field: &str) -> String {
    format!("{field}{UNIT_SUFFIX}")
}

pub(crate) fn output_name<'a>(names: Option<&'a FieldNameMap>, column: &'a str) -> &'a str {
    names.and_then(|m| m.get(column)).unwrap_or(column)
}

impl FlatTable {
    /// Column names of the exported form, before any normalization:
    /// `geometry`, `date` (time series only), then `<field>` and
    /// `<field>_unit` for every field.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = vec![GEOMETRY_COLUMN.to_string()];
        if self.layout == TableLayout::TimeSeries {
            names.push(DATE_COLUMN.to_string());
        }
        for field in &self.fields {
            names.push(field.clone());
            names.push(unit_column(field));
        }
        names
    }

    /// Rejects tables whose fields clash with `geometry`, `date` or another
    /// field's `_unit` column.
    ///
    /// # Errors
    ///
    /// [`FieldNameError::DuplicateField`] naming the first repeated column.
    pub fn check_column_names(&self) -> Result<(), FieldNameError> {
        let mut seen = HashSet::new();
        for name in self.column_names() {
            if seen.contains(&name) {
                return Err(FieldNameError::DuplicateField(name));
            }
            seen.insert(name);
        }
        Ok(())
    }

    /// Converts the table to a `DataFrame` with full column names.
    ///
    /// # Examples
    ///
    /// ```
    /// use geomeasures::QueryResponse;
    /// use serde_json::json;
    ///
    /// let response = QueryResponse::from_json(&json!({
    ///     "soilPH": [{ "unit": "pH", "value": 6.1, "location": { "centroid": [-0.38, 51.81] } }]
    /// }))?;
    /// let tables = response.scalar_measures(&["soilPH"]).call()?;
    /// let df = tables[0].to_dataframe()?;
    /// assert_eq!(df.shape(), (1, 3));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn to_dataframe(&self) -> Result<DataFrame, ExportError> {
        build_frame(self, None)
    }

    /// Converts the table to a `DataFrame` whose column names fit `max_length`.
    ///
    /// # Errors
    ///
    /// [`ExportError::FieldNames`] when a field clashes with another column or
    /// the names cannot be made unique within the budget.
    pub fn to_dataframe_normalized(&self, max_length: usize) -> Result<DataFrame, ExportError> {
        self.check_column_names()?;
        let names = normalize_field_names(&self.column_names(), max_length)?;
        build_frame(self, Some(&names))
    }

    pub fn to_lazyframe(&self) -> Result<LazyFrame, ExportError> {
        Ok(self.to_dataframe()?.lazy())
    }
}

pub(crate) fn build_frame(
    table: &FlatTable,
    names: Option<&FieldNameMap>,
) -> Result<DataFrame, ExportError> {
    table.check_column_names()?;
    let records = &table.records;
    let mut columns: Vec<Column> = Vec::with_capacity(2 + table.fields.len() * 2);

    let geometry: Vec<String> = records.iter().map(|r| r.location.wkt()).collect();
    columns.push(Column::new(output_name(names, GEOMETRY_COLUMN).into(), geometry));

    if table.layout == TableLayout::TimeSeries {
        let dates = DateChunked::from_naive_date_options(
            output_name(names, DATE_COLUMN).into(),
            records.iter().map(|r| r.date),
        );
        columns.push(Column::from(dates.into_series()));
    }

    for (index, field) in table.fields.iter().enumerate() {
        let values: Vec<Option<f64>> = records
            .iter()
            .map(|r| r.values[index].as_ref().and_then(|reading| reading.value))
            .collect();
        let units: Vec<Option<String>> = records
            .iter()
            .map(|r| r.values[index].as_ref().map(|reading| reading.unit.clone()))
            .collect();
        let unit_name = unit_column(field);
        columns.push(Column::new(output_name(names, field).into(), values));
        columns.push(Column::new(output_name(names, &unit_name).into(), units));
    }

    Ok(DataFrame::new(columns)?)
}
