//! Flat, geometry-attached rows produced by the flattener.

use crate::fields::error::FieldNameError;
use crate::types::location::Location;
use chrono::NaiveDate;

/// One measure's cell in a record. `value` is `None` when the API returned
/// `null`; the unit is kept either way.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: Option<f64>,
    pub unit: String,
}

/// One output row.
///
/// `values` is aligned with [`FlatTable::fields`]; `None` marks a measure that
/// has no instance at this location (and date).
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub location: Location,
    /// Set for time-series tables only.
    pub date: Option<NaiveDate>,
    pub values: Vec<Option<Reading>>,
}

/// Shape of the rows in a [`FlatTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableLayout {
    /// One row per location.
    Scalar,
    /// One row per location and date.
    TimeSeries,
}

/// An ordered collection of [`FlatRecord`]s sharing one set of field names.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatTable {
    pub(crate) layout: TableLayout,
    pub(crate) fields: Vec<String>,
    pub(crate) records: Vec<FlatRecord>,
}

impl FlatTable {
    pub(crate) fn new(layout: TableLayout, fields: Vec<String>, records: Vec<FlatRecord>) -> Self {
        Self {
            layout,
            fields,
            records,
        }
    }

    pub fn layout(&self) -> TableLayout {
        self.layout
    }

    /// Field (measure) names, in the order the values appear in each record.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn records(&self) -> &[FlatRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<FlatRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn field_index(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// The reading of `field` in row `row`, if both exist and the measure is present there.
    pub fn reading(&self, row: usize, field: &str) -> Option<&Reading> {
        let index = self.field_index(field)?;
        self.records.get(row)?.values.get(index)?.as_ref()
    }

    pub fn value(&self, row: usize, field: &str) -> Option<f64> {
        self.reading(row, field).and_then(|r| r.value)
    }

    /// Renames one field by name.
    ///
    /// # Errors
    ///
    /// [`FieldNameError::UnknownField`] if `from` is not a field of this table,
    /// [`FieldNameError::DuplicateField`] if `to` already names another field.
    pub fn rename_field(&mut self, from: &str, to: &str) -> Result<(), FieldNameError> {
        let index = self
            .field_index(from)
            .ok_or_else(|| FieldNameError::UnknownField(from.to_string()))?;
        if from != to && self.field_index(to).is_some() {
            return Err(FieldNameError::DuplicateField(to.to_string()));
        }
        self.fields[index] = to.to_string();
        Ok(())
    }
}
