//! Parsed measure instances as returned by a geospatial measures query.

use crate::types::location::Location;
use crate::types::record::Reading;
use chrono::NaiveDate;
use std::fmt;

/// Whether a measure carries a single value per location or a dated series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasureKind {
    Scalar,
    TimeSeries,
}

impl MeasureKind {
    /// Parses the wire `kind` tag, ignoring case.
    pub(crate) fn from_tag(tag: &str) -> Option<Self> {
        match tag.to_ascii_uppercase().as_str() {
            "SCALAR" => Some(MeasureKind::Scalar),
            "TIMESERIES" | "TIME_SERIES" => Some(MeasureKind::TimeSeries),
            _ => None,
        }
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureKind::Scalar => write!(f, "SCALAR"),
            MeasureKind::TimeSeries => write!(f, "TIMESERIES"),
        }
    }
}

/// One value of a scalar measure at one location.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarMeasure {
    pub unit: String,
    /// `None` when the API returned `null` for this location.
    pub value: Option<f64>,
    pub location: Location,
}

impl ScalarMeasure {
    pub(crate) fn reading(&self) -> Reading {
        Reading {
            value: self.value,
            unit: self.unit.clone(),
        }
    }
}

/// A dated value inside a time series.
#[derive(Debug, Clone, PartialEq)]
pub struct Datapoint {
    pub date: NaiveDate,
    pub value: Option<f64>,
    pub unit: String,
}

impl Datapoint {
    pub(crate) fn reading(&self) -> Reading {
        Reading {
            value: self.value,
            unit: self.unit.clone(),
        }
    }
}

/// A time series of one measure at one location. Datapoints keep source order.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesMeasure {
    pub unit: String,
    pub location: Location,
    pub datapoints: Vec<Datapoint>,
}

/// All instances returned for one measure name.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasureSeries {
    /// The API returned an empty list and gave no kind tag.
    Empty,
    Scalar(Vec<ScalarMeasure>),
    TimeSeries(Vec<TimeSeriesMeasure>),
}

impl MeasureSeries {
    pub fn kind(&self) -> Option<MeasureKind> {
        match self {
            MeasureSeries::Empty => None,
            MeasureSeries::Scalar(_) => Some(MeasureKind::Scalar),
            MeasureSeries::TimeSeries(_) => Some(MeasureKind::TimeSeries),
        }
    }

    /// Number of locations (instances) in the series.
    pub fn len(&self) -> usize {
        match self {
            MeasureSeries::Empty => 0,
            MeasureSeries::Scalar(instances) => instances.len(),
            MeasureSeries::TimeSeries(instances) => instances.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locations of every instance, in source order.
    pub fn locations(&self) -> Vec<&Location> {
        match self {
            MeasureSeries::Empty => Vec::new(),
            MeasureSeries::Scalar(instances) => instances.iter().map(|m| &m.location).collect(),
            MeasureSeries::TimeSeries(instances) => {
                instances.iter().map(|m| &m.location).collect()
            }
        }
    }
}
