//! Locations carried by measures and flattened records.
//!
//! A [`Location`] holds the centroid of a grid cell, its shape, or both. The
//! [`LocationKey`] derived from it is the identity used to line up values from
//! different measures, check co-registration and resolve geometry fragments.

use geo_types::{Coord, Geometry, LineString, Point, Polygon};
use std::fmt;

/// Canonical text identity of a [`Location`].
///
/// Built from the centroid when one is present (`"x y"`), otherwise from the
/// WKT of the shape. Two locations with bit-identical coordinates share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocationKey(String);

impl LocationKey {
    pub(crate) fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LocationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The place a measure value applies to.
///
/// # Examples
///
/// ```
/// use geomeasures::Location;
/// use geo_types::Point;
///
/// let cell = Location::from_centroid(Point::new(-0.38, 51.81));
/// assert_eq!(cell.key().as_str(), "-0.38 51.81");
/// assert_eq!(cell.wkt(), "POINT (-0.38 51.81)");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    centroid: Option<Point<f64>>,
    shape: Option<Geometry<f64>>,
    key: LocationKey,
}

impl Location {
    /// A location known only by its representative point.
    pub fn from_centroid(centroid: Point<f64>) -> Self {
        Self {
            key: point_key(&centroid),
            centroid: Some(centroid),
            shape: None,
        }
    }

    /// A location known only by its outline.
    pub fn from_shape(shape: Geometry<f64>) -> Self {
        Self {
            key: LocationKey::new(to_wkt(&shape)),
            centroid: None,
            shape: Some(shape),
        }
    }

    /// Combines an optional centroid and shape. Returns `None` when both are absent.
    pub fn new(centroid: Option<Point<f64>>, shape: Option<Geometry<f64>>) -> Option<Self> {
        match (centroid, shape) {
            (Some(centroid), shape) => Some(Self {
                key: point_key(&centroid),
                centroid: Some(centroid),
                shape,
            }),
            (None, Some(shape)) => Some(Self::from_shape(shape)),
            (None, None) => None,
        }
    }

    pub fn centroid(&self) -> Option<&Point<f64>> {
        self.centroid.as_ref()
    }

    pub fn shape(&self) -> Option<&Geometry<f64>> {
        self.shape.as_ref()
    }

    pub fn key(&self) -> &LocationKey {
        &self.key
    }

    /// The geometry written out for this location: the shape if known, else the centroid.
    pub fn geometry(&self) -> Geometry<f64> {
        match (&self.shape, self.centroid) {
            (Some(shape), _) => shape.clone(),
            (None, Some(centroid)) => Geometry::Point(centroid),
            (None, None) => Geometry::GeometryCollection(Default::default()),
        }
    }

    /// Well-known text of [`Location::geometry`].
    pub fn wkt(&self) -> String {
        match (&self.shape, &self.centroid) {
            (Some(shape), _) => to_wkt(shape),
            (None, Some(centroid)) => to_wkt(&Geometry::Point(*centroid)),
            (None, None) => "GEOMETRYCOLLECTION EMPTY".to_string(),
        }
    }

    /// Replaces the shape. The key is left untouched so the location still
    /// matches records built before the shape was known.
    pub(crate) fn with_shape(mut self, shape: Geometry<f64>) -> Self {
        self.shape = Some(shape);
        self
    }
}

fn point_key(point: &Point<f64>) -> LocationKey {
    LocationKey::new(format!("{} {}", point.x(), point.y()))
}

/// Renders a geometry as well-known text.
pub fn to_wkt(geometry: &Geometry<f64>) -> String {
    match geometry {
        Geometry::Point(p) => format!("POINT ({})", coord_text(&p.0)),
        Geometry::Line(l) => format!("LINESTRING ({}, {})", coord_text(&l.start), coord_text(&l.end)),
        Geometry::LineString(ls) => format!("LINESTRING {}", ring_text(ls)),
        Geometry::Polygon(p) => format!("POLYGON {}", polygon_text(p)),
        Geometry::MultiPoint(mp) => {
            let points: Vec<String> = mp.0.iter().map(|p| format!("({})", coord_text(&p.0))).collect();
            format!("MULTIPOINT ({})", points.join(", "))
        }
        Geometry::MultiLineString(mls) => {
            let lines: Vec<String> = mls.0.iter().map(ring_text).collect();
            format!("MULTILINESTRING ({})", lines.join(", "))
        }
        Geometry::MultiPolygon(mp) => {
            let polygons: Vec<String> = mp.0.iter().map(polygon_text).collect();
            format!("MULTIPOLYGON ({})", polygons.join(", "))
        }
        Geometry::GeometryCollection(gc) if gc.0.is_empty() => "GEOMETRYCOLLECTION EMPTY".to_string(),
        Geometry::GeometryCollection(gc) => {
            let members: Vec<String> = gc.0.iter().map(to_wkt).collect();
            format!("GEOMETRYCOLLECTION ({})", members.join(", "))
        }
        Geometry::Rect(r) => format!("POLYGON {}", polygon_text(&r.to_polygon())),
        Geometry::Triangle(t) => format!("POLYGON {}", polygon_text(&t.to_polygon())),
    }
}

fn coord_text(c: &Coord<f64>) -> String {
    format!("{} {}", c.x, c.y)
}

fn ring_text(ring: &LineString<f64>) -> String {
    let coords: Vec<String> = ring.0.iter().map(coord_text).collect();
    format!("({})", coords.join(", "))
}

fn polygon_text(polygon: &Polygon<f64>) -> String {
    let rings: Vec<String> = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(ring_text)
        .collect();
    format!("({})", rings.join(", "))
}
