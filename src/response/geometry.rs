//! Parsing and validation of the `location { centroid shape }` sub-selection.
//!
//! Centroids arrive as a bare `[x, y]` pair or a GeoJSON `Point`; shapes as a
//! GeoJSON `Polygon`/`MultiPolygon` object (possibly JSON-encoded in a string)
//! or as bare ring arrays. Anything else is rejected with a reason string that
//! the caller attaches to the offending measure and index.

use crate::types::location::Location;
use geo_types::{Coord, Geometry, LineString, MultiPolygon, Point, Polygon};
use serde_json::Value;

type Position = Vec<f64>;
type Ring = Vec<Position>;
type Rings = Vec<Ring>;

pub(crate) fn parse_location(value: &Value) -> Result<Location, String> {
    let object = value
        .as_object()
        .ok_or_else(|| format!("location must be an object, found {}", json_kind(value)))?;

    let centroid = object
        .get("centroid")
        .filter(|v| !v.is_null())
        .map(parse_centroid)
        .transpose()?;
    let shape = object
        .get("shape")
        .filter(|v| !v.is_null())
        .map(parse_shape)
        .transpose()?;

    Location::new(centroid, shape).ok_or_else(|| "location has neither centroid nor shape".to_string())
}

fn parse_centroid(value: &Value) -> Result<Point<f64>, String> {
    match value {
        Value::Array(_) => {
            let position: Position = serde_json::from_value(value.clone())
                .map_err(|_| "centroid must be an array of numbers".to_string())?;
            Ok(Point::from(coord(&position)?))
        }
        Value::String(text) => {
            let decoded: Value = serde_json::from_str(text)
                .map_err(|e| format!("centroid string is not JSON: {e}"))?;
            parse_centroid(&decoded)
        }
        Value::Object(_) => match geojson_value(value)? {
            geojson::Value::Point(position) => Ok(Point::from(coord(&position)?)),
            other => Err(format!("centroid must be a Point, found {}", geojson_kind(&other))),
        },
        other => Err(format!("centroid must be a coordinate pair, found {}", json_kind(other))),
    }
}

fn parse_shape(value: &Value) -> Result<Geometry<f64>, String> {
    match value {
        Value::Array(_) => {
            if let Ok(rings) = serde_json::from_value::<Rings>(value.clone()) {
                return polygon(&rings).map(Geometry::Polygon);
            }
            let polygons: Vec<Rings> = serde_json::from_value(value.clone())
                .map_err(|_| "shape array is neither polygon nor multipolygon coordinates".to_string())?;
            multi_polygon(&polygons).map(Geometry::MultiPolygon)
        }
        Value::String(text) => {
            let decoded: Value = serde_json::from_str(text)
                .map_err(|e| format!("shape string is not JSON: {e}"))?;
            parse_shape(&decoded)
        }
        Value::Object(_) => match geojson_value(value)? {
            geojson::Value::Polygon(rings) => polygon(&rings).map(Geometry::Polygon),
            geojson::Value::MultiPolygon(polygons) => {
                multi_polygon(&polygons).map(Geometry::MultiPolygon)
            }
            other => Err(format!(
                "shape must be a Polygon or MultiPolygon, found {}",
                geojson_kind(&other)
            )),
        },
        other => Err(format!("shape must be a geometry, found {}", json_kind(other))),
    }
}

fn geojson_value(value: &Value) -> Result<geojson::Value, String> {
    geojson::Geometry::from_json_value(value.clone())
        .map(|geometry| geometry.value)
        .map_err(|e| format!("invalid GeoJSON geometry: {e}"))
}

fn coord(position: &[f64]) -> Result<Coord<f64>, String> {
    match position {
        [x, y] | [x, y, _] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        [_, _] | [_, _, _] => Err("coordinate is not finite".to_string()),
        other => Err(format!(
            "expected a coordinate pair, found {} values",
            other.len()
        )),
    }
}

fn ring(positions: &[Position]) -> Result<LineString<f64>, String> {
    if positions.len() < 4 {
        return Err(format!(
            "ring has {} positions, at least 4 are required",
            positions.len()
        ));
    }
    let coords = positions
        .iter()
        .map(|p| coord(p))
        .collect::<Result<Vec<_>, _>>()?;
    if coords.first() != coords.last() {
        return Err("ring is not closed".to_string());
    }
    Ok(LineString::from(coords))
}

fn polygon(rings: &[Ring]) -> Result<Polygon<f64>, String> {
    let (exterior, interiors) = rings
        .split_first()
        .ok_or_else(|| "polygon has no rings".to_string())?;
    let interiors = interiors
        .iter()
        .map(|r| ring(r))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Polygon::new(ring(exterior)?, interiors))
}

fn multi_polygon(polygons: &[Rings]) -> Result<MultiPolygon<f64>, String> {
    if polygons.is_empty() {
        return Err("multipolygon has no polygons".to_string());
    }
    polygons
        .iter()
        .map(|rings| polygon(rings))
        .collect::<Result<Vec<_>, _>>()
        .map(MultiPolygon)
}

fn geojson_kind(value: &geojson::Value) -> &'static str {
    match value {
        geojson::Value::Point(_) => "Point",
        geojson::Value::MultiPoint(_) => "MultiPoint",
        geojson::Value::LineString(_) => "LineString",
        geojson::Value::MultiLineString(_) => "MultiLineString",
        geojson::Value::Polygon(_) => "Polygon",
        geojson::Value::MultiPolygon(_) => "MultiPolygon",
        geojson::Value::GeometryCollection(_) => "GeometryCollection",
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
