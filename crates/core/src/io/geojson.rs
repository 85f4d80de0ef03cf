//! GeoJSON feature collections
//!
//! Reads and writes RFC 7946 FeatureCollections with the legacy named
//! `crs` member, which is how projected stand layers are usually shipped.
//! A file without a `crs` member is CRS84 unless the reader is told
//! otherwise through [`GeoJsonOptions::default_crs`].

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::{
    Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon,
};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Options for reading GeoJSON
#[derive(Debug, Clone, PartialEq)]
pub struct GeoJsonOptions {
    /// CRS of a collection that has no `crs` member
    pub default_crs: CRS,
}

impl Default for GeoJsonOptions {
    fn default() -> Self {
        Self {
            default_crs: CRS::wgs84(),
        }
    }
}

/// Read a GeoJSON FeatureCollection from a file
pub fn read_geojson<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    read_geojson_with_options(path, &GeoJsonOptions::default())
}

/// Read a GeoJSON FeatureCollection from a file, with a fallback CRS
pub fn read_geojson_with_options<P: AsRef<Path>>(
    path: P,
    options: &GeoJsonOptions,
) -> Result<FeatureCollection> {
    let text = fs::read_to_string(path.as_ref())?;
    read_geojson_from_str_with_options(&text, options)
}

/// Parse a GeoJSON FeatureCollection from a string
pub fn read_geojson_from_str(text: &str) -> Result<FeatureCollection> {
    read_geojson_from_str_with_options(text, &GeoJsonOptions::default())
}

/// Parse a GeoJSON FeatureCollection from a string, with a fallback CRS
pub fn read_geojson_from_str_with_options(
    text: &str,
    options: &GeoJsonOptions,
) -> Result<FeatureCollection> {
    let root: Value = serde_json::from_str(text)?;

    match root.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {}
        Some(other) => {
            return Err(Error::InvalidGeoJson(format!(
                "expected a FeatureCollection, found {}",
                other
            )))
        }
        None => return Err(Error::InvalidGeoJson("missing \"type\" member".into())),
    }

    let crs = match root.get("crs") {
        None | Some(Value::Null) => options.default_crs.clone(),
        Some(member) => parse_crs_member(member)?,
    };

    let features = root
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::InvalidGeoJson("missing \"features\" array".into()))?
        .iter()
        .enumerate()
        .map(|(i, f)| {
            parse_feature(f)
                .map_err(|e| Error::InvalidGeoJson(format!("feature {}: {}", i, e)))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection {
        features,
        crs: Some(crs),
    })
}

fn parse_crs_member(member: &Value) -> Result<CRS> {
    let name = member
        .get("properties")
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidGeoJson("crs member has no properties.name".into()))?;
    CRS::parse(name)
}

fn parse_feature(value: &Value) -> Result<Feature> {
    if value.get("type").and_then(Value::as_str) != Some("Feature") {
        return Err(Error::InvalidGeoJson("not a Feature".into()));
    }

    let geometry = match value.get("geometry") {
        None | Some(Value::Null) => None,
        Some(g) => Some(parse_geometry(g)?),
    };

    let mut properties = HashMap::new();
    if let Some(Value::Object(map)) = value.get("properties") {
        for (key, v) in map {
            properties.insert(key.clone(), attribute_from_json(v));
        }
    }

    let id = match value.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Ok(Feature {
        geometry,
        properties,
        id,
    })
}

fn attribute_from_json(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => AttributeValue::Int(i),
            None => n
                .as_f64()
                .map_or(AttributeValue::Null, AttributeValue::Float),
        },
        Value::String(s) => AttributeValue::String(s.clone()),
        // Nested values are kept as their JSON text
        other => AttributeValue::String(other.to_string()),
    }
}

fn attribute_to_json(value: &AttributeValue) -> Value {
    match value {
        AttributeValue::Null => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::Int(i) => json!(i),
        // serde_json has no NaN/inf; they become null
        AttributeValue::Float(v) => serde_json::Number::from_f64(*v).map_or(Value::Null, Value::Number),
        AttributeValue::String(s) => Value::String(s.clone()),
    }
}

fn coord(value: &Value) -> Result<Coord<f64>> {
    let arr = value
        .as_array()
        .ok_or_else(|| Error::InvalidGeoJson("position is not an array".into()))?;
    let x = arr.first().and_then(Value::as_f64);
    let y = arr.get(1).and_then(Value::as_f64);
    match (x, y) {
        (Some(x), Some(y)) => Ok(Coord { x, y }),
        _ => Err(Error::InvalidGeoJson("position needs two numbers".into())),
    }
}

fn coord_list(value: &Value) -> Result<Vec<Coord<f64>>> {
    value
        .as_array()
        .ok_or_else(|| Error::InvalidGeoJson("expected an array of positions".into()))?
        .iter()
        .map(coord)
        .collect()
}

fn nested<'a>(value: &'a Value, what: &str) -> Result<&'a Vec<Value>> {
    value
        .as_array()
        .ok_or_else(|| Error::InvalidGeoJson(format!("{} is not an array", what)))
}

fn polygon(value: &Value) -> Result<Polygon<f64>> {
    let mut rings = nested(value, "polygon")?
        .iter()
        .map(|r| coord_list(r).map(LineString::from))
        .collect::<Result<Vec<_>>>()?
        .into_iter();
    let exterior = rings
        .next()
        .ok_or_else(|| Error::InvalidGeoJson("polygon has no exterior ring".into()))?;
    Ok(Polygon::new(exterior, rings.collect()))
}

fn parse_geometry(value: &Value) -> Result<Geometry<f64>> {
    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidGeoJson("geometry without type".into()))?;

    if kind == "GeometryCollection" {
        return Err(Error::InvalidGeoJson(
            "GeometryCollection is not supported".into(),
        ));
    }

    let coords = value
        .get("coordinates")
        .ok_or_else(|| Error::InvalidGeoJson(format!("{} without coordinates", kind)))?;

    let geometry = match kind {
        "Point" => Geometry::Point(Point::from(coord(coords)?)),
        "LineString" => Geometry::LineString(LineString::from(coord_list(coords)?)),
        "Polygon" => Geometry::Polygon(polygon(coords)?),
        "MultiPoint" => Geometry::MultiPoint(MultiPoint::from(
            coord_list(coords)?
                .into_iter()
                .map(Point::from)
                .collect::<Vec<_>>(),
        )),
        "MultiLineString" => Geometry::MultiLineString(MultiLineString::new(
            nested(coords, "MultiLineString")?
                .iter()
                .map(|l| coord_list(l).map(LineString::from))
                .collect::<Result<Vec<_>>>()?,
        )),
        "MultiPolygon" => Geometry::MultiPolygon(MultiPolygon::new(
            nested(coords, "MultiPolygon")?
                .iter()
                .map(polygon)
                .collect::<Result<Vec<_>>>()?,
        )),
        other => {
            return Err(Error::InvalidGeoJson(format!(
                "unknown geometry type {}",
                other
            )))
        }
    };

    Ok(geometry)
}

fn position(c: &Coord<f64>) -> Value {
    json!([c.x, c.y])
}

fn line_json(line: &LineString<f64>) -> Value {
    Value::Array(line.0.iter().map(position).collect())
}

fn polygon_json(poly: &Polygon<f64>) -> Value {
    let mut rings = vec![line_json(poly.exterior())];
    rings.extend(poly.interiors().iter().map(line_json));
    Value::Array(rings)
}

fn geometry_to_json(geometry: &Geometry<f64>) -> Result<Value> {
    let (kind, coordinates) = match geometry {
        Geometry::Point(p) => ("Point", position(&p.0)),
        Geometry::LineString(l) => ("LineString", line_json(l)),
        Geometry::Polygon(p) => ("Polygon", polygon_json(p)),
        Geometry::MultiPoint(mp) => (
            "MultiPoint",
            Value::Array(mp.iter().map(|p| position(&p.0)).collect()),
        ),
        Geometry::MultiLineString(ml) => (
            "MultiLineString",
            Value::Array(ml.iter().map(line_json).collect()),
        ),
        Geometry::MultiPolygon(mp) => (
            "MultiPolygon",
            Value::Array(mp.iter().map(polygon_json).collect()),
        ),
        Geometry::Rect(r) => ("Polygon", polygon_json(&r.to_polygon())),
        Geometry::Triangle(t) => ("Polygon", polygon_json(&t.to_polygon())),
        Geometry::Line(l) => (
            "LineString",
            json!([[l.start.x, l.start.y], [l.end.x, l.end.y]]),
        ),
        Geometry::GeometryCollection(_) => {
            return Err(Error::InvalidGeoJson(
                "GeometryCollection is not supported".into(),
            ))
        }
    };
    Ok(json!({ "type": kind, "coordinates": coordinates }))
}

fn feature_to_json(feature: &Feature) -> Result<Value> {
    let mut properties = Map::new();
    // Sorted keys keep the output stable between runs
    let mut keys: Vec<&String> = feature.properties.keys().collect();
    keys.sort();
    for key in keys {
        properties.insert(key.clone(), attribute_to_json(&feature.properties[key]));
    }

    let mut obj = Map::new();
    obj.insert("type".into(), json!("Feature"));
    if let Some(id) = &feature.id {
        obj.insert("id".into(), json!(id));
    }
    obj.insert(
        "geometry".into(),
        match &feature.geometry {
            Some(g) => geometry_to_json(g)?,
            None => Value::Null,
        },
    );
    obj.insert("properties".into(), Value::Object(properties));
    Ok(Value::Object(obj))
}

/// Serialize a FeatureCollection to a GeoJSON string
pub fn write_geojson_to_string(collection: &FeatureCollection) -> Result<String> {
    let features = collection
        .iter()
        .map(feature_to_json)
        .collect::<Result<Vec<_>>>()?;

    let mut root = Map::new();
    root.insert("type".into(), json!("FeatureCollection"));
    if let Some(urn) = collection.crs.as_ref().and_then(|c| c.urn()) {
        root.insert(
            "crs".into(),
            json!({ "type": "name", "properties": { "name": urn } }),
        );
    }
    root.insert("features".into(), Value::Array(features));

    Ok(serde_json::to_string_pretty(&Value::Object(root))?)
}

/// Write a FeatureCollection to a GeoJSON file
pub fn write_geojson<P: AsRef<Path>>(collection: &FeatureCollection, path: P) -> Result<()> {
    let text = write_geojson_to_string(collection)?;
    fs::write(path.as_ref(), text)?;
    Ok(())
}
