//! Defensive GeoJSON walking.
//!
//! The pipeline only guarantees that a document *parses* — not that its
//! geometry is well-formed. Everything here therefore works on
//! `serde_json::Value`, skips whatever it cannot interpret (with a log line,
//! never a panic), and lets a partially broken document still render the
//! features it does contain.

use serde_json::Value;
use tracing::debug;

/// Geographic bounding box accumulated over `[lng, lat]` positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bounds {
    /// An empty (invalid) box; extends to validity with the first position.
    pub fn empty() -> Self {
        Self {
            min_lng: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        }
    }

    pub fn extend(&mut self, lng: f64, lat: f64) {
        self.min_lng = self.min_lng.min(lng);
        self.max_lng = self.max_lng.max(lng);
        self.min_lat = self.min_lat.min(lat);
        self.max_lat = self.max_lat.max(lat);
    }

    /// A box is valid once at least one position has been folded in.
    pub fn is_valid(&self) -> bool {
        self.min_lng <= self.max_lng && self.min_lat <= self.max_lat
    }
}

/// Enumerate the features of a document.
///
/// A `FeatureCollection` yields its `features` array; a single `Feature`
/// yields itself; any other object (e.g. a bare geometry) is treated as one
/// pseudo-feature so it still renders.
pub fn features_of(doc: &Value) -> Vec<&Value> {
    match doc.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => doc
            .get("features")
            .and_then(Value::as_array)
            .map(|fs| fs.iter().collect())
            .unwrap_or_default(),
        _ => vec![doc],
    }
}

/// The geometry object of a feature (or the feature itself for bare
/// geometries).
pub fn geometry_of(feature: &Value) -> Option<&Value> {
    match feature.get("geometry") {
        Some(Value::Null) | None => {
            // bare geometry objects carry their own type/coordinates
            feature
                .get("coordinates")
                .or(feature.get("geometries"))
                .map(|_| feature)
        }
        Some(geom) => Some(geom),
    }
}

/// Combined bounding box over every position in the document.
///
/// Returns an invalid [`Bounds`] for an empty feature set — callers use that
/// to leave the viewport untouched.
pub fn compute_bounds(doc: &Value) -> Bounds {
    let mut bounds = Bounds::empty();
    for feature in features_of(doc) {
        if let Some(geometry) = geometry_of(feature) {
            extend_geometry(&mut bounds, geometry);
        }
    }
    bounds
}

fn extend_geometry(bounds: &mut Bounds, geometry: &Value) {
    let Some(kind) = geometry.get("type").and_then(Value::as_str) else {
        debug!("Skipping geometry without a type");
        return;
    };

    if kind == "GeometryCollection" {
        if let Some(members) = geometry.get("geometries").and_then(Value::as_array) {
            for member in members {
                extend_geometry(bounds, member);
            }
        }
        return;
    }

    let Some(coordinates) = geometry.get("coordinates") else {
        debug!("Skipping {kind} geometry without coordinates");
        return;
    };

    match kind {
        "Point" => extend_position(bounds, coordinates),
        "MultiPoint" | "LineString" => extend_position_array(bounds, coordinates, 1),
        "MultiLineString" | "Polygon" => extend_position_array(bounds, coordinates, 2),
        "MultiPolygon" => extend_position_array(bounds, coordinates, 3),
        other => debug!("Skipping unknown geometry type '{other}'"),
    }
}

fn extend_position_array(bounds: &mut Bounds, value: &Value, depth: u8) {
    let Some(items) = value.as_array() else {
        debug!("Skipping malformed coordinate nesting");
        return;
    };
    for item in items {
        if depth == 1 {
            extend_position(bounds, item);
        } else {
            extend_position_array(bounds, item, depth - 1);
        }
    }
}

fn extend_position(bounds: &mut Bounds, value: &Value) {
    let position = value
        .as_array()
        .filter(|p| p.len() >= 2)
        .and_then(|p| Some((p[0].as_f64()?, p[1].as_f64()?)));

    match position {
        Some((lng, lat)) if lng.is_finite() && lat.is_finite() => bounds.extend(lng, lat),
        _ => debug!("Skipping malformed position {value}"),
    }
}
