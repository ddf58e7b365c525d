use std::str::FromStr;

use foundation::LatLng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::geometry::GeometryError;
use crate::normalize::NormalizeError;

/// Drawing tool selected when a gesture starts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum ShapeKind {
    Polygon,
    Rectangle,
    Circle,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Circle => "circle",
        }
    }
}

impl std::fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShapeKind {
    type Err = NormalizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "polygon" => Ok(ShapeKind::Polygon),
            "rectangle" => Ok(ShapeKind::Rectangle),
            "circle" => Ok(ShapeKind::Circle),
            other => Err(NormalizeError::UnsupportedShape(other.to_string())),
        }
    }
}

impl TryFrom<String> for ShapeKind {
    type Error = NormalizeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A completed gesture as reported by the map surface. Coordinates are in
/// display order; circle radius is in meters.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawnShape {
    Polygon { vertices: Vec<LatLng> },
    Rectangle { corner1: LatLng, corner2: LatLng },
    Circle { center: LatLng, radius_m: f64 },
}

// Mirror of `DrawnShape` used only once the `type` tag is known to be supported.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ShapeRepr {
    Polygon { vertices: Vec<LatLng> },
    Rectangle { corner1: LatLng, corner2: LatLng },
    Circle { center: LatLng, radius_m: f64 },
}

impl DrawnShape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            DrawnShape::Polygon { .. } => ShapeKind::Polygon,
            DrawnShape::Rectangle { .. } => ShapeKind::Rectangle,
            DrawnShape::Circle { .. } => ShapeKind::Circle,
        }
    }

    /// Parses a shape description such as
    /// `{"type": "circle", "center": {"lat": 16.5, "lng": 80.5}, "radius_m": 120}`.
    pub fn from_json_value(value: &Value) -> Result<Self, NormalizeError> {
        let ty = value
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| malformed("shape missing type"))?;
        ty.parse::<ShapeKind>()?;

        let repr: ShapeRepr =
            serde_json::from_value(value.clone()).map_err(|e| malformed(&e.to_string()))?;
        Ok(match repr {
            ShapeRepr::Polygon { vertices } => DrawnShape::Polygon { vertices },
            ShapeRepr::Rectangle { corner1, corner2 } => DrawnShape::Rectangle { corner1, corner2 },
            ShapeRepr::Circle { center, radius_m } => DrawnShape::Circle { center, radius_m },
        })
    }

    pub fn from_json_str(payload: &str) -> Result<Self, NormalizeError> {
        let value: Value = serde_json::from_str(payload)
            .map_err(|e| malformed(&format!("JSON parse error: {e}")))?;
        Self::from_json_value(&value)
    }
}

impl<'de> Deserialize<'de> for DrawnShape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        DrawnShape::from_json_value(&value).map_err(serde::de::Error::custom)
    }
}

fn malformed(msg: &str) -> NormalizeError {
    NormalizeError::InvalidGeometry(GeometryError::Malformed(msg.to_string()))
}
