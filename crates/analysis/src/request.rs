use boundary::Geometry;
use fields::Field;
use foundation::FieldId;
use serde::{Deserialize, Serialize};

use crate::client::AnalysisError;

/// GeoJSON `Polygon` geometry object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonGeometry {
    #[serde(rename = "type")]
    pub kind: String,
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl PolygonGeometry {
    pub fn from_geometry(geometry: &Geometry) -> Self {
        Self {
            kind: "Polygon".to_string(),
            coordinates: geometry.to_positions(),
        }
    }
}

/// Body of `POST /api/analyze-field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub field_id: FieldId,
    pub field_name: String,
    pub coordinates: PolygonGeometry,
    pub soil_type: String,
    pub water_source: String,
    pub crop_type: String,
    pub location: String,
    pub district: String,
    pub state: String,
}

impl AnalysisRequest {
    /// Builds a request from a stored field. The boundary is re-validated so
    /// the backend never receives an open or degenerate ring.
    pub fn for_field(field: &Field) -> Result<Self, AnalysisError> {
        let text = field
            .coordinates
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| AnalysisError::MissingBoundary(field.id.clone()))?;
        let geometry =
            boundary::try_decode(text).map_err(|e| AnalysisError::InvalidBoundary(e.to_string()))?;

        Ok(Self {
            field_id: field.id.clone(),
            field_name: field.name.clone(),
            coordinates: PolygonGeometry::from_geometry(&geometry),
            soil_type: field.soil_type.clone(),
            water_source: field.water_source.clone(),
            crop_type: field.crop_type.clone(),
            location: field.location.clone(),
            district: field.district.clone(),
            state: field.state.clone(),
        })
    }
}
