use serde::{Deserialize, Serialize};

use crate::shape::{DrawnShape, ShapeKind};

/// Events a map surface emits while the user draws.
///
/// Serializable so sessions can be scripted and replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EditorEvent {
    DrawStart { shape: ShapeKind },
    ShapeCreated { shape: DrawnShape },
    ShapeEdited { shape: DrawnShape },
    ShapeDeleted,
    DrawCancelled,
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::DrawStart { .. } => "draw_start",
            EditorEvent::ShapeCreated { .. } => "shape_created",
            EditorEvent::ShapeEdited { .. } => "shape_edited",
            EditorEvent::ShapeDeleted => "shape_deleted",
            EditorEvent::DrawCancelled => "draw_cancelled",
        }
    }
}

/// Parses a JSON array of events.
pub fn parse_script(payload: &str) -> Result<Vec<EditorEvent>, serde_json::Error> {
    serde_json::from_str(payload)
}
