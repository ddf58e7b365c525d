use std::fs;
use std::io::Read;
use std::path::Path;

use analysis::{AnalysisClient, AnalysisConfig, AnalysisResponse};
use boundary::{
    BoundaryEditor, DrawnShape, EditorConfig, RecordingSurface, SaveOutcome, normalize,
    parse_script,
};
use fields::{BoundaryWrite, BoundaryWriter, Field, FieldStore, JsonFileFieldStore};
use foundation::FieldId;
use serde_json::{Value, json};
use tracing::{info, warn};

/// `-` reads stdin, text starting with `{` or `[` is taken literally,
/// anything else is a file path.
pub fn read_input(arg: &str) -> Result<String, String> {
    let trimmed = arg.trim_start();
    if arg == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("read stdin: {e}"))?;
        return Ok(buf);
    }
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(arg.to_string());
    }
    fs::read_to_string(arg).map_err(|e| format!("read {arg}: {e}"))
}

/// Drawn shape JSON to persisted boundary text.
pub fn normalize_shape(payload: &str) -> Result<String, String> {
    let shape = DrawnShape::from_json_str(payload).map_err(|e| e.to_string())?;
    let geometry = normalize(&shape).map_err(|e| e.to_string())?;
    Ok(boundary::encode(&geometry))
}

/// Decodes persisted text and describes it.
pub fn inspect_boundary(text: &str) -> Result<Value, String> {
    let geometry = boundary::try_decode(text).map_err(|e| e.to_string())?;
    let bounds = geometry.bounds();
    Ok(json!({
        "vertices": geometry.vertex_count(),
        "display": boundary::to_display(&geometry),
        "bounds": {
            "south_west": bounds.south_west,
            "north_east": bounds.north_east,
        },
        "center": bounds.center(),
        "encoded": boundary::encode(&geometry),
    }))
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub field_id: FieldId,
    pub failures: Vec<(usize, String)>,
    pub saved: Option<SaveOutcome>,
    pub write: Option<BoundaryWrite>,
    pub encoded: Option<String>,
    pub resident_shapes: usize,
}

impl SessionReport {
    pub fn to_json(&self) -> Value {
        json!({
            "field_id": self.field_id,
            "failures": self
                .failures
                .iter()
                .map(|(index, error)| json!({"index": index, "error": error}))
                .collect::<Vec<_>>(),
            "saved": self.saved.map(|s| format!("{s:?}")),
            "write": self.write.map(|w| format!("{w:?}")),
            "coordinates": self.encoded,
            "resident_shapes": self.resident_shapes,
        })
    }
}

/// Mounts an editor for a stored field on a headless surface, replays
/// `script` and optionally saves the result back into the store.
pub fn run_session(
    store_path: &Path,
    field_id: &FieldId,
    script: &str,
    config: &EditorConfig,
    save: bool,
) -> Result<SessionReport, String> {
    let events = parse_script(script).map_err(|e| format!("event script: {e}"))?;
    let mut store = JsonFileFieldStore::open(store_path).map_err(|e| e.to_string())?;
    let field = store
        .get(field_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("field not found: {field_id}"))?;

    let surface = RecordingSurface::new();
    let mut editor = BoundaryEditor::mount(
        surface.clone(),
        field_id.clone(),
        field.coordinates.as_deref(),
        config,
    )
    .map_err(|e| e.to_string())?;

    let failures: Vec<(usize, String)> = editor
        .replay(&events)
        .into_iter()
        .map(|(index, err)| {
            warn!(index, error = %err, "event rejected");
            (index, err.to_string())
        })
        .collect();

    let mut saved = None;
    let mut write = None;
    if save {
        let mut writer = BoundaryWriter::new(&mut store);
        saved = Some(editor.save(&mut writer).map_err(|e| e.to_string())?);
        write = writer.last_write();
    }

    let report = SessionReport {
        field_id: field_id.clone(),
        failures,
        saved,
        write,
        encoded: editor.encoded(),
        resident_shapes: surface.resident_shapes().len(),
    };
    drop(editor);
    info!(events = events.len(), released = surface.is_released(), "session closed");
    Ok(report)
}

pub fn list_fields(store_path: &Path) -> Result<Vec<Field>, String> {
    let store = JsonFileFieldStore::open(store_path).map_err(|e| e.to_string())?;
    store.list().map_err(|e| e.to_string())
}

/// Upserts one field object or an array of them. Returns how many were written.
pub fn import_fields(store_path: &Path, payload: &str) -> Result<usize, String> {
    let value: Value = serde_json::from_str(payload).map_err(|e| format!("fields JSON: {e}"))?;
    let fields: Vec<Field> = match value {
        Value::Array(_) => serde_json::from_value(value),
        other => serde_json::from_value(other).map(|f| vec![f]),
    }
    .map_err(|e| format!("fields JSON: {e}"))?;

    let mut store = JsonFileFieldStore::open(store_path).map_err(|e| e.to_string())?;
    for field in &fields {
        if let Some(text) = field.coordinates.as_deref() {
            boundary::try_decode(text)
                .map_err(|e| format!("field {}: invalid coordinates: {e}", field.id))?;
        }
    }
    let count = fields.len();
    for field in fields {
        store.upsert(field).map_err(|e| e.to_string())?;
    }
    Ok(count)
}

pub fn remove_field(store_path: &Path, field_id: &FieldId) -> Result<bool, String> {
    let mut store = JsonFileFieldStore::open(store_path).map_err(|e| e.to_string())?;
    store.delete(field_id).map_err(|e| e.to_string())
}

pub async fn analyze_field(
    store_path: &Path,
    field_id: &FieldId,
    config: AnalysisConfig,
) -> Result<AnalysisResponse, String> {
    let store = JsonFileFieldStore::open(store_path).map_err(|e| e.to_string())?;
    let field = store
        .get(field_id)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("field not found: {field_id}"))?;
    let client = AnalysisClient::new(config).map_err(|e| e.to_string())?;
    client.analyze(&field).await.map_err(|e| e.to_string())
}

/// Latest analysis the backend stored for `field_id`, if any.
pub async fn recent_analysis(
    field_id: &FieldId,
    config: AnalysisConfig,
) -> Result<Option<AnalysisResponse>, String> {
    let client = AnalysisClient::new(config).map_err(|e| e.to_string())?;
    client.recent(field_id).await.map_err(|e| e.to_string())
}

pub fn summarize_analysis(resp: &AnalysisResponse) -> Value {
    json!({
        "field_id": resp.field_id,
        "analysis_date": resp.analysis_date,
        "profitability_score": resp.profitability_score,
        "high_productivity_pct": resp.classification.high_productivity(),
        "low_productivity_pct": resp.classification.low_productivity(),
        "dominant_class": resp.classification.dominant_class(),
        "mean_ndvi": resp.mean_ndvi(),
        "ndvi_trend": resp.ndvi_trend(),
        "top_crop": resp.crop_recommendations.first().map(|c| &c.crop),
    })
}
