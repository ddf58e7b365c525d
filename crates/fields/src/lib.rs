use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use boundary::{Geometry, SaveBoundary, SaveFailure};
use foundation::FieldId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn default_area_unit() -> String {
    "acres".to_string()
}

/// A registered field. Only `coordinates` matters to the boundary editor;
/// the rest is carried for the analysis request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub location: String,
    pub district: String,
    pub state: String,
    pub area: f64,
    #[serde(default = "default_area_unit")]
    pub area_unit: String,
    pub soil_type: String,
    pub water_source: String,
    pub crop_type: String,
    pub planting_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_harvest_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Persisted boundary text, `[[[lng, lat], ...]]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
}

impl Field {
    /// Stored boundary, if present and well formed.
    pub fn boundary(&self) -> Option<Geometry> {
        self.coordinates
            .as_deref()
            .and_then(|text| boundary::try_decode(text).ok())
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSnapshot {
    pub fields: BTreeMap<FieldId, Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStoreError {
    NotFound(FieldId),
    InvalidBoundary(String),
    Corrupt(String),
    Io(String),
}

impl std::fmt::Display for FieldStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldStoreError::NotFound(id) => write!(f, "field not found: {id}"),
            FieldStoreError::InvalidBoundary(msg) => write!(f, "invalid field boundary: {msg}"),
            FieldStoreError::Corrupt(msg) => write!(f, "field storage corrupt: {msg}"),
            FieldStoreError::Io(msg) => write!(f, "field storage error: {msg}"),
        }
    }
}

impl std::error::Error for FieldStoreError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoundaryWrite {
    Updated,
    /// The stored boundary already equals the written one.
    Unchanged,
}

pub trait FieldStore {
    fn list(&self) -> Result<Vec<Field>, FieldStoreError>;
    fn get(&self, id: &FieldId) -> Result<Option<Field>, FieldStoreError>;
    fn upsert(&mut self, field: Field) -> Result<(), FieldStoreError>;
    fn delete(&mut self, id: &FieldId) -> Result<bool, FieldStoreError>;

    /// Stores a boundary for an existing field. Text that does not decode is
    /// refused; rewriting an equal geometry is a no-op.
    fn save_boundary(
        &mut self,
        id: &FieldId,
        encoded: &str,
    ) -> Result<BoundaryWrite, FieldStoreError> {
        let geometry = boundary::try_decode(encoded)
            .map_err(|e| FieldStoreError::InvalidBoundary(e.to_string()))?;
        let mut field = self
            .get(id)?
            .ok_or_else(|| FieldStoreError::NotFound(id.clone()))?;

        if field.boundary().as_ref() == Some(&geometry) {
            debug!(field = %id, "boundary unchanged");
            return Ok(BoundaryWrite::Unchanged);
        }

        field.coordinates = Some(boundary::encode(&geometry));
        self.upsert(field)?;
        info!(field = %id, vertices = geometry.vertex_count(), "boundary stored");
        Ok(BoundaryWrite::Updated)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFieldStore {
    snapshot: FieldSnapshot,
}

impl InMemoryFieldStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FieldStore for InMemoryFieldStore {
    fn list(&self) -> Result<Vec<Field>, FieldStoreError> {
        Ok(self.snapshot.fields.values().cloned().collect())
    }

    fn get(&self, id: &FieldId) -> Result<Option<Field>, FieldStoreError> {
        Ok(self.snapshot.fields.get(id).cloned())
    }

    fn upsert(&mut self, field: Field) -> Result<(), FieldStoreError> {
        self.snapshot.fields.insert(field.id.clone(), field);
        Ok(())
    }

    fn delete(&mut self, id: &FieldId) -> Result<bool, FieldStoreError> {
        Ok(self.snapshot.fields.remove(id).is_some())
    }
}

/// Whole snapshot kept in one pretty-printed JSON file.
///
/// Writes go to a sibling temp file first and are renamed into place, so a
/// crash never leaves a half-written snapshot behind.
#[derive(Debug)]
pub struct JsonFileFieldStore {
    path: PathBuf,
    snapshot: FieldSnapshot,
}

impl JsonFileFieldStore {
    /// Opens `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FieldStoreError> {
        let path = path.as_ref().to_path_buf();
        let snapshot = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => FieldSnapshot::default(),
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| FieldStoreError::Corrupt(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => FieldSnapshot::default(),
            Err(e) => return Err(FieldStoreError::Io(format!("read {}: {e}", path.display()))),
        };
        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), FieldStoreError> {
        let payload = serde_json::to_string_pretty(&self.snapshot)
            .map_err(|e| FieldStoreError::Io(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| FieldStoreError::Io(format!("create {}: {e}", parent.display())))?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)
            .map_err(|e| FieldStoreError::Io(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| FieldStoreError::Io(format!("rename {}: {e}", self.path.display())))
    }
}

impl FieldStore for JsonFileFieldStore {
    fn list(&self) -> Result<Vec<Field>, FieldStoreError> {
        Ok(self.snapshot.fields.values().cloned().collect())
    }

    fn get(&self, id: &FieldId) -> Result<Option<Field>, FieldStoreError> {
        Ok(self.snapshot.fields.get(id).cloned())
    }

    fn upsert(&mut self, field: Field) -> Result<(), FieldStoreError> {
        let previous = self.snapshot.fields.insert(field.id.clone(), field.clone());
        if let Err(e) = self.persist() {
            // Keep memory consistent with disk.
            match previous {
                Some(prev) => self.snapshot.fields.insert(field.id.clone(), prev),
                None => self.snapshot.fields.remove(&field.id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn delete(&mut self, id: &FieldId) -> Result<bool, FieldStoreError> {
        let Some(removed) = self.snapshot.fields.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.persist() {
            self.snapshot.fields.insert(id.clone(), removed);
            return Err(e);
        }
        Ok(true)
    }
}

/// Adapts a [`FieldStore`] to the editor's save callback.
#[derive(Debug)]
pub struct BoundaryWriter<'a, F: FieldStore> {
    store: &'a mut F,
    last: Option<BoundaryWrite>,
}

impl<'a, F: FieldStore> BoundaryWriter<'a, F> {
    pub fn new(store: &'a mut F) -> Self {
        Self { store, last: None }
    }

    /// Result of the most recent successful write.
    pub fn last_write(&self) -> Option<BoundaryWrite> {
        self.last
    }
}

impl<F: FieldStore> SaveBoundary for BoundaryWriter<'_, F> {
    fn save(&mut self, field_id: &FieldId, encoded: &str) -> Result<(), SaveFailure> {
        let write = self
            .store
            .save_boundary(field_id, encoded)
            .map_err(|e| SaveFailure::new(e.to_string()))?;
        self.last = Some(write);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BoundaryWrite, BoundaryWriter, Field, FieldStore, FieldStoreError, InMemoryFieldStore,
        JsonFileFieldStore,
    };
    use boundary::{
        BoundaryEditor, DrawnShape, EditorConfig, EditorError, EditorEvent, RecordingSurface,
        SaveOutcome,
    };
    use foundation::{FieldId, LatLng};
    use pretty_assertions::assert_eq;

    const RING: &str = "[[[80.0,16.0],[80.1,16.0],[80.1,16.1],[80.0,16.0]]]";

    fn field(id: &str) -> Field {
        Field {
            id: FieldId::new(id),
            name: "North plot".to_string(),
            location: "Tenali".to_string(),
            district: "Guntur".to_string(),
            state: "Andhra Pradesh".to_string(),
            area: 4.5,
            area_unit: "acres".to_string(),
            soil_type: "Black Soil".to_string(),
            water_source: "Canal".to_string(),
            crop_type: "Rice".to_string(),
            planting_date: "2024-06-15".to_string(),
            expected_harvest_date: None,
            notes: None,
            coordinates: None,
        }
    }

    #[test]
    fn crud_round_trip() {
        let mut store = InMemoryFieldStore::new();
        store.upsert(field("b")).expect("upsert");
        store.upsert(field("a")).expect("upsert");
        let ids: Vec<String> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|f| f.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(store.delete(&FieldId::new("a")).expect("delete"));
        assert!(!store.delete(&FieldId::new("a")).expect("delete again"));
        assert_eq!(store.get(&FieldId::new("a")).expect("get"), None);
    }

    #[test]
    fn save_boundary_is_idempotent() {
        let mut store = InMemoryFieldStore::new();
        store.upsert(field("f")).expect("upsert");
        let id = FieldId::new("f");

        assert_eq!(store.save_boundary(&id, RING), Ok(BoundaryWrite::Updated));
        assert_eq!(store.save_boundary(&id, RING), Ok(BoundaryWrite::Unchanged));
        // Formatting differences do not count as a change.
        let spaced = "[[ [80.0, 16.0], [80.1, 16.0], [80.1, 16.1], [80.0, 16.0] ]]";
        assert_eq!(store.save_boundary(&id, spaced), Ok(BoundaryWrite::Unchanged));

        let stored = store.get(&id).expect("get").expect("present");
        assert_eq!(stored.coordinates.as_deref(), Some(RING));
    }

    #[test]
    fn save_boundary_refuses_bad_input() {
        let mut store = InMemoryFieldStore::new();
        store.upsert(field("f")).expect("upsert");
        assert!(matches!(
            store.save_boundary(&FieldId::new("f"), "not json"),
            Err(FieldStoreError::InvalidBoundary(_))
        ));
        assert_eq!(
            store.save_boundary(&FieldId::new("missing"), RING),
            Err(FieldStoreError::NotFound(FieldId::new("missing")))
        );
        assert_eq!(store.get(&FieldId::new("f")).expect("get").expect("f").coordinates, None);
    }

    #[test]
    fn editor_saves_through_writer_and_reloads() {
        let mut store = InMemoryFieldStore::new();
        store.upsert(field("f")).expect("upsert");
        let id = FieldId::new("f");

        let surface = RecordingSurface::new();
        let mut editor =
            BoundaryEditor::mount(surface.clone(), id.clone(), None, &EditorConfig::default())
                .expect("mount");
        let shape = DrawnShape::Polygon {
            vertices: vec![
                LatLng::new(16.0, 80.0),
                LatLng::new(16.0, 80.1),
                LatLng::new(16.1, 80.1),
            ],
        };
        let errors = editor.replay(&[
            EditorEvent::DrawStart { shape: shape.kind() },
            EditorEvent::ShapeCreated { shape },
        ]);
        assert!(errors.is_empty());

        let mut writer = BoundaryWriter::new(&mut store);
        assert_eq!(editor.save(&mut writer), Ok(SaveOutcome::Saved));
        assert_eq!(writer.last_write(), Some(BoundaryWrite::Updated));
        assert_eq!(editor.save(&mut writer), Ok(SaveOutcome::Saved));
        assert_eq!(writer.last_write(), Some(BoundaryWrite::Unchanged));
        drop(editor);

        let stored = store.get(&id).expect("get").expect("present");
        assert_eq!(stored.coordinates.as_deref(), Some(RING));

        let reopened = BoundaryEditor::mount(
            RecordingSurface::new(),
            id,
            stored.coordinates.as_deref(),
            &EditorConfig::default(),
        )
        .expect("mount");
        assert_eq!(reopened.geometry(), stored.boundary().as_ref());
    }

    #[test]
    fn writer_surfaces_store_errors_as_save_failures() {
        let mut store = InMemoryFieldStore::new();
        let mut editor = BoundaryEditor::mount(
            RecordingSurface::new(),
            FieldId::new("ghost"),
            Some(RING),
            &EditorConfig::default(),
        )
        .expect("mount");
        let mut writer = BoundaryWriter::new(&mut store);
        let err = editor.save(&mut writer).expect_err("field does not exist");
        assert!(matches!(err, EditorError::Save(_)));
        assert!(editor.has_geometry());
    }

    #[test]
    fn json_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fields.json");

        let mut store = JsonFileFieldStore::open(&path).expect("open empty");
        store.upsert(field("f")).expect("upsert");
        store
            .save_boundary(&FieldId::new("f"), RING)
            .expect("save boundary");
        assert!(!path.with_extension("json.tmp").exists());

        let reopened = JsonFileFieldStore::open(&path).expect("reopen");
        let f = reopened
            .get(&FieldId::new("f"))
            .expect("get")
            .expect("present");
        assert_eq!(f.coordinates.as_deref(), Some(RING));
        assert!(f.boundary().is_some());
    }

    #[test]
    fn json_file_store_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("data").join("nested").join("fields.json");

        let mut store = JsonFileFieldStore::open(&path).expect("open");
        store.upsert(field("f")).expect("upsert into fresh directory");
        assert!(path.exists());

        let reopened = JsonFileFieldStore::open(&path).expect("reopen");
        assert_eq!(reopened.list().expect("list").len(), 1);
    }

    #[test]
    fn full_precision_boundaries_survive_the_snapshot() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fields.json");
        let ring = "[[[-116.83361554809613,33.12345678901234],[-116.8311,33.1259],\
                    [-116.83015438723049,33.12798765432109],[-116.83361554809613,33.12345678901234]]]";
        let id = FieldId::new("f");

        let mut store = JsonFileFieldStore::open(&path).expect("open");
        store.upsert(field("f")).expect("upsert");
        assert_eq!(store.save_boundary(&id, ring), Ok(BoundaryWrite::Updated));
        assert_eq!(store.save_boundary(&id, ring), Ok(BoundaryWrite::Unchanged));

        let mut reopened = JsonFileFieldStore::open(&path).expect("reopen");
        let stored = reopened.get(&id).expect("get").expect("present");
        assert_eq!(stored.boundary(), boundary::decode(ring).map(|d| d.geometry));
        assert_eq!(reopened.save_boundary(&id, ring), Ok(BoundaryWrite::Unchanged));
    }

    #[test]
    fn json_file_store_reports_corruption() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("fields.json");
        std::fs::write(&path, "{ nope").expect("write");
        assert!(matches!(
            JsonFileFieldStore::open(&path),
            Err(FieldStoreError::Corrupt(_))
        ));
    }
}
