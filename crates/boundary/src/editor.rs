//! Boundary editor controller: owns one editing session on one map surface.

use foundation::{FieldId, LatLng};
use tracing::{debug, info, warn};

use crate::codec::{self, DecodedBoundary};
use crate::drawing::{Commands, DrawingError, DrawingState, EditorSession, SurfaceCommand};
use crate::event::EditorEvent;
use crate::geometry::Geometry;
use crate::surface::{MapSurface, SurfaceError};

pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 16.5,
    lng: 80.5,
};
pub const DEFAULT_ZOOM: u8 = 13;
pub const MAX_ZOOM: u8 = 18;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EditorConfig {
    /// Where the view starts when there is no stored boundary.
    pub default_center: LatLng,
    pub default_zoom: u8,
    pub max_zoom: u8,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_center: DEFAULT_CENTER,
            default_zoom: DEFAULT_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

/// Rejection from the external persistence callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveFailure {
    pub reason: String,
}

impl SaveFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for SaveFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to save boundary: {}", self.reason)
    }
}

impl std::error::Error for SaveFailure {}

/// Persistence callback receiving the encoded boundary text.
pub trait SaveBoundary {
    fn save(&mut self, field_id: &FieldId, encoded: &str) -> Result<(), SaveFailure>;
}

impl<F> SaveBoundary for F
where
    F: FnMut(&FieldId, &str) -> Result<(), SaveFailure>,
{
    fn save(&mut self, field_id: &FieldId, encoded: &str) -> Result<(), SaveFailure> {
        self(field_id, encoded)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    NothingToSave,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditorError {
    Drawing(DrawingError),
    Surface(SurfaceError),
    Save(SaveFailure),
}

impl std::fmt::Display for EditorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EditorError::Drawing(e) => write!(f, "{e}"),
            EditorError::Surface(e) => write!(f, "{e}"),
            EditorError::Save(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for EditorError {}

impl From<DrawingError> for EditorError {
    fn from(e: DrawingError) -> Self {
        EditorError::Drawing(e)
    }
}

impl From<SurfaceError> for EditorError {
    fn from(e: SurfaceError) -> Self {
        EditorError::Surface(e)
    }
}

/// One editing session bound to a map surface.
///
/// Surface resources are released on drop, including when [`Self::mount`]
/// fails part way.
#[derive(Debug)]
pub struct BoundaryEditor<S: MapSurface> {
    surface: S,
    field_id: FieldId,
    session: EditorSession,
    subscribed: bool,
}

impl<S: MapSurface> BoundaryEditor<S> {
    pub fn mount(
        surface: S,
        field_id: FieldId,
        persisted: Option<&str>,
        config: &EditorConfig,
    ) -> Result<Self, EditorError> {
        let mut editor = Self {
            surface,
            field_id,
            session: EditorSession::new(),
            subscribed: false,
        };

        editor.surface.subscribe()?;
        editor.subscribed = true;

        let zoom = config.default_zoom.min(config.max_zoom);
        editor.surface.render(config.default_center, zoom)?;

        if let Some(DecodedBoundary { geometry, display }) = persisted.and_then(codec::decode) {
            let bounds = geometry.bounds();
            for ring in &display {
                editor.surface.install_shape(ring)?;
            }
            editor.surface.fit_to_bounds(bounds);
            editor.session.load(geometry);
            info!(field = %editor.field_id, "restored stored boundary");
        } else {
            debug!(field = %editor.field_id, "no stored boundary; ready to draw");
        }

        Ok(editor)
    }

    pub fn field_id(&self) -> &FieldId {
        &self.field_id
    }

    pub fn state(&self) -> DrawingState {
        self.session.state()
    }

    pub fn has_geometry(&self) -> bool {
        self.session.has_geometry()
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.session.geometry()
    }

    pub fn is_dirty(&self) -> bool {
        self.session.is_dirty()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Encoded text of the current boundary, if any.
    pub fn encoded(&self) -> Option<String> {
        self.session.geometry().map(codec::encode)
    }

    /// Applies one surface event. Rejected gestures restore the previous
    /// boundary on the surface before the error is returned.
    ///
    /// When the surface fails to apply a transition, the session goes back to
    /// the boundary it held before the event and the surface is asked to show
    /// it again. If that also fails the surface error is returned and the
    /// session keeps the earlier boundary, so a later save never writes a
    /// shape the user was not shown.
    pub fn handle(&mut self, event: &EditorEvent) -> Result<(), EditorError> {
        let before = self.session.clone();
        let result = match event {
            EditorEvent::DrawStart { shape } => self.session.start_draw(*shape),
            EditorEvent::ShapeCreated { shape } => self.session.shape_created(shape),
            EditorEvent::ShapeEdited { shape } => self.session.shape_edited(shape),
            EditorEvent::ShapeDeleted => self.session.shape_deleted(),
            EditorEvent::DrawCancelled => Ok(self.session.draw_cancelled()),
        };
        match result {
            Ok(commands) => match self.apply(commands) {
                Ok(()) => Ok(()),
                Err(err) => {
                    warn!(event = event.name(), error = %err, "surface failed; reverting boundary");
                    self.session.revert_to(&before);
                    let restore = self.session.restore_commands();
                    if let Err(again) = self.apply(restore) {
                        warn!(error = %again, "previous boundary could not be reinstalled");
                    }
                    Err(err)
                }
            },
            Err(err @ DrawingError::Rejected(_)) => {
                let restore = self.session.restore_commands();
                self.apply(restore)?;
                Err(err.into())
            }
            Err(err) => {
                debug!(event = event.name(), error = %err, "ignored event");
                Err(err.into())
            }
        }
    }

    /// Feeds events in order, collecting per-event failures instead of
    /// stopping at the first one.
    pub fn replay<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a EditorEvent>,
    ) -> Vec<(usize, EditorError)> {
        events
            .into_iter()
            .enumerate()
            .filter_map(|(index, event)| self.handle(event).err().map(|e| (index, e)))
            .collect()
    }

    /// Hands the encoded boundary to `sink`. On failure the geometry stays
    /// in place so the save can be retried.
    pub fn save(&mut self, sink: &mut impl SaveBoundary) -> Result<SaveOutcome, EditorError> {
        let Some(encoded) = self.encoded() else {
            return Ok(SaveOutcome::NothingToSave);
        };
        match sink.save(&self.field_id, &encoded) {
            Ok(()) => {
                self.session.mark_saved();
                info!(field = %self.field_id, "boundary saved");
                Ok(SaveOutcome::Saved)
            }
            Err(failure) => {
                warn!(field = %self.field_id, reason = %failure.reason, "boundary save failed");
                Err(EditorError::Save(failure))
            }
        }
    }

    fn apply(&mut self, commands: Commands) -> Result<(), EditorError> {
        for command in commands {
            match command {
                SurfaceCommand::ClearShapes => self.surface.clear_shapes(),
                SurfaceCommand::Install(geometry) => {
                    // Replace, never stack: one resident shape at most.
                    self.surface.clear_shapes();
                    self.surface.install_shape(&codec::to_display(&geometry))?;
                }
            }
        }
        Ok(())
    }

    fn teardown(&mut self) {
        if self.subscribed {
            self.surface.unsubscribe();
            self.subscribed = false;
        }
        self.surface.clear_shapes();
        self.surface.release();
    }
}

impl<S: MapSurface> Drop for BoundaryEditor<S> {
    fn drop(&mut self) {
        self.teardown();
    }
}
