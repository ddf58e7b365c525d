//! Single-boundary drawing state machine.
//!
//! Transitions are synchronous and pure with respect to the map surface: each
//! returns the [`SurfaceCommand`]s the controller must apply. At most one
//! boundary is alive at a time; a new drawing replaces, never merges.

use tracing::{debug, warn};

use crate::geometry::Geometry;
use crate::normalize::{NormalizeError, normalize};
use crate::shape::{DrawnShape, ShapeKind};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DrawingState {
    #[default]
    Idle,
    Drawing(ShapeKind),
}

/// Side effect requested from the map surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCommand {
    ClearShapes,
    /// Replace whatever is resident with this geometry.
    Install(Geometry),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawingError {
    InvalidTransition {
        event: &'static str,
        state: DrawingState,
    },
    /// The gesture did not normalize; previous geometry is kept.
    Rejected(NormalizeError),
}

impl std::fmt::Display for DrawingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawingError::InvalidTransition { event, state } => {
                write!(f, "{event} is not valid while {state:?}")
            }
            DrawingError::Rejected(e) => write!(f, "shape rejected: {e}"),
        }
    }
}

impl std::error::Error for DrawingError {}

pub type Commands = Vec<SurfaceCommand>;

#[derive(Debug, Clone, Default)]
pub struct EditorSession {
    state: DrawingState,
    current: Option<Geometry>,
    dirty: bool,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DrawingState {
        self.state
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.state, DrawingState::Drawing(_))
    }

    pub fn has_geometry(&self) -> bool {
        self.current.is_some()
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.current.as_ref()
    }

    /// True when the geometry changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Installs a restored geometry; it starts clean.
    pub fn load(&mut self, geometry: Geometry) {
        self.current = Some(geometry);
        self.dirty = false;
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// Puts back the boundary and dirty flag held by `earlier`. The drawing
    /// state is left as is.
    pub fn revert_to(&mut self, earlier: &EditorSession) {
        self.current = earlier.current.clone();
        self.dirty = earlier.dirty;
    }

    pub fn start_draw(&mut self, kind: ShapeKind) -> Result<Commands, DrawingError> {
        self.expect_idle("start_draw")?;
        debug!(%kind, "drawing started");
        self.state = DrawingState::Drawing(kind);
        Ok(vec![SurfaceCommand::ClearShapes])
    }

    pub fn shape_created(&mut self, shape: &DrawnShape) -> Result<Commands, DrawingError> {
        let DrawingState::Drawing(kind) = self.state else {
            return Err(self.invalid("shape_created"));
        };
        self.state = DrawingState::Idle;
        if kind != shape.kind() {
            debug!(tool = %kind, shape = %shape.kind(), "created shape differs from selected tool");
        }

        match normalize(shape) {
            Ok(geometry) => {
                debug!(vertices = geometry.vertex_count(), "shape created");
                self.current = Some(geometry.clone());
                self.dirty = true;
                Ok(vec![SurfaceCommand::ClearShapes, SurfaceCommand::Install(geometry)])
            }
            Err(err) => {
                warn!(error = %err, "rejected drawn shape; keeping previous boundary");
                Err(DrawingError::Rejected(err))
            }
        }
    }

    pub fn shape_edited(&mut self, shape: &DrawnShape) -> Result<Commands, DrawingError> {
        self.expect_idle("shape_edited")?;
        if self.current.is_none() {
            return Err(self.invalid("shape_edited"));
        }
        match normalize(shape) {
            Ok(geometry) => {
                debug!(vertices = geometry.vertex_count(), "shape edited");
                self.current = Some(geometry);
                self.dirty = true;
                Ok(Vec::new())
            }
            Err(err) => {
                warn!(error = %err, "rejected edit; keeping previous boundary");
                Err(DrawingError::Rejected(err))
            }
        }
    }

    pub fn shape_deleted(&mut self) -> Result<Commands, DrawingError> {
        self.expect_idle("shape_deleted")?;
        if self.current.take().is_some() {
            debug!("shape deleted");
            self.dirty = true;
        }
        Ok(Vec::new())
    }

    /// Idempotent: a no-op while idle.
    pub fn draw_cancelled(&mut self) -> Commands {
        if !self.is_drawing() {
            return Vec::new();
        }
        debug!("drawing cancelled");
        self.state = DrawingState::Idle;
        self.restore_commands()
    }

    /// Commands that put the retained geometry back on the surface, used
    /// after a draw that ended without a new shape.
    pub fn restore_commands(&self) -> Commands {
        self.current
            .iter()
            .cloned()
            .map(SurfaceCommand::Install)
            .collect()
    }

    fn expect_idle(&self, event: &'static str) -> Result<(), DrawingError> {
        if self.is_drawing() {
            return Err(self.invalid(event));
        }
        Ok(())
    }

    fn invalid(&self, event: &'static str) -> DrawingError {
        DrawingError::InvalidTransition {
            event,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DrawingError, DrawingState, EditorSession, SurfaceCommand};
    use crate::normalize::normalize;
    use crate::shape::{DrawnShape, ShapeKind};
    use foundation::LatLng;
    use pretty_assertions::assert_eq;

    fn square(offset: f64) -> DrawnShape {
        DrawnShape::Polygon {
            vertices: vec![
                LatLng::new(16.0 + offset, 80.0),
                LatLng::new(16.0 + offset, 80.1),
                LatLng::new(16.1 + offset, 80.1),
                LatLng::new(16.1 + offset, 80.0),
            ],
        }
    }

    fn two_points() -> DrawnShape {
        DrawnShape::Polygon {
            vertices: vec![LatLng::new(16.0, 80.0), LatLng::new(16.0, 80.1)],
        }
    }

    #[test]
    fn draw_then_create_installs_geometry() {
        let mut s = EditorSession::new();
        assert_eq!(s.state(), DrawingState::Idle);
        assert_eq!(
            s.start_draw(ShapeKind::Polygon),
            Ok(vec![SurfaceCommand::ClearShapes])
        );
        assert_eq!(s.state(), DrawingState::Drawing(ShapeKind::Polygon));

        let cmds = s.shape_created(&square(0.0)).expect("created");
        let expected = normalize(&square(0.0)).expect("normalize");
        assert_eq!(
            cmds,
            vec![SurfaceCommand::ClearShapes, SurfaceCommand::Install(expected.clone())]
        );
        assert_eq!(s.state(), DrawingState::Idle);
        assert_eq!(s.geometry(), Some(&expected));
        assert!(s.is_dirty());
    }

    #[test]
    fn start_draw_while_drawing_is_rejected() {
        let mut s = EditorSession::new();
        s.start_draw(ShapeKind::Polygon).expect("start");
        let err = s.start_draw(ShapeKind::Rectangle).expect_err("second start");
        assert_eq!(
            err,
            DrawingError::InvalidTransition {
                event: "start_draw",
                state: DrawingState::Drawing(ShapeKind::Polygon),
            }
        );
        assert_eq!(s.state(), DrawingState::Drawing(ShapeKind::Polygon));
    }

    #[test]
    fn create_without_draw_is_rejected() {
        let mut s = EditorSession::new();
        assert!(matches!(
            s.shape_created(&square(0.0)),
            Err(DrawingError::InvalidTransition { .. })
        ));
        assert!(!s.has_geometry());
    }

    #[test]
    fn bad_gesture_keeps_previous_geometry() {
        let mut s = EditorSession::new();
        s.start_draw(ShapeKind::Polygon).expect("start");
        s.shape_created(&square(0.0)).expect("created");
        let before = s.geometry().cloned();
        s.mark_saved();

        s.start_draw(ShapeKind::Polygon).expect("start again");
        let err = s.shape_created(&two_points()).expect_err("two vertices");
        assert!(matches!(err, DrawingError::Rejected(_)));
        assert_eq!(s.state(), DrawingState::Idle);
        assert_eq!(s.geometry().cloned(), before);
        assert!(s.has_geometry());
        assert!(!s.is_dirty());
    }

    #[test]
    fn edit_replaces_and_bad_edit_preserves() {
        let mut s = EditorSession::new();
        assert!(s.shape_edited(&square(0.0)).is_err());

        s.start_draw(ShapeKind::Polygon).expect("start");
        s.shape_created(&square(0.0)).expect("created");
        s.shape_edited(&square(0.5)).expect("edited");
        assert_eq!(s.geometry(), Some(&normalize(&square(0.5)).expect("n")));

        assert!(s.shape_edited(&two_points()).is_err());
        assert_eq!(s.geometry(), Some(&normalize(&square(0.5)).expect("n")));
        assert_eq!(s.state(), DrawingState::Idle);
    }

    #[test]
    fn delete_clears_geometry() {
        let mut s = EditorSession::new();
        s.load(normalize(&square(0.0)).expect("n"));
        assert!(!s.is_dirty());
        s.shape_deleted().expect("deleted");
        assert!(!s.has_geometry());
        assert!(s.is_dirty());
        // Nothing resident: still fine.
        s.shape_deleted().expect("deleted again");

        s.start_draw(ShapeKind::Circle).expect("start");
        assert!(s.shape_deleted().is_err());
    }

    #[test]
    fn revert_restores_boundary_but_not_state() {
        let mut s = EditorSession::new();
        s.load(normalize(&square(0.0)).expect("n"));
        let earlier = s.clone();

        s.start_draw(ShapeKind::Polygon).expect("start");
        s.shape_created(&square(0.5)).expect("created");
        assert!(s.is_dirty());

        s.revert_to(&earlier);
        assert_eq!(s.geometry(), earlier.geometry());
        assert!(!s.is_dirty());
        assert_eq!(s.state(), DrawingState::Idle);
    }

    #[test]
    fn cancel_is_idempotent_and_restores() {
        let mut s = EditorSession::new();
        assert!(s.draw_cancelled().is_empty());

        let g = normalize(&square(0.0)).expect("n");
        s.load(g.clone());
        s.start_draw(ShapeKind::Rectangle).expect("start");
        assert_eq!(s.draw_cancelled(), vec![SurfaceCommand::Install(g.clone())]);
        assert_eq!(s.state(), DrawingState::Idle);
        assert_eq!(s.geometry(), Some(&g));
        assert!(s.draw_cancelled().is_empty());
    }
}
