use std::cell::RefCell;
use std::rc::Rc;

use foundation::{GeoBounds, LatLng};

/// Capability the editor needs from a map rendering library.
///
/// Adapters translate the library's own draw events into
/// [`crate::EditorEvent`]s and feed them to [`crate::BoundaryEditor::handle`].
pub trait MapSurface {
    /// Start delivering draw/edit/delete events to the editor.
    fn subscribe(&mut self) -> Result<(), SurfaceError>;
    fn unsubscribe(&mut self);
    fn render(&mut self, center: LatLng, zoom: u8) -> Result<(), SurfaceError>;
    /// Adds `ring` (display order) as the resident, editable shape.
    fn install_shape(&mut self, ring: &[LatLng]) -> Result<(), SurfaceError>;
    fn fit_to_bounds(&mut self, bounds: GeoBounds);
    fn clear_shapes(&mut self);
    /// Drops every layer and handle acquired from the library.
    fn release(&mut self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    Unavailable(String),
    Rejected(String),
}

impl std::fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SurfaceError::Unavailable(msg) => write!(f, "map surface unavailable: {msg}"),
            SurfaceError::Rejected(msg) => write!(f, "map surface rejected request: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    Subscribe,
    Unsubscribe,
    Render { center: LatLng, zoom: u8 },
    Install(Vec<LatLng>),
    FitToBounds(GeoBounds),
    ClearShapes,
    Release,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FailPoint {
    Subscribe,
    Render,
    Install,
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: Vec<SurfaceCall>,
    resident: Vec<Vec<LatLng>>,
    subscribed: bool,
    released: bool,
    fail_at: Option<FailPoint>,
}

/// Headless surface that records every call.
///
/// Clones share state, so a handle kept outside the editor still observes the
/// surface after the editor is dropped.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    state: Rc<RefCell<RecordingState>>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the given operation fail from now on.
    pub fn fail_at(&self, point: FailPoint) {
        self.state.borrow_mut().fail_at = Some(point);
    }

    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.state.borrow().calls.clone()
    }

    pub fn resident_shapes(&self) -> Vec<Vec<LatLng>> {
        self.state.borrow().resident.clone()
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.borrow().subscribed
    }

    pub fn is_released(&self) -> bool {
        self.state.borrow().released
    }

    fn check(&self, point: FailPoint) -> Result<(), SurfaceError> {
        if self.state.borrow().fail_at == Some(point) {
            return Err(SurfaceError::Unavailable(format!("{point:?} failed")));
        }
        Ok(())
    }

    fn record(&self, call: SurfaceCall) {
        self.state.borrow_mut().calls.push(call);
    }
}

impl MapSurface for RecordingSurface {
    fn subscribe(&mut self) -> Result<(), SurfaceError> {
        self.check(FailPoint::Subscribe)?;
        self.record(SurfaceCall::Subscribe);
        self.state.borrow_mut().subscribed = true;
        Ok(())
    }

    fn unsubscribe(&mut self) {
        self.record(SurfaceCall::Unsubscribe);
        self.state.borrow_mut().subscribed = false;
    }

    fn render(&mut self, center: LatLng, zoom: u8) -> Result<(), SurfaceError> {
        self.check(FailPoint::Render)?;
        self.record(SurfaceCall::Render { center, zoom });
        Ok(())
    }

    fn install_shape(&mut self, ring: &[LatLng]) -> Result<(), SurfaceError> {
        self.check(FailPoint::Install)?;
        self.record(SurfaceCall::Install(ring.to_vec()));
        self.state.borrow_mut().resident.push(ring.to_vec());
        Ok(())
    }

    fn fit_to_bounds(&mut self, bounds: GeoBounds) {
        self.record(SurfaceCall::FitToBounds(bounds));
    }

    fn clear_shapes(&mut self) {
        self.record(SurfaceCall::ClearShapes);
        self.state.borrow_mut().resident.clear();
    }

    fn release(&mut self) {
        self.record(SurfaceCall::Release);
        let mut state = self.state.borrow_mut();
        state.resident.clear();
        state.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::{FailPoint, MapSurface, RecordingSurface, SurfaceCall};
    use foundation::LatLng;

    #[test]
    fn clones_share_state() {
        let observer = RecordingSurface::new();
        let mut surface = observer.clone();
        surface.subscribe().expect("subscribe");
        surface
            .install_shape(&[LatLng::new(1.0, 2.0)])
            .expect("install");
        assert!(observer.is_subscribed());
        assert_eq!(observer.resident_shapes().len(), 1);

        surface.clear_shapes();
        assert!(observer.resident_shapes().is_empty());
        assert_eq!(
            observer.calls(),
            vec![
                SurfaceCall::Subscribe,
                SurfaceCall::Install(vec![LatLng::new(1.0, 2.0)]),
                SurfaceCall::ClearShapes,
            ]
        );
    }

    #[test]
    fn injected_failure() {
        let mut surface = RecordingSurface::new();
        surface.fail_at(FailPoint::Render);
        assert!(surface.render(LatLng::new(0.0, 0.0), 3).is_err());
        assert!(surface.calls().is_empty());
    }
}
