pub mod codec;
pub mod drawing;
pub mod editor;
pub mod event;
pub mod geometry;
pub mod normalize;
pub mod shape;
pub mod surface;

pub use codec::*;
pub use drawing::*;
pub use editor::*;
pub use event::*;
pub use geometry::*;
pub use normalize::*;
pub use shape::*;
pub use surface::*;
