//! Renderer-independent state shared by the window runner and the app:
//! the fly camera, the frame clock and the tracked-key set.

pub mod camera;
pub mod input;
pub mod time;

pub use camera::{Camera, FlyController};
pub use input::{KeySet, TrackedKey};
pub use time::Time;
