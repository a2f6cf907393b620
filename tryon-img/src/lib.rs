pub mod camera;
pub mod detector;
pub mod error;
pub mod keypoints;
pub mod placement;
pub mod render;
pub mod session;
pub mod shapes;
pub mod surface;

pub use error::{Result, TryOnError};
