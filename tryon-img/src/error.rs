use crate::camera::CameraError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TryOnError {
    #[error("Frame not ready: video reports {width}x{height}")]
    FrameNotReady { width: u32, height: u32 },

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error("Failed to encode capture: {0}")]
    Encode(#[from] image::ImageError),

    #[error("Session is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, TryOnError>;
