use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, debug, info, span, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access was denied. Allow camera access for this app and try again")]
    PermissionDenied,

    #[error("No camera found. Connect a camera and try again")]
    NoDevice,

    #[error("Camera is in use by another application: {0}")]
    DeviceBusy(String),

    #[error("Camera does not support the requested format: {0}")]
    UnsupportedConstraints(String),

    #[error("Camera access requires a secure (https) origin")]
    InsecureContext,

    #[error("Camera stream failed: {0}")]
    Stream(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Prompt,
    Granted,
    Active,
    Denied,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    User,
    Environment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConstraints {
    pub facing: Facing,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<u32>,
    pub audio: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: Facing::User,
            width: Some(640),
            height: Some(480),
            fps: None,
            audio: false,
        }
    }
}

impl StreamConstraints {
    /// Same facing, no resolution or frame rate requirements.
    pub fn relaxed(&self) -> Self {
        Self {
            facing: self.facing,
            width: None,
            height: None,
            fps: None,
            audio: false,
        }
    }

    pub fn is_relaxed(&self) -> bool {
        self.width.is_none() && self.height.is_none() && self.fps.is_none()
    }
}

/// A source of camera streams.
pub trait CameraDevice {
    type Stream: VideoStream;

    fn request_access(&mut self) -> Result<(), CameraError>;
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Self::Stream, CameraError>;
}

pub trait VideoStream {
    fn frame(&mut self) -> Result<RgbaImage, CameraError>;
    /// Stops every track of the stream. Called at most once.
    fn stop(&mut self);
}

/// Owns at most one open stream and always stops it on teardown.
pub struct Camera<D: CameraDevice> {
    device: D,
    constraints: StreamConstraints,
    state: CameraState,
    stream: Option<D::Stream>,
}

impl<D: CameraDevice> Camera<D> {
    pub fn new(device: D, constraints: StreamConstraints) -> Self {
        Self {
            device,
            constraints,
            state: CameraState::Prompt,
            stream: None,
        }
    }

    pub fn state(&self) -> CameraState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == CameraState::Active
    }

    pub fn start(&mut self) -> Result<(), CameraError> {
        let span = span!(Level::DEBUG, "camera_start");
        let _guard = span.enter();

        match self.state {
            CameraState::Active => {
                debug!("Camera already active, reusing stream");
                return Ok(());
            }
            CameraState::Denied => return Err(CameraError::PermissionDenied),
            CameraState::Prompt | CameraState::Stopped => {
                if let Err(e) = self.device.request_access() {
                    if e == CameraError::PermissionDenied {
                        self.state = CameraState::Denied;
                    }
                    return Err(e);
                }
                self.state = CameraState::Granted;
            }
            CameraState::Granted => {}
        }

        let stream = match self.device.open(&self.constraints) {
            Err(CameraError::UnsupportedConstraints(reason)) if !self.constraints.is_relaxed() => {
                warn!("Requested format unsupported ({reason}), retrying with relaxed constraints");
                self.device.open(&self.constraints.relaxed())
            }
            other => other,
        };

        match stream {
            Ok(stream) => {
                info!("Camera stream opened");
                self.stream = Some(stream);
                self.state = CameraState::Active;
                Ok(())
            }
            Err(e) => {
                if e == CameraError::PermissionDenied {
                    self.state = CameraState::Denied;
                }
                Err(e)
            }
        }
    }

    pub fn frame(&mut self) -> Result<RgbaImage, CameraError> {
        match self.stream.as_mut() {
            Some(stream) => stream.frame(),
            None => Err(CameraError::Stream("camera is not active".into())),
        }
    }

    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            debug!("Stopping camera stream");
            stream.stop();
        }
        if self.state == CameraState::Active {
            self.state = CameraState::Stopped;
        }
    }
}

impl<D: CameraDevice> Drop for Camera<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
