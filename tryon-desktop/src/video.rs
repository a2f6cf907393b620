use anyhow::Result;
use image::{EncodableLayout, RgbaImage};
use tracing::{debug, error, warn};

use std::io::Write;
use std::process::{Command, Stdio};
use std::time::Duration;

use nokhwa::{
    Camera,
    nokhwa_initialize,
    pixel_format::RgbAFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType, Resolution},
};
use tryon_img::camera::{CameraDevice, CameraError, Facing, StreamConstraints, VideoStream};

const ACCESS_TIMEOUT: Duration = Duration::from_secs(30);

/// A native webcam. Picks `index` when given, otherwise the last camera found.
pub struct NokhwaDevice {
    index: Option<u32>,
}

impl NokhwaDevice {
    pub fn new(index: Option<u32>) -> Self {
        Self { index }
    }
}

impl CameraDevice for NokhwaDevice {
    type Stream = NokhwaStream;

    fn request_access(&mut self) -> Result<(), CameraError> {
        let (tx, rx) = flume::bounded(1);
        nokhwa_initialize(move |granted| {
            debug!("User said {}", granted);
            let _ = tx.send(granted);
        });

        match rx.recv_timeout(ACCESS_TIMEOUT) {
            Ok(true) => Ok(()),
            Ok(false) => Err(CameraError::PermissionDenied),
            Err(e) => {
                warn!("No answer to camera access prompt: {e}");
                Err(CameraError::PermissionDenied)
            }
        }
    }

    fn open(&mut self, constraints: &StreamConstraints) -> Result<NokhwaStream, CameraError> {
        if constraints.facing == Facing::Environment {
            debug!("Desktop cameras have no facing, using the selected device");
        }

        let cameras =
            query(ApiBackend::Auto).map_err(|e| CameraError::DeviceBusy(e.to_string()))?;
        cameras
            .iter()
            .for_each(|cam| debug!("Found camera: {:?}", cam));

        let info = match self.index {
            Some(i) => cameras
                .iter()
                .find(|cam| cam.index() == &CameraIndex::Index(i)),
            None => cameras.last(),
        }
        .ok_or(CameraError::NoDevice)?;

        let format = match (constraints.width, constraints.height) {
            (Some(w), Some(h)) => RequestedFormatType::HighestResolution(Resolution::new(w, h)),
            _ => RequestedFormatType::AbsoluteHighestFrameRate,
        };

        let mut camera = Camera::new(info.index().clone(), RequestedFormat::new::<RgbAFormat>(format))
            .map_err(|e| format_error(constraints, e))?;

        if let Some(fps) = constraints.fps {
            camera
                .set_frame_rate(fps)
                .map_err(|e| format_error(constraints, e))?;
        }

        camera
            .open_stream()
            .map_err(|e| CameraError::DeviceBusy(e.to_string()))?;
        debug!("Streaming at {}", camera.resolution());

        Ok(NokhwaStream { camera })
    }
}

/// A format the device rejects is only a constraint problem when we asked for something specific.
fn format_error(constraints: &StreamConstraints, e: nokhwa::NokhwaError) -> CameraError {
    if constraints.is_relaxed() {
        CameraError::DeviceBusy(e.to_string())
    } else {
        CameraError::UnsupportedConstraints(e.to_string())
    }
}

pub struct NokhwaStream {
    camera: Camera,
}

impl VideoStream for NokhwaStream {
    fn frame(&mut self) -> Result<RgbaImage, CameraError> {
        self.camera
            .frame()
            .and_then(|buf| buf.decode_image::<RgbAFormat>())
            .map_err(|e| CameraError::Stream(e.to_string()))
    }

    fn stop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            error!("Failed to stop camera stream {e:?}");
        }
    }
}

/// Raw rgba frames piped to ffplay, or to a v4l2 loopback device through ffmpeg.
pub struct OutputVideoStream {
    output_proc: std::process::Child,
    width: u32,
    height: u32,
}

impl Drop for OutputVideoStream {
    fn drop(&mut self) {
        if let Err(e) = self.output_proc.kill() {
            error!("Failed to stop output process {e:?}");
        }
    }
}

impl OutputVideoStream {
    pub fn new(width: u32, height: u32, device: Option<&str>) -> Result<Self> {
        let size = format!("{}x{}", width, height);
        let mut command = match device {
            Some(d) => {
                let mut command = Command::new("ffmpeg");
                command.args([
                    "-f",
                    "rawvideo",
                    "-pix_fmt",
                    "rgba",
                    "-s",
                    &size,
                    "-i",
                    "-",
                    "-map",
                    "0:v",
                    "-vf",
                    "format=yuv420p",
                    "-f",
                    "v4l2",
                    &format!("/dev/{d}"),
                ]);
                command
            }
            None => {
                let mut command = Command::new("ffplay");
                command.args([
                    "-f",
                    "rawvideo",
                    "-pixel_format",
                    "rgba",
                    "-video_size",
                    &size,
                    "-window_title",
                    "Try on",
                    "-fflags",
                    "nobuffer",
                    "-flags",
                    "low_delay",
                    "-",
                ]);
                command
            }
        };
        let output_proc = command
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()?;

        Ok(Self {
            output_proc,
            width,
            height,
        })
    }

    pub fn write_frame(&mut self, img: &RgbaImage) -> Result<()> {
        if img.dimensions() != (self.width, self.height) {
            warn!(
                "Dropping {}x{} frame on {}x{} output",
                img.width(),
                img.height(),
                self.width,
                self.height
            );
            return Ok(());
        }
        if let Some(stdin) = self.output_proc.stdin.as_mut() {
            stdin.write_all(img.as_bytes())?;
        }

        Ok(())
    }
}
