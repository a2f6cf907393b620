use crate::camera::{Camera, CameraDevice, CameraError, CameraState, StreamConstraints};
use crate::detector::{DetectionWorker, LandmarkDetector, OverlayStatus};
use crate::error::{Result, TryOnError};
use crate::keypoints::FaceKeypoints;
use crate::placement::{OverlayGeometry, Placement, PlacementState, place};
use crate::render::GlassesRenderer;
use crate::surface::{Still, Surface};
use std::ops::ControlFlow;
use std::time::Duration;
use tracing::{Level, debug, error, span, trace, warn};
use web_time::Instant;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Time between ticks; ~10 Hz by default.
    pub interval: Duration,
    pub load_timeout: Duration,
    pub constraints: StreamConstraints,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            load_timeout: Duration::from_secs(10),
            constraints: StreamConstraints::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub state: PlacementState,
    pub geometry: Option<OverlayGeometry>,
    /// The detector was still busy with an earlier frame, so this one was not submitted.
    pub detection_skipped: bool,
}

/// A live try-on: owns the camera, the detector thread and the output surface.
pub struct TryOnSession<D: CameraDevice, S: Surface> {
    camera: Camera<D>,
    worker: Option<DetectionWorker>,
    overlay: OverlayStatus,
    renderer: GlassesRenderer,
    surface: S,
    faces: Vec<FaceKeypoints>,
    state: PlacementState,
    interval: Duration,
    closed: bool,
}

impl<D: CameraDevice, S: Surface> TryOnSession<D, S> {
    /// Acquires the camera, then loads the detector. Camera failures are
    /// returned; detector failures leave the session in placeholder mode.
    pub fn open<L, T>(
        device: D,
        surface: S,
        loader: L,
        renderer: GlassesRenderer,
        config: SessionConfig,
    ) -> Result<Self>
    where
        L: FnOnce() -> anyhow::Result<T> + Send + 'static,
        T: LandmarkDetector + 'static,
    {
        let span = span!(Level::INFO, "session_open");
        let _guard = span.enter();

        let mut camera = Camera::new(device, config.constraints.clone());
        camera.start()?;

        let (worker, overlay) = DetectionWorker::spawn(loader, config.load_timeout);

        Ok(Self {
            camera,
            worker,
            overlay,
            renderer,
            surface,
            faces: Vec::new(),
            state: PlacementState::NotPlaced,
            interval: config.interval,
            closed: false,
        })
    }

    pub fn overlay_status(&self) -> &OverlayStatus {
        &self.overlay
    }

    pub fn camera_state(&self) -> CameraState {
        self.camera.state()
    }

    pub fn placement_state(&self) -> PlacementState {
        self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// One polling step: newest frame, newest landmarks, fresh draw.
    pub fn tick(&mut self) -> Result<TickReport> {
        if self.closed {
            return Err(TryOnError::Closed);
        }
        let span = span!(Level::DEBUG, "tick");
        let _guard = span.enter();

        let frame = self.camera.frame()?;
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Err(TryOnError::FrameNotReady { width, height });
        }

        self.fall_back_if_worker_stopped();

        let Some(worker) = self.worker.as_mut() else {
            self.state = self
                .renderer
                .render_placeholder(&mut self.surface, &frame, &self.overlay)?;
            return Ok(TickReport {
                state: self.state,
                geometry: None,
                detection_skipped: false,
            });
        };

        if let Some(result) = worker.poll() {
            self.faces = match result {
                Ok(faces) => faces,
                Err(e) => {
                    warn!("Detection failed for this tick: {e:#}");
                    Vec::new()
                }
            };
        }

        let detection_skipped = !worker.submit(frame.clone());
        if detection_skipped {
            trace!("Detector busy, dropping frame");
        }

        let placement = place(&self.faces);
        self.state = self.renderer.render(&mut self.surface, &frame, &placement)?;

        Ok(TickReport {
            state: self.state,
            geometry: placement.geometry(),
            detection_skipped,
        })
    }

    fn fall_back_if_worker_stopped(&mut self) {
        if self.worker.as_ref().is_some_and(DetectionWorker::is_stopped) {
            error!("Detection worker stopped, showing static glasses");
            self.worker = None;
            self.overlay = OverlayStatus::InitFailed("detection worker stopped".into());
            self.faces.clear();
        }
    }

    /// Blocks until the in-flight detection resolves and records its result.
    pub fn settle(&mut self) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        if let Some(result) = worker.settle() {
            self.faces = result.unwrap_or_else(|e| {
                warn!("Detection failed: {e:#}");
                Vec::new()
            });
        }
    }

    /// Ticks at the configured interval until the camera stops or `on_tick` breaks.
    /// A frame that fails to read or decode skips that tick as not placed.
    pub fn run<F>(&mut self, mut on_tick: F) -> Result<()>
    where
        F: FnMut(&TickReport, &S) -> ControlFlow<()>,
    {
        while self.camera.is_active() && !self.closed {
            let started = Instant::now();

            match self.tick() {
                Ok(report) => {
                    if on_tick(&report, &self.surface).is_break() {
                        break;
                    }
                }
                Err(TryOnError::FrameNotReady { width, height }) => {
                    debug!("Frame not ready ({width}x{height}), waiting");
                }
                Err(TryOnError::Camera(CameraError::Stream(e))) if self.camera.is_active() => {
                    warn!("Dropped unreadable frame: {e}");
                    self.state = PlacementState::NotPlaced;
                }
                Err(e) => return Err(e),
            }

            if let Some(remaining) = self.interval.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
        Ok(())
    }

    /// Encodes the surface as it is now. Placement state is untouched.
    pub fn capture<F: FnOnce(Still)>(&self, on_capture: F) -> Result<()> {
        let still = Still::capture(self.surface.pixels())?;
        on_capture(still);
        Ok(())
    }

    /// Stops the camera and the detector thread. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        debug!("Closing try-on session");
        self.camera.stop();
        self.worker = None;
        self.closed = true;
    }
}

impl<D: CameraDevice, S: Surface> Drop for TryOnSession<D, S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::tests::FakeDevice;
    use crate::keypoints::tests::mesh_with;
    use crate::shapes::Point;
    use crate::surface::ImageCanvas;
    use anyhow::bail;
    use image::{Rgba, RgbaImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn frame() -> RgbaImage {
        RgbaImage::from_pixel(320, 240, Rgba([40, 80, 120, 255]))
    }

    fn face() -> FaceKeypoints {
        mesh_with(
            Point::new(130., 120.),
            Point::new(190., 120.),
            Point::new(160., 125.),
        )
    }

    fn open_with<T: LandmarkDetector + 'static>(
        device: FakeDevice,
        detector: T,
    ) -> TryOnSession<FakeDevice, ImageCanvas> {
        TryOnSession::open(
            device,
            ImageCanvas::new(1, 1),
            move || Ok(detector),
            GlassesRenderer::default(),
            SessionConfig {
                interval: Duration::from_millis(1),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn places_after_detection_resolves() {
        let mut session = open_with(
            FakeDevice::working(frame()),
            |_: &RgbaImage| -> anyhow::Result<Vec<FaceKeypoints>> { Ok(vec![face()]) },
        );
        assert!(session.overlay_status().is_ready());

        let first = session.tick().unwrap();
        assert_eq!(first.state, PlacementState::NotPlaced);

        session.settle();
        let second = session.tick().unwrap();
        assert_eq!(second.state, PlacementState::Placed);
        let g = second.geometry.unwrap();
        assert!((g.center().x - 160.).abs() < 1e-3);
        assert!((g.center().y - 125.).abs() < 1e-3);
    }

    #[test]
    fn failed_detection_tick_is_not_placed_and_loop_continues() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let detector = move |_: &RgbaImage| -> anyhow::Result<Vec<FaceKeypoints>> {
            if counter.fetch_add(1, Ordering::SeqCst) == 1 {
                bail!("detector rejected frame");
            }
            Ok(vec![face()])
        };
        let mut session = open_with(FakeDevice::working(frame()), detector);

        session.tick().unwrap();
        session.settle();
        assert_eq!(session.tick().unwrap().state, PlacementState::Placed);
        session.settle();
        assert_eq!(session.tick().unwrap().state, PlacementState::NotPlaced);
        session.settle();
        assert_eq!(session.tick().unwrap().state, PlacementState::Placed);
    }

    #[test]
    fn init_failure_falls_back_to_placeholder() {
        let mut session: TryOnSession<FakeDevice, ImageCanvas> = TryOnSession::open(
            FakeDevice::working(frame()),
            ImageCanvas::new(1, 1),
            || -> anyhow::Result<fn(&RgbaImage) -> anyhow::Result<Vec<FaceKeypoints>>> {
                bail!("no model")
            },
            GlassesRenderer::default(),
            SessionConfig::default(),
        )
        .unwrap();

        assert_eq!(
            session.overlay_status(),
            &OverlayStatus::InitFailed("no model".into())
        );
        let report = session.tick().unwrap();
        assert_eq!(report.state, PlacementState::NotPlaced);
        assert!(report.geometry.is_none());

        // placeholder glasses are drawn over the frame
        let g = OverlayGeometry::placeholder(320, 240);
        let lens = g.left_lens().center();
        let px = session
            .surface()
            .pixels()
            .get_pixel(lens.x as u32, lens.y as u32);
        assert_ne!(px, frame().get_pixel(0, 0));
    }

    #[test]
    fn camera_denied_surfaces_on_open() {
        let mut device = FakeDevice::working(frame());
        device.access = Err(CameraError::PermissionDenied);

        let result = TryOnSession::open(
            device,
            ImageCanvas::new(1, 1),
            || -> anyhow::Result<fn(&RgbaImage) -> anyhow::Result<Vec<FaceKeypoints>>> {
                bail!("unused")
            },
            GlassesRenderer::default(),
            SessionConfig::default(),
        );
        assert!(matches!(
            result,
            Err(TryOnError::Camera(CameraError::PermissionDenied))
        ));
    }

    #[test]
    fn empty_frame_is_not_ready() {
        let mut session = open_with(
            FakeDevice::working(RgbaImage::new(0, 0)),
            |_: &RgbaImage| -> anyhow::Result<Vec<FaceKeypoints>> { Ok(vec![face()]) },
        );
        assert!(matches!(
            session.tick(),
            Err(TryOnError::FrameNotReady { .. })
        ));
    }

    #[test]
    fn capture_does_not_change_state() {
        let mut session = open_with(
            FakeDevice::working(frame()),
            |_: &RgbaImage| -> anyhow::Result<Vec<FaceKeypoints>> { Ok(vec![face()]) },
        );
        session.tick().unwrap();
        session.settle();
        session.tick().unwrap();
        let before = session.placement_state();

        let mut captured = None;
        session.capture(|still| captured = Some(still)).unwrap();

        let still = captured.unwrap();
        assert_eq!(still.dimensions(), (320, 240));
        assert!(still.data_url().starts_with("data:image/png;base64,"));
        assert_eq!(session.placement_state(), before);
    }

    #[test]
    fn run_stops_on_break_and_close_releases_camera() {
        let device = FakeDevice::working(frame());
        let log = device.log.clone();
        let mut session = open_with(
            device,
            |_: &RgbaImage| -> anyhow::Result<Vec<FaceKeypoints>> { Ok(Vec::new()) },
        );

        let mut ticks = 0;
        session
            .run(|report, surface| {
                assert_eq!(report.state, PlacementState::NotPlaced);
                assert_eq!(surface.dimensions(), (320, 240));
                ticks += 1;
                if ticks == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(ticks, 3);

        session.close();
        session.close();
        assert_eq!(session.camera_state(), CameraState::Stopped);
        assert_eq!(log.borrow().stopped, 1);
        assert!(matches!(session.tick(), Err(TryOnError::Closed)));
        drop(session);
        assert_eq!(log.borrow().stopped, 1);
    }

    #[test]
    fn unreadable_frame_does_not_end_run() {
        let mut device = FakeDevice::working(frame());
        device.bad_frames = vec![2];
        let log = device.log.clone();
        let mut session = open_with(
            device,
            |_: &RgbaImage| -> anyhow::Result<Vec<FaceKeypoints>> { Ok(vec![face()]) },
        );

        let mut ticks = 0;
        session
            .run(|_, _| {
                ticks += 1;
                if ticks == 4 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();

        assert_eq!(ticks, 4);
        assert_eq!(log.borrow().frames_read, 5);
        assert_eq!(session.camera_state(), CameraState::Active);
    }

    #[test]
    fn stopped_worker_falls_back_to_placeholder() {
        let mut session = open_with(
            FakeDevice::working(frame()),
            |_: &RgbaImage| -> anyhow::Result<Vec<FaceKeypoints>> { panic!("model crashed") },
        );
        assert!(session.overlay_status().is_ready());

        assert!(!session.tick().unwrap().detection_skipped);
        session.settle();

        let report = session.tick().unwrap();
        assert_eq!(report.state, PlacementState::NotPlaced);
        assert!(report.geometry.is_none());
        assert_eq!(
            session.overlay_status(),
            &OverlayStatus::InitFailed("detection worker stopped".into())
        );

        let g = OverlayGeometry::placeholder(320, 240);
        let lens = g.left_lens().center();
        let px = session
            .surface()
            .pixels()
            .get_pixel(lens.x as u32, lens.y as u32);
        assert_ne!(px, frame().get_pixel(0, 0));
    }

    #[test]
    fn drop_releases_camera() {
        let device = FakeDevice::working(frame());
        let log = device.log.clone();
        let session = open_with(
            device,
            |_: &RgbaImage| -> anyhow::Result<Vec<FaceKeypoints>> { Ok(Vec::new()) },
        );
        drop(session);
        assert_eq!(log.borrow().stopped, 1);
    }
}
