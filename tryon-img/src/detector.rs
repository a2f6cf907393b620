use crate::keypoints::FaceKeypoints;
use anyhow::{Result, anyhow};
use flume::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use image::RgbaImage;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{Level, debug, error, info, span, warn};

/// Face landmark model. Returns zero or more faces, keypoints in frame pixel space.
pub trait LandmarkDetector: Send {
    fn detect(&mut self, frame: &RgbaImage) -> Result<Vec<FaceKeypoints>>;
}

impl<F> LandmarkDetector for F
where
    F: FnMut(&RgbaImage) -> Result<Vec<FaceKeypoints>> + Send,
{
    fn detect(&mut self, frame: &RgbaImage) -> Result<Vec<FaceKeypoints>> {
        self(frame)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayStatus {
    Ready,
    InitFailed(String),
    TimedOut,
}

impl OverlayStatus {
    pub fn is_ready(&self) -> bool {
        *self == OverlayStatus::Ready
    }

    pub fn message(&self) -> &str {
        match self {
            OverlayStatus::Ready => "Ready",
            OverlayStatus::InitFailed(_) => "Try-on unavailable",
            OverlayStatus::TimedOut => "Try-on took too long to load",
        }
    }
}

/// Runs a detector on its own thread, one frame at a time.
pub struct DetectionWorker {
    jobs: Option<Sender<RgbaImage>>,
    results: Receiver<Result<Vec<FaceKeypoints>>>,
    handle: Option<JoinHandle<()>>,
    busy: bool,
    stopped: bool,
}

impl DetectionWorker {
    /// Loads the detector off-thread, waiting at most `load_timeout`.
    /// There is no retry: a failed or late load leaves the overlay unavailable.
    pub fn spawn<L, D>(loader: L, load_timeout: Duration) -> (Option<DetectionWorker>, OverlayStatus)
    where
        L: FnOnce() -> Result<D> + Send + 'static,
        D: LandmarkDetector + 'static,
    {
        let (ready_tx, ready_rx) = flume::bounded::<std::result::Result<(), String>>(1);
        let (jobs_tx, jobs_rx) = flume::bounded::<RgbaImage>(1);
        let (results_tx, results_rx) = flume::unbounded();

        let handle = thread::spawn(move || {
            let span = span!(Level::INFO, "detection_worker");
            let _guard = span.enter();

            let mut detector = match loader() {
                Ok(d) => {
                    let _ = ready_tx.send(Ok(()));
                    d
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(format!("{e:#}")));
                    return;
                }
            };

            while let Ok(frame) = jobs_rx.recv() {
                let detect_span = span!(Level::DEBUG, "detect");
                let detect_guard = detect_span.enter();
                let result = detector.detect(&frame);
                drop(detect_guard);

                if results_tx.send(result).is_err() {
                    break;
                }
            }
            debug!("Detection worker exiting");
        });

        let status = match ready_rx.recv_timeout(load_timeout) {
            Ok(Ok(())) => OverlayStatus::Ready,
            Ok(Err(e)) => OverlayStatus::InitFailed(e),
            Err(RecvTimeoutError::Timeout) => OverlayStatus::TimedOut,
            Err(RecvTimeoutError::Disconnected) => {
                OverlayStatus::InitFailed("detector loader panicked".into())
            }
        };

        match status {
            OverlayStatus::Ready => {
                info!("Face detector ready");
                let worker = DetectionWorker {
                    jobs: Some(jobs_tx),
                    results: results_rx,
                    handle: Some(handle),
                    busy: false,
                    stopped: false,
                };
                (Some(worker), status)
            }
            _ => {
                // A late loader finds the job channel closed and exits on its own.
                error!("Face detector unavailable: {status:?}");
                (None, status)
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// The detector thread has exited, e.g. after a panic inside `detect`.
    pub fn is_stopped(&self) -> bool {
        self.stopped || self.jobs.as_ref().is_none_or(Sender::is_disconnected)
    }

    /// Hands a frame to the detector. Returns false, dropping the frame, if the
    /// previous detection has not resolved yet.
    pub fn submit(&mut self, frame: RgbaImage) -> bool {
        if self.busy {
            return false;
        }
        let Some(jobs) = self.jobs.as_ref() else {
            return false;
        };

        match jobs.try_send(frame) {
            Ok(()) => {
                self.busy = true;
                true
            }
            Err(e) => {
                warn!("Detection worker not accepting frames: {e}");
                false
            }
        }
    }

    /// Result of the in-flight detection, if it has resolved.
    pub fn poll(&mut self) -> Option<Result<Vec<FaceKeypoints>>> {
        if !self.busy {
            return None;
        }
        match self.results.try_recv() {
            Ok(r) => {
                self.busy = false;
                Some(r)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.busy = false;
                self.stopped = true;
                Some(Err(anyhow!("detection worker stopped")))
            }
        }
    }

    /// Blocks until the in-flight detection resolves.
    pub fn settle(&mut self) -> Option<Result<Vec<FaceKeypoints>>> {
        if !self.busy {
            return None;
        }
        self.busy = false;
        match self.results.recv() {
            Ok(r) => Some(r),
            Err(_) => {
                self.stopped = true;
                Some(Err(anyhow!("detection worker stopped")))
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Detection worker panicked");
            }
        }
    }
}
