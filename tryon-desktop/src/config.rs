use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tryon_img::camera::StreamConstraints;
use tryon_img::render::OverlayStyle;
use tryon_img::session::SessionConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Device index; the last camera found when unset.
    pub index: Option<u32>,
    pub constraints: StreamConstraints,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
    /// Defaults to the number of cpus.
    pub threads: Option<usize>,
    pub presence_threshold: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./models/face_landmark.onnx"),
            threads: None,
            presence_threshold: 0.5,
        }
    }
}

impl ModelConfig {
    pub fn threads(&self) -> usize {
        self.threads.unwrap_or_else(num_cpus::get)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TryOnConfig {
    pub camera: CameraConfig,
    pub model: ModelConfig,
    pub overlay: OverlayStyle,
    pub font_path: Option<PathBuf>,
    pub interval_ms: u64,
    pub load_timeout_ms: u64,
}

impl Default for TryOnConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            model: ModelConfig::default(),
            overlay: OverlayStyle::default(),
            font_path: None,
            interval_ms: 100,
            load_timeout_ms: 10_000,
        }
    }
}

impl TryOnConfig {
    /// Defaults when no file is given. A file that is given must parse.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            interval: Duration::from_millis(self.interval_ms),
            load_timeout: Duration::from_millis(self.load_timeout_ms),
            constraints: self.camera.constraints.clone(),
        }
    }
}
