use anyhow::{Result, anyhow};
use image::imageops::{self, FilterType};
use image::RgbaImage;
use ndarray::Array;
use ort::execution_providers;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;
use std::path::Path;
use tracing::{Level, debug, span, trace};
use tryon_img::detector::LandmarkDetector;
use tryon_img::keypoints::FaceKeypoints;
use tryon_img::shapes::Point;

const HEIGHT: u32 = 192;
const WIDTH: u32 = 192;

const INPUT: &str = "input_1";
const LANDMARKS_OUTPUT: &str = "conv2d_21";
const PRESENCE_OUTPUT: &str = "conv2d_31";

pub fn initialize_model(model_file_path: &Path, threads: usize) -> Result<Session> {
    ort::init()
        .with_execution_providers([execution_providers::XNNPACKExecutionProvider::default()
            .build()
            .error_on_failure()])
        .commit()?;

    let model = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_parallel_execution(true)?
        .with_inter_threads(threads.saturating_sub(2).max(1))?
        .commit_from_file(model_file_path)?;

    Ok(model)
}

/// 468 point face mesh model. Expects the face to fill a centered square of the frame.
pub struct FaceMesh {
    model: Session,
    presence_threshold: f32,
}

impl FaceMesh {
    pub fn load(model_file_path: &Path, threads: usize, presence_threshold: f32) -> Result<Self> {
        debug!("Loading face mesh from {model_file_path:?}");
        Ok(FaceMesh {
            model: initialize_model(model_file_path, threads)?,
            presence_threshold,
        })
    }
}

fn sigmoid(x: f32) -> f32 {
    1. / (1. + (-x).exp())
}

impl LandmarkDetector for FaceMesh {
    fn detect(&mut self, frame: &RgbaImage) -> Result<Vec<FaceKeypoints>> {
        let span = span!(Level::DEBUG, "face_mesh");
        let _guard = span.enter();

        let side = frame.width().min(frame.height());
        if side == 0 {
            return Err(anyhow!("empty frame"));
        }
        let x_offset = (frame.width() - side) / 2;
        let y_offset = (frame.height() - side) / 2;

        let crop = imageops::crop_imm(frame, x_offset, y_offset, side, side).to_image();
        let input_img = imageops::resize(&crop, WIDTH, HEIGHT, FilterType::Triangle);

        let input_arr =
            Array::from_shape_fn((1, HEIGHT as usize, WIDTH as usize, 3), |(_, y, x, c)| {
                input_img.get_pixel(x as u32, y as u32)[c] as f32 / 255. // 0. - 1. range
            });
        let input = Tensor::from_array(input_arr)?;

        let outputs = self.model.run(ort::inputs![INPUT => input]?)?;

        if let Some(presence) = outputs.get(PRESENCE_OUTPUT) {
            let logits = presence.try_extract_tensor::<f32>()?;
            let score = logits.iter().next().copied().map(sigmoid).unwrap_or(0.);
            trace!("Face presence {score:.3}");
            if score < self.presence_threshold {
                return Ok(Vec::new());
            }
        }

        let output = outputs[LANDMARKS_OUTPUT].try_extract_tensor::<f32>()?;
        let mesh = output
            .as_slice()
            .ok_or_else(|| anyhow!("landmark tensor is not contiguous"))?;

        let scale = side as f32 / WIDTH as f32;
        let points = mesh
            .chunks_exact(3)
            .map(|xyz| {
                Point::new(
                    x_offset as f32 + xyz[0] * scale,
                    y_offset as f32 + xyz[1] * scale,
                )
            })
            .collect();

        Ok(vec![FaceKeypoints::new(points)])
    }
}
