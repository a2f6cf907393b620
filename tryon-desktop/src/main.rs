#![warn(unused_extern_crates)]
use ab_glyph::FontArc;
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::TryOnConfig;
use mesh::FaceMesh;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::{Level, debug, error, info, span, warn};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;
use tryon_fit::catalog;
use tryon_fit::{Gender, ShopperProfile, UserMeasurements, recommend_products, recommend_size};
use tryon_img::detector::LandmarkDetector;
use tryon_img::placement::place;
use tryon_img::render::GlassesRenderer;
use tryon_img::session::TryOnSession;
use tryon_img::surface::{ImageCanvas, Still, Surface};
use video::{NokhwaDevice, OutputVideoStream};

mod config;
mod mesh;
mod video;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct CmdArgs {
    /// JSON config file; built-in defaults when unset
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Try glasses on over the webcam
    Live(LiveArgs),
    /// Try glasses on over a single image
    Image(ImageArgs),
    /// Rank catalog products for a shopper
    Recommend(RecommendArgs),
    /// Suggest a garment size from body measurements
    Size(SizeArgs),
}

#[derive(Args, Debug)]
struct LiveArgs {
    /// Loopback device to write to. Displays in window if unset
    #[arg(short, long)]
    device: Option<String>,

    /// Camera index, overriding the config file
    #[arg(long)]
    camera: Option<u32>,

    /// Target frame rate requested from the camera
    #[arg(long)]
    fps: Option<u32>,

    /// Stop after this many ticks
    #[arg(long)]
    frames: Option<u64>,

    /// Capture the last frame on exit; `.txt` writes a data URL, anything else a PNG
    #[arg(long, value_name = "FILE")]
    capture: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ImageArgs {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Args, Debug)]
struct RecommendArgs {
    /// Products as a JSON array
    #[arg(long, value_name = "FILE")]
    catalog: PathBuf,

    /// Shopper profile as JSON
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Recently viewed product ids
    #[arg(long, value_delimiter = ',')]
    viewed: Vec<String>,

    #[arg(long, default_value_t = tryon_fit::DEFAULT_LIMIT)]
    limit: usize,

    /// Include the per-rule score breakdown
    #[arg(long)]
    explain: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum GenderArg {
    Male,
    Female,
    Other,
}

impl From<GenderArg> for Gender {
    fn from(g: GenderArg) -> Self {
        match g {
            GenderArg::Male => Gender::Male,
            GenderArg::Female => Gender::Female,
            GenderArg::Other => Gender::Other,
        }
    }
}

#[derive(Args, Debug)]
struct SizeArgs {
    /// Product category, e.g. jeans, shoes, shirts
    #[arg(long)]
    category: String,

    /// Measurements as JSON; flags below override its fields
    #[arg(long, value_name = "FILE")]
    measurements: Option<PathBuf>,

    #[arg(long, value_enum)]
    gender: Option<GenderArg>,

    /// Weight in kg
    #[arg(long)]
    weight: Option<f32>,

    /// Height in cm
    #[arg(long)]
    height: Option<f32>,

    #[arg(long)]
    age: Option<f32>,

    /// Chest in cm
    #[arg(long)]
    chest: Option<f32>,

    /// Waist in cm
    #[arg(long)]
    waist: Option<f32>,

    /// Hips in cm
    #[arg(long)]
    hips: Option<f32>,
}

fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env();
    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();

    let args = CmdArgs::parse();
    let config = TryOnConfig::load(args.config.as_deref())?;

    match args.command {
        Cmd::Live(live_args) => live(live_args, config),
        Cmd::Image(image_args) => process_image(image_args, &config),
        Cmd::Recommend(rec_args) => recommend(rec_args),
        Cmd::Size(size_args) => size(size_args),
    }
}

fn canvas(config: &TryOnConfig, width: u32, height: u32) -> Result<ImageCanvas> {
    let canvas = ImageCanvas::new(width, height);
    match &config.font_path {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read font {}", path.display()))?;
            Ok(canvas.with_font(FontArc::try_from_vec(bytes)?))
        }
        None => {
            debug!("No font configured, status text disabled");
            Ok(canvas)
        }
    }
}

fn load_mesh(config: &TryOnConfig) -> Result<FaceMesh> {
    FaceMesh::load(
        &config.model.path,
        config.model.threads(),
        config.model.presence_threshold,
    )
}

fn live(args: LiveArgs, mut config: TryOnConfig) -> Result<()> {
    if let Some(index) = args.camera {
        config.camera.index = Some(index);
    }
    if let Some(fps) = args.fps {
        config.camera.constraints.fps = Some(fps);
    }

    let surface = canvas(&config, 0, 0)?;
    let loader_config = config.clone();
    let mut session = TryOnSession::open(
        NokhwaDevice::new(config.camera.index),
        surface,
        move || load_mesh(&loader_config),
        GlassesRenderer::new(config.overlay.clone()),
        config.session(),
    )?;

    let status = session.overlay_status();
    if status.is_ready() {
        info!("Face mesh ready");
    } else {
        warn!("{}, showing static glasses", status.message());
    }

    let mut output: Option<OutputVideoStream> = None;
    let mut ticks = 0u64;
    session.run(|report, surface| {
        let span = span!(Level::DEBUG, "output");
        let _guard = span.enter();
        ticks += 1;

        if report.detection_skipped {
            debug!("Detector busy, reusing last landmarks");
        }

        let frame = surface.pixels();
        if output.is_none() {
            match OutputVideoStream::new(frame.width(), frame.height(), args.device.as_deref()) {
                Ok(stream) => output = Some(stream),
                Err(e) => {
                    error!("Failed to start output: {e:?}");
                    return ControlFlow::Break(());
                }
            }
        }
        if let Some(stream) = output.as_mut() {
            if let Err(e) = stream.write_frame(frame) {
                error!("Failed to write frame: {e:?}");
                return ControlFlow::Break(());
            }
        }

        match args.frames {
            Some(max) if ticks >= max => ControlFlow::Break(()),
            _ => ControlFlow::Continue(()),
        }
    })?;

    if let Some(path) = args.capture {
        let mut written = Ok(());
        session.capture(|still| written = write_still(&path, &still))?;
        written?;
        info!("Captured to {}", path.display());
    }

    session.close();
    Ok(())
}

fn write_still(path: &Path, still: &Still) -> Result<()> {
    let is_text = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
    if is_text {
        std::fs::write(path, still.data_url())?;
    } else {
        std::fs::write(path, still.png())?;
    }
    Ok(())
}

fn process_image(args: ImageArgs, config: &TryOnConfig) -> Result<()> {
    let span = span!(Level::INFO, "process_image");
    let _guard = span.enter();

    let frame = image::open(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?
        .into_rgba8();

    let faces = load_mesh(config)?.detect(&frame)?;
    let placement = place(&faces);

    let mut canvas = canvas(config, frame.width(), frame.height())?;
    let state = GlassesRenderer::new(config.overlay.clone()).render(&mut canvas, &frame, &placement)?;
    info!("Placement: {state}");

    canvas.into_image().save(&args.output)?;
    info!("Result at {:?}", args.output);
    Ok(())
}

fn recommend(args: RecommendArgs) -> Result<()> {
    let products = catalog::load_products(&args.catalog)?;
    let profile = match &args.profile {
        Some(path) => catalog::load_profile(path)?,
        None => ShopperProfile::default(),
    };
    let viewed = catalog::select(&products, &args.viewed)?;

    let ranked = recommend_products(&products, &profile, &viewed, args.limit);
    debug!("Ranked {} of {} products", ranked.len(), products.len());

    let out = if args.explain {
        let explained: Vec<_> = ranked
            .iter()
            .map(|scored| {
                serde_json::json!({
                    "id": scored.product.id,
                    "recommendationScore": scored.recommendation_score,
                    "breakdown": scored.breakdown,
                })
            })
            .collect();
        serde_json::to_string_pretty(&explained)?
    } else {
        serde_json::to_string_pretty(&ranked)?
    };
    println!("{out}");
    Ok(())
}

fn size(args: SizeArgs) -> Result<()> {
    let mut m = match &args.measurements {
        Some(path) => catalog::load_measurements(path)?,
        None => UserMeasurements::default(),
    };
    m.gender = args.gender.map(Gender::from).or(m.gender);
    m.weight = args.weight.or(m.weight);
    m.height = args.height.or(m.height);
    m.age = args.age.or(m.age);
    m.chest = args.chest.or(m.chest);
    m.waist = args.waist.or(m.waist);
    m.hips = args.hips.or(m.hips);

    match recommend_size(&m, &args.category) {
        Some(rec) => println!("{}", serde_json::to_string_pretty(&rec)?),
        None => {
            warn!("Gender, weight and height are needed for a size estimate");
            println!("null");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    #[test]
    fn cli_parses_subcommands() {
        let args = CmdArgs::parse_from([
            "tryon", "recommend", "--catalog", "c.json", "--viewed", "a,b", "--limit", "3",
        ]);
        match args.command {
            Cmd::Recommend(r) => {
                assert_eq!(r.viewed, vec!["a".to_string(), "b".to_string()]);
                assert_eq!(r.limit, 3);
                assert!(r.profile.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }

        let args = CmdArgs::parse_from([
            "tryon", "size", "--category", "jeans", "--gender", "male", "--weight", "80",
            "--height", "180",
        ]);
        assert!(matches!(args.command, Cmd::Size(SizeArgs { gender: Some(GenderArg::Male), .. })));
    }

    #[test]
    fn still_written_by_extension() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let still = Still::capture(&RgbaImage::new(4, 4))?;

        let txt = dir.path().join("capture.txt");
        write_still(&txt, &still)?;
        assert!(std::fs::read_to_string(&txt)?.starts_with("data:image/png;base64,"));

        let png = dir.path().join("capture.png");
        write_still(&png, &still)?;
        assert_eq!(std::fs::read(&png)?, still.png());
        Ok(())
    }
}
