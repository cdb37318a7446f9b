use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use fitrs::{config, overlay, storage, Compositor, Landmark, MaskChain, Pipeline, TryOnError};
use fitrs_vision::composite::reclamp;
use fitrs_vision::pose::{FixedLandmarks, MoveNet, PoseDetector};
use fitrs_vision::{GarmentAsset, Shoulders, TorsoBox};
use image::GenericImageView;
use log::{error, info};

#[derive(Parser)]
#[command(name = "fitrs")]
#[command(
    version,
    about = "Virtual try-on - torso box estimation and garment compositing"
)]
struct Cli {
    /// Config file (defaults to fitrs.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log intermediate geometry
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct PoseArgs {
    /// Left shoulder as normalized "x,y"
    #[arg(long, value_parser = parse_landmark, requires = "right")]
    left: Option<Landmark>,

    /// Right shoulder as normalized "x,y"
    #[arg(long, value_parser = parse_landmark, requires = "left")]
    right: Option<Landmark>,

    /// Pose model (overrides the config file)
    #[arg(long, conflicts_with_all = ["left", "right"])]
    model: Option<PathBuf>,
}

#[derive(Args)]
struct GarmentArgs {
    /// Garment image (RGB with separate mask, RGBA cut-out, or product shot)
    garment: PathBuf,

    /// Garment silhouette mask, same size as the garment
    #[arg(long)]
    mask: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the torso box of a person image
    Estimate {
        image: PathBuf,

        #[command(flatten)]
        pose: PoseArgs,

        /// Where to write the box record
        #[arg(long, default_value = storage::DEFAULT_BOX_PATH)]
        box_out: PathBuf,

        /// Save shoulders and box drawn over the image
        #[arg(long)]
        debug: Option<PathBuf>,
    },
    /// Composite a garment into a previously estimated torso box
    Composite {
        person: PathBuf,

        #[command(flatten)]
        garment: GarmentArgs,

        /// Box record written by `estimate`
        #[arg(long = "box", default_value = storage::DEFAULT_BOX_PATH)]
        box_path: PathBuf,

        #[arg(short, long, default_value = "tryon_output.png")]
        output: PathBuf,

        /// Save the clamped box drawn over the person image
        #[arg(long)]
        debug: Option<PathBuf>,
    },
    /// Estimate and composite in one go
    Run {
        person: PathBuf,

        #[command(flatten)]
        garment: GarmentArgs,

        #[command(flatten)]
        pose: PoseArgs,

        #[arg(long, default_value = storage::DEFAULT_BOX_PATH)]
        box_out: PathBuf,

        #[arg(short, long, default_value = "tryon_output.png")]
        output: PathBuf,
    },
    /// Open config file in editor
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::builder()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .format_target(false)
        .format_timestamp(None)
        .init();

    let config_path = cli.config.as_deref();
    let cfg = config::load_config(config_path)?;

    let result = match cli.command {
        Commands::Estimate {
            image,
            pose,
            box_out,
            debug,
        } => estimate(&cfg, &image, &pose, &box_out, debug.as_deref()),
        Commands::Composite {
            person,
            garment,
            box_path,
            output,
            debug,
        } => composite(&cfg, &person, &garment, &box_path, &output, debug.as_deref()),
        Commands::Run {
            person,
            garment,
            pose,
            box_out,
            output,
        } => run(&cfg, &person, &garment, &pose, &box_out, &output),
        Commands::Config => open_config(config_path),
    };

    if let Err(e) = &result {
        if let Some(err) = e.downcast_ref::<TryOnError>() {
            error!("try-on failed ({:?})", err.kind());
        }
    }
    result
}

fn parse_landmark(s: &str) -> std::result::Result<Landmark, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"x,y\", got \"{}\"", s))?;
    let x: f32 = x.trim().parse().map_err(|e| format!("x: {}", e))?;
    let y: f32 = y.trim().parse().map_err(|e| format!("y: {}", e))?;
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return Err(format!("landmark ({}, {}) is outside [0, 1]", x, y));
    }
    Ok(Landmark::new(x, y))
}

fn detector(cfg: &config::Config, pose: &PoseArgs) -> Result<Box<dyn PoseDetector>> {
    if let (Some(left), Some(right)) = (pose.left, pose.right) {
        return Ok(Box::new(FixedLandmarks(Some(Shoulders { left, right }))));
    }

    let model = pose.model.as_ref().or(cfg.pose.model.as_ref()).ok_or_else(|| {
        TryOnError::Input(
            "no shoulder landmarks: pass --left/--right or configure a pose model".to_string(),
        )
    })?;
    info!("Loading pose model: {}", model.display());
    let movenet = MoveNet::from_file(model, cfg.pose.input_size, cfg.pose.min_score)
        .context("Failed to initialize pose model")?;
    Ok(Box::new(movenet))
}

fn load_garment(args: &GarmentArgs) -> Result<GarmentAsset> {
    let garment = image::open(&args.garment)
        .with_context(|| format!("opening garment {}", args.garment.display()))?;
    let provided = match &args.mask {
        Some(path) => Some(
            image::open(path)
                .with_context(|| format!("opening mask {}", path.display()))?
                .to_luma8(),
        ),
        None => None,
    };

    let (asset, strategy) = MaskChain::standard(provided).resolve(&garment)?;
    info!("Garment mask from '{}' strategy", strategy);
    Ok(asset)
}

fn estimate(
    cfg: &config::Config,
    image_path: &Path,
    pose: &PoseArgs,
    box_out: &Path,
    debug: Option<&Path>,
) -> Result<()> {
    info!("Estimating torso box for {}", image_path.display());
    let img = image::open(image_path)
        .with_context(|| format!("opening {}", image_path.display()))?;

    let mut pipeline = Pipeline::new(detector(cfg, pose)?, cfg.torso_params(), cfg.warp_params());
    let (shoulders, bbox) = pipeline.estimate_box(&img)?;

    storage::save_box(box_out, &bbox.into()).context("Failed to save torso box")?;
    info!("✓ Torso box {:?} saved to {}", bbox, box_out.display());

    if let Some(path) = debug {
        let (w, h) = img.dimensions();
        let (left, right) = shoulders.to_pixels(w, h);
        overlay::shoulders_and_box(&img.to_rgb8(), left, right, &bbox)
            .save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Debug overlay saved to {}", path.display());
    }

    Ok(())
}

fn composite(
    cfg: &config::Config,
    person_path: &Path,
    garment: &GarmentArgs,
    box_path: &Path,
    output: &Path,
    debug: Option<&Path>,
) -> Result<()> {
    let person = image::open(person_path)
        .with_context(|| format!("opening {}", person_path.display()))?
        .to_rgb8();
    let asset = load_garment(garment)?;
    let bbox: TorsoBox = storage::load_box(box_path)
        .context("Failed to load torso box")?
        .into();

    if let Some(path) = debug {
        let roi = reclamp(bbox, person.width(), person.height())?;
        let mut vis = person.clone();
        overlay::draw_box(&mut vis, &roi, 2, overlay::LINE_COLOR);
        vis.save(path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Debug box saved to {}", path.display());
    }

    let result = Compositor::new(cfg.warp_params()).composite(&person, &asset, bbox)?;
    result
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!("✓ Try-on saved to {}", output.display());
    Ok(())
}

fn run(
    cfg: &config::Config,
    person_path: &Path,
    garment: &GarmentArgs,
    pose: &PoseArgs,
    box_out: &Path,
    output: &Path,
) -> Result<()> {
    let person = image::open(person_path)
        .with_context(|| format!("opening {}", person_path.display()))?;
    let asset = load_garment(garment)?;

    let mut pipeline = Pipeline::new(detector(cfg, pose)?, cfg.torso_params(), cfg.warp_params());
    let tryon = pipeline.try_on(&person, &asset)?;

    storage::save_box(box_out, &tryon.bbox.into()).context("Failed to save torso box")?;
    tryon
        .image
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;

    info!(
        "✓ Try-on with box {:?} saved to {}",
        tryon.bbox,
        output.display()
    );
    Ok(())
}

fn open_config(path: Option<&Path>) -> Result<()> {
    let config_path = path.unwrap_or(&config::CONFIG_PATH);
    if !config_path.exists() {
        config::save_config(&config::Config::default(), Some(config_path))?;
        info!("Wrote default config to {}", config_path.display());
    }

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
