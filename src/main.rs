//! platescan - license plate detection and OCR for still images
//!
//! Loads an image, scans it for a plate-shaped region, rectifies the
//! region, crops the character zone and runs it through Tesseract. The
//! normalized plate code is printed on stdout.

mod capture;
mod config;
mod error;
mod ocr;
mod session;
mod vision;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use capture::StillImageSource;
use config::AppConfig;
use ocr::TesseractCli;
use session::Session;
use vision::PlateDetector;

#[derive(Parser, Debug)]
#[command(name = "platescan", about = "Detect and read a license plate from an image")]
struct Args {
    /// Image file to scan
    image: PathBuf,

    /// Configuration file (defaults to the per-user config location)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for exported character-zone images
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Tesseract executable to invoke
    #[arg(long)]
    tesseract: Option<PathBuf>,

    /// Write a contour overlay image next to the input and exit
    #[arg(long)]
    dump_contours: bool,
}

fn load_or_create_config(explicit: Option<&PathBuf>) -> AppConfig {
    let path = explicit
        .cloned()
        .or_else(config::default_config_path);
    let Some(path) = path else {
        info!("no config location available, using defaults");
        return AppConfig::default();
    };

    match config::load_config(&path) {
        Ok(config) => {
            info!(path = %path.display(), "configuration loaded");
            config
        }
        Err(err) => {
            if path.exists() {
                warn!(path = %path.display(), %err, "failed to load config, using defaults");
            } else {
                info!(path = %path.display(), "no config file, using defaults");
            }
            AppConfig::default()
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();

    let mut config = load_or_create_config(args.config.as_ref());
    if let Some(dir) = args.output_dir {
        config.output.artifact_dir = Some(dir);
    }
    if let Some(binary) = args.tesseract {
        config.ocr.binary = binary;
    }

    let mut source = StillImageSource::open(&args.image)
        .with_context(|| format!("failed to open {}", args.image.display()))?;

    if args.dump_contours {
        return dump_contours(&mut source, &config, &args.image);
    }

    let engine = Arc::new(TesseractCli::new(&config.ocr.binary));
    let mut session = Session::new(source, engine, config);
    session.run().await;

    match session.outcome() {
        Some(Ok(plate)) if !plate.is_empty() => {
            println!("{plate}");
            Ok(())
        }
        Some(Ok(_)) => bail!("plate found but no characters recognized"),
        Some(Err(err)) => bail!("recognition failed: {err}"),
        None => bail!("no plate found in {}", args.image.display()),
    }
}

fn dump_contours(source: &mut StillImageSource, config: &AppConfig, input: &PathBuf) -> Result<()> {
    use capture::FrameSource;

    let frame = source.latest_frame()?;
    let detector = PlateDetector::new(config.detection.clone(), config.crop.clone());
    let Some(overlay) = detector.contour_overlay(&frame) else {
        bail!("could not render contours for {}", input.display());
    };

    let out = input.with_extension("contours.png");
    overlay
        .save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), "contour overlay written");
    Ok(())
}
