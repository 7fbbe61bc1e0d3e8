//! air_keyboard — interactive entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};

use air_keyboard::app::run_from_config;
use air_keyboard::camera::CameraKind;
use air_keyboard::config::AppConfig;
use air_keyboard::detector::DetectorKind;

/// Type by pointing two fingertips at an on-screen keyboard.
#[derive(Parser, Debug)]
#[command(name = "air_keyboard", version, about)]
struct Cli {
    /// Config file (default: <config_dir>/air_keyboard/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Video source
    #[arg(long, value_enum)]
    camera: Option<CameraKind>,

    /// Webcam device for the ffmpeg source
    #[arg(long, value_name = "DEVICE")]
    device: Option<String>,

    /// Hand detector
    #[arg(long, value_enum)]
    detector: Option<DetectorKind>,

    /// Landmark process program, then one argument per repetition:
    /// `--detector-cmd python3 --detector-cmd hand_detect.py`
    #[arg(long, value_name = "ARG", allow_hyphen_values = true)]
    detector_cmd: Vec<String>,

    /// Minimum time between two clicks of the same key
    #[arg(long, value_name = "MS")]
    click_delay_ms: Option<u64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(kind) = self.camera {
            cfg.camera.source = kind;
        }
        if let Some(device) = &self.device {
            cfg.camera.device = device.clone();
        }
        if let Some(kind) = self.detector {
            cfg.detector.kind = kind;
        }
        if !self.detector_cmd.is_empty() {
            cfg.detector.command = self.detector_cmd.clone();
        }
        if let Some(ms) = self.click_delay_ms {
            cfg.keyboard.click_delay_ms = ms;
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut cfg = AppConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut cfg);

    if cli.print_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    log::info!("starting air keyboard");
    match (cfg.camera.source, cfg.detector.kind) {
        (CameraKind::Synthetic, DetectorKind::Pointer) => {
            log::info!("mode: pointer simulation (hold the left mouse button to press)")
        }
        (camera, detector) => log::info!("mode: camera {:?}, detector {:?}", camera, detector),
    }

    let reason = run_from_config(&cfg)?;
    log::info!("stopped: {:?}", reason);
    Ok(())
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
