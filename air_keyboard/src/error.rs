//! Error types shared by the application modules.

use std::path::PathBuf;

use thiserror::Error;

/// A single failed frame grab.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// This frame could not be read; the next one may succeed.
    #[error("frame capture failed: {0}")]
    Failed(String),
    /// The video stream ended; no further frames will arrive.
    #[error("video source closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", .path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid config {}: {source}", .path.display())]
    Parse { path: PathBuf, source: toml::de::Error },
    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("cannot open webcam: {0}")]
    CameraUnavailable(String),
    #[error("cannot start hand detector: {0}")]
    DetectorUnavailable(String),
    #[error("cannot open window: {0}")]
    Window(String),
}
