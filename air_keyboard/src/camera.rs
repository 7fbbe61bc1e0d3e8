//! Video sources.
//!
//! A [`FrameSource`] yields frames one at a time and blocks until the next
//! one is available.  Two sources exist:
//!
//! * [`SyntheticCamera`]: a plain backdrop, for pointer simulation.
//! * [`FfmpegCamera`]: a real webcam read through an `ffmpeg` child process
//!   emitting raw `rgb24` frames on stdout.

use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, CaptureError};

// ════════════════════════════════════════════════════════════════════════════
// Frame
// ════════════════════════════════════════════════════════════════════════════

/// One video frame as packed `0x00RRGGBB` pixels, row-major, the layout
/// `minifb` presents directly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Frame {
    pub fn filled(width: usize, height: usize, color: u32) -> Self {
        Frame { width, height, pixels: vec![color; width * height] }
    }

    /// Pack tightly-laid-out RGB bytes.  Missing trailing bytes become black.
    pub fn from_rgb24(width: usize, height: usize, bytes: &[u8]) -> Self {
        let mut pixels = vec![0u32; width * height];
        for (px, rgb) in pixels.iter_mut().zip(bytes.chunks_exact(3)) {
            *px = (rgb[0] as u32) << 16 | (rgb[1] as u32) << 8 | rgb[2] as u32;
        }
        Frame { width, height, pixels }
    }

    /// Unpack to tightly-laid-out RGB bytes.
    pub fn to_rgb24(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 3);
        for &p in &self.pixels {
            out.extend_from_slice(&[(p >> 16) as u8, (p >> 8) as u8, p as u8]);
        }
        out
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            self.pixels.get(y * self.width + x).copied()
        } else {
            None
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// FrameSource trait
// ════════════════════════════════════════════════════════════════════════════

pub trait FrameSource {
    /// Block until the next frame.  [`CaptureError::Failed`] may be retried;
    /// [`CaptureError::Closed`] is final.
    fn read(&mut self) -> Result<Frame, CaptureError>;

    /// Free the device.  Calling it more than once is harmless.
    fn release(&mut self);
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn read(&mut self) -> Result<Frame, CaptureError> { (**self).read() }
    fn release(&mut self)                              { (**self).release() }
}

// ════════════════════════════════════════════════════════════════════════════
// Config
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum CameraKind {
    #[default]
    Synthetic,
    Ffmpeg,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub source:       CameraKind,
    /// Device passed to ffmpeg's `-i`.
    pub device:       String,
    /// ffmpeg input format: `v4l2` on Linux, `avfoundation` on macOS,
    /// `dshow` on Windows.
    pub input_format: String,
    pub ffmpeg_path:  String,
    /// Flip horizontally so the picture behaves like a mirror.
    pub mirror:       bool,
    /// Backdrop colour for the synthetic source.
    pub backdrop:     u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            source:       CameraKind::Synthetic,
            device:       "/dev/video0".to_string(),
            input_format: "v4l2".to_string(),
            ffmpeg_path:  "ffmpeg".to_string(),
            mirror:       true,
            backdrop:     0x20_20_28,
        }
    }
}

/// Open the source selected by `cfg` at `width × height`.
pub fn open(cfg: &CameraConfig, width: usize, height: usize) -> Result<Box<dyn FrameSource>, AppError> {
    match cfg.source {
        CameraKind::Synthetic => Ok(Box::new(SyntheticCamera::new(width, height, cfg.backdrop))),
        CameraKind::Ffmpeg    => Ok(Box::new(FfmpegCamera::open(cfg, width, height)?)),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SyntheticCamera
// ════════════════════════════════════════════════════════════════════════════

pub struct SyntheticCamera {
    width:    usize,
    height:   usize,
    color:    u32,
    released: bool,
}

impl SyntheticCamera {
    pub fn new(width: usize, height: usize, color: u32) -> Self {
        SyntheticCamera { width, height, color, released: false }
    }
}

impl FrameSource for SyntheticCamera {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        if self.released {
            return Err(CaptureError::Closed);
        }
        Ok(Frame::filled(self.width, self.height, self.color))
    }

    fn release(&mut self) { self.released = true; }
}

// ════════════════════════════════════════════════════════════════════════════
// FfmpegCamera
// ════════════════════════════════════════════════════════════════════════════

pub struct FfmpegCamera {
    child:  Option<Child>,
    stdout: Option<ChildStdout>,
    width:  usize,
    height: usize,
    buf:    Vec<u8>,
    /// Frame grabbed by `open` to prove the device works; handed out first.
    first:  Option<Frame>,
}

impl FfmpegCamera {
    /// Spawn ffmpeg and wait for its first frame.  A device that is missing
    /// or busy makes ffmpeg exit before producing one, which is reported as
    /// [`AppError::CameraUnavailable`].
    pub fn open(cfg: &CameraConfig, width: usize, height: usize) -> Result<Self, AppError> {
        let size = format!("{}x{}", width, height);
        let mut cmd = Command::new(&cfg.ffmpeg_path);
        cmd.args(["-hide_banner", "-loglevel", "error"])
            .args(["-f", &cfg.input_format, "-video_size", &size, "-i", &cfg.device]);
        if cfg.mirror {
            cmd.args(["-vf", "hflip"]);
        }
        cmd.args(["-s", &size, "-f", "rawvideo", "-pix_fmt", "rgb24", "-"]);

        log::info!("opening camera {} via {}", cfg.device, cfg.ffmpeg_path);
        Self::spawn_with(cmd, &cfg.device, width, height)
    }

    /// Run `cmd`, which must write raw `rgb24` frames to stdout.
    fn spawn_with(mut cmd: Command, device: &str, width: usize, height: usize) -> Result<Self, AppError> {
        let program = cmd.get_program().to_string_lossy().into_owned();
        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| AppError::CameraUnavailable(format!("{}: {}", program, e)))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::CameraUnavailable("ffmpeg stdout not captured".into()))?;

        let mut camera = FfmpegCamera {
            child:  Some(child),
            stdout: Some(stdout),
            width,
            height,
            buf:    vec![0; width * height * 3],
            first:  None,
        };
        match camera.grab() {
            Ok(frame) => {
                camera.first = Some(frame);
                Ok(camera)
            }
            Err(e) => {
                camera.release();
                Err(AppError::CameraUnavailable(format!("{}: {}", device, e)))
            }
        }
    }

    /// Read exactly one frame from ffmpeg's stdout.  EOF before the first
    /// byte is the end of the stream; EOF inside a frame is a short read.
    fn grab(&mut self) -> Result<Frame, CaptureError> {
        let stdout = self.stdout.as_mut().ok_or(CaptureError::Closed)?;
        let mut filled = 0;
        while filled < self.buf.len() {
            match stdout.read(&mut self.buf[filled..]) {
                Ok(0) if filled == 0 => return Err(CaptureError::Closed),
                Ok(0) => {
                    return Err(CaptureError::Failed(format!(
                        "short read: {} of {} bytes",
                        filled,
                        self.buf.len()
                    )))
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(CaptureError::Failed(e.to_string())),
            }
        }
        Ok(Frame::from_rgb24(self.width, self.height, &self.buf))
    }
}

impl FrameSource for FfmpegCamera {
    fn read(&mut self) -> Result<Frame, CaptureError> {
        match self.first.take() {
            Some(frame) => Ok(frame),
            None        => self.grab(),
        }
    }

    fn release(&mut self) {
        self.first  = None;
        self.stdout = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            log::info!("camera released");
        }
    }
}

impl Drop for FfmpegCamera {
    fn drop(&mut self) { self.release(); }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb24_packs_channels() {
        let f = Frame::from_rgb24(2, 1, &[0x11, 0x22, 0x33, 0xAA, 0xBB, 0xCC]);
        assert_eq!(f.pixels, vec![0x112233, 0xAABBCC]);
        assert_eq!(f.to_rgb24(), vec![0x11, 0x22, 0x33, 0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn short_rgb_buffer_leaves_black() {
        let f = Frame::from_rgb24(2, 1, &[1, 2, 3]);
        assert_eq!(f.pixels, vec![0x010203, 0]);
    }

    #[test]
    fn synthetic_camera_closes_after_release() {
        let mut cam = SyntheticCamera::new(4, 3, 0x123456);
        let f = cam.read().expect("frame");
        assert_eq!((f.width, f.height), (4, 3));
        assert_eq!(f.pixel(3, 2), Some(0x123456));
        cam.release();
        assert!(matches!(cam.read(), Err(CaptureError::Closed)));
    }

    #[test]
    fn missing_ffmpeg_binary_is_camera_unavailable() {
        let cfg = CameraConfig {
            source:      CameraKind::Ffmpeg,
            ffmpeg_path: "/nonexistent/ffmpeg-air-keyboard".into(),
            ..CameraConfig::default()
        };
        assert!(matches!(
            FfmpegCamera::open(&cfg, 64, 48),
            Err(AppError::CameraUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn source_that_exits_at_once_is_camera_unavailable() {
        let cfg = CameraConfig {
            source:      CameraKind::Ffmpeg,
            ffmpeg_path: "false".into(),
            ..CameraConfig::default()
        };
        assert!(matches!(
            FfmpegCamera::open(&cfg, 64, 48),
            Err(AppError::CameraUnavailable(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn first_frame_is_kept_and_short_read_is_retryable() {
        // 2x1 rgb24 frames are 6 bytes: one whole frame, then half of one
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf 'abcdefxyz'"]);
        let mut cam = FfmpegCamera::spawn_with(cmd, "scripted", 2, 1).expect("first frame");

        assert_eq!(cam.read().expect("kept frame").pixels, vec![0x616263, 0x646566]);
        assert!(matches!(cam.read(), Err(CaptureError::Failed(_))));
        assert!(matches!(cam.read(), Err(CaptureError::Closed)));
        cam.release();
        assert!(matches!(cam.read(), Err(CaptureError::Closed)));
    }

    #[test]
    fn camera_mirrors_by_default() {
        assert!(CameraConfig::default().mirror);
    }
}
