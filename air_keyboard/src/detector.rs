//! Hand detection from an external landmark model or pointer simulation.
//!
//! The public interface is [`HandDetector`]: frame in, hands out.  The
//! session does not need to know whether hands came from a real model or
//! the mouse.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::mpsc::{Receiver, TryRecvError};

use serde::{Deserialize, Serialize};

use air_keys::{CursorPolicy, Hand, Landmark};

use crate::camera::Frame;
use crate::error::AppError;

// ════════════════════════════════════════════════════════════════════════════
// HandDetector trait
// ════════════════════════════════════════════════════════════════════════════

pub trait HandDetector {
    /// Detect every hand in `frame`.  An empty list is the normal
    /// "nothing in view" answer, never an error.
    fn find_hands(&mut self, frame: &Frame) -> Vec<Hand>;
}

impl<T: HandDetector + ?Sized> HandDetector for Box<T> {
    fn find_hands(&mut self, frame: &Frame) -> Vec<Hand> { (**self).find_hands(frame) }
}

// ════════════════════════════════════════════════════════════════════════════
// Config
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Mouse-driven simulation.
    #[default]
    Pointer,
    /// External landmark process speaking the JSON-lines protocol.
    Pipe,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub kind:                 DetectorKind,
    /// Program and arguments of the landmark process.
    pub command:              Vec<String>,
    pub max_hands:            usize,
    pub detection_confidence: f32,
    pub tracking_confidence:  f32,
    /// Treat each frame independently instead of tracking across frames.
    pub static_mode:          bool,
    pub cursor_policy:        CursorPolicy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            kind:                 DetectorKind::Pointer,
            command:              vec!["python3".into(), "hand_detect.py".into()],
            max_hands:            2,
            detection_confidence: 0.8,
            tracking_confidence:  0.5,
            static_mode:          false,
            cursor_policy:        CursorPolicy::LastHand,
        }
    }
}

impl DetectorConfig {
    /// Flags handed to the landmark process after its own command line.
    pub fn helper_args(&self) -> Vec<String> {
        let mut args = vec![
            "--max-hands".to_string(),            self.max_hands.to_string(),
            "--detection-confidence".to_string(), self.detection_confidence.to_string(),
            "--tracking-confidence".to_string(),  self.tracking_confidence.to_string(),
        ];
        if self.static_mode {
            args.push("--static-mode".to_string());
        }
        args
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PointerHands — mouse simulation
// ════════════════════════════════════════════════════════════════════════════

/// Pointer state sent by the visualizer window each frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointerInput {
    /// Mouse position in frame pixels, `None` when outside the window.
    pub pos:     Option<(f32, f32)>,
    /// Left button held: fingertips together.
    pub pinched: bool,
}

/// Half the horizontal distance between the simulated tips when pinched.
const PINCH_HALF_GAP: f32 = 8.0;
/// Vertical spread of the middle tip when not pinched; larger than any key
/// so a relaxed hand can never press.
const RELAXED_SPREAD: f32 = 160.0;

/// Simulated detector driven by [`PointerInput`] from the window.
///
/// Holding the left mouse button brings the two fingertips together around
/// the pointer; releasing it spreads them apart.  The channel decouples the
/// window's input polling from detection.
pub struct PointerHands {
    rx:     Receiver<PointerInput>,
    latest: PointerInput,
}

impl PointerHands {
    pub fn new(rx: Receiver<PointerInput>) -> Self {
        PointerHands { rx, latest: PointerInput::default() }
    }

    fn drain(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(p)                           => self.latest = p,
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => {
                    self.latest = PointerInput::default();
                    break;
                }
            }
        }
    }
}

/// The synthetic hand for one pointer state.
pub fn pointer_hand(input: PointerInput) -> Option<Hand> {
    let (x, y) = input.pos?;
    let index  = (x - PINCH_HALF_GAP, y);
    let middle = if input.pinched {
        (x + PINCH_HALF_GAP, y)
    } else {
        (x + PINCH_HALF_GAP, y - RELAXED_SPREAD)
    };
    let mut hand = Hand::with_tips(index, middle);
    // wrist below the pointer, so the hand reads upright
    hand.landmarks[0] = Landmark { x, y: y + 180.0, z: 0.0 };
    hand.handedness = Some("Right".to_string());
    Some(hand)
}

impl HandDetector for PointerHands {
    fn find_hands(&mut self, _frame: &Frame) -> Vec<Hand> {
        self.drain();
        pointer_hand(self.latest).into_iter().collect()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkPipe — external model over stdin/stdout
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct HandJson {
    #[serde(default)]
    handedness: Option<String>,
    #[serde(default = "full_score")]
    score:      f32,
    landmarks:  Vec<Landmark>,
}

fn full_score() -> f32 { 1.0 }

#[derive(Deserialize, Debug)]
struct DetectionResult {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one response line and apply the confidence and hand-count limits.
fn parse_response(line: &str, cfg: &DetectorConfig) -> Result<Vec<Hand>, serde_json::Error> {
    let result: DetectionResult = serde_json::from_str(line)?;
    if let Some(error) = result.error {
        log::warn!("hand detector reported: {}", error);
    }
    Ok(result
        .hands
        .into_iter()
        .filter(|h| h.score >= cfg.detection_confidence)
        .take(cfg.max_hands)
        .map(|h| Hand { landmarks: h.landmarks, handedness: h.handedness, score: h.score })
        .collect())
}

/// Landmark model running as a child process.
///
/// Protocol: the child prints `READY` once it has loaded.  For every frame
/// it receives a header of three little-endian `u32`s (width, height,
/// channels = 3) followed by the RGB bytes, and answers with one JSON line:
///
/// ```json
/// {"hands":[{"handedness":"Right","score":0.93,"landmarks":[[x,y,z], ...]}],"error":null}
/// ```
///
/// Landmark coordinates are frame pixels.
pub struct LandmarkPipe {
    child:  Child,
    stdin:  ChildStdin,
    stdout: BufReader<ChildStdout>,
    cfg:    DetectorConfig,
    line:   String,
    dead:   bool,
}

impl LandmarkPipe {
    pub fn spawn(cfg: &DetectorConfig) -> Result<Self, AppError> {
        let (program, args) = cfg
            .command
            .split_first()
            .ok_or_else(|| AppError::DetectorUnavailable("empty detector command".into()))?;

        log::info!("starting hand detector: {}", cfg.command.join(" "));
        let mut child = Command::new(program)
            .args(args)
            .args(cfg.helper_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| AppError::DetectorUnavailable(format!("{}: {}", program, e)))?;

        let unavailable = |what: &str| AppError::DetectorUnavailable(what.to_string());
        let stdin  = child.stdin.take().ok_or_else(|| unavailable("stdin not captured"))?;
        let stdout = child.stdout.take().ok_or_else(|| unavailable("stdout not captured"))?;
        let mut stdout = BufReader::new(stdout);

        let mut ready = String::new();
        stdout
            .read_line(&mut ready)
            .map_err(|e| AppError::DetectorUnavailable(e.to_string()))?;
        if ready.trim() != "READY" {
            let _ = child.kill();
            let _ = child.wait();
            return Err(AppError::DetectorUnavailable(format!(
                "expected READY, got {:?}", ready.trim()
            )));
        }
        log::info!("hand detector ready");

        Ok(LandmarkPipe {
            child,
            stdin,
            stdout,
            cfg: cfg.clone(),
            line: String::new(),
            dead: false,
        })
    }

    fn exchange(&mut self, frame: &Frame) -> std::io::Result<usize> {
        let header = [frame.width as u32, frame.height as u32, 3u32];
        for v in header {
            self.stdin.write_all(&v.to_le_bytes())?;
        }
        self.stdin.write_all(&frame.to_rgb24())?;
        self.stdin.flush()?;

        self.line.clear();
        self.stdout.read_line(&mut self.line)
    }
}

impl HandDetector for LandmarkPipe {
    fn find_hands(&mut self, frame: &Frame) -> Vec<Hand> {
        if self.dead {
            return Vec::new();
        }
        match self.exchange(frame) {
            Ok(0) => {
                log::warn!("hand detector exited; no further hands will be reported");
                self.dead = true;
                Vec::new()
            }
            Ok(_) => parse_response(&self.line, &self.cfg).unwrap_or_else(|e| {
                log::warn!("bad detector response {:?}: {}", self.line.trim(), e);
                Vec::new()
            }),
            Err(e) => {
                log::warn!("hand detector pipe failed: {}", e);
                self.dead = true;
                Vec::new()
            }
        }
    }
}

impl Drop for LandmarkPipe {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
