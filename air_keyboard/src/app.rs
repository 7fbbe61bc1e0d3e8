//! Top-level session state machine and the frame loop.
//!
//! `Session` owns the `Keyboard` and the `TextBuffer`.  Each frame it maps
//! detected hands to key presses, applies them, and draws the overlay.
//! `run` drives one `Session` against a camera, a detector and a display
//! until something ends it.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use air_keys::{apply_presses, map_frame, Cursor, CursorPolicy, Hand, Keyboard, Outcome, TextBuffer};

use crate::camera::{self, Frame, FrameSource};
use crate::config::AppConfig;
use crate::detector::{DetectorKind, HandDetector, LandmarkPipe, PointerHands};
use crate::error::CaptureError;
use crate::render::{render_overlay, Theme};
use crate::visualizer::{Display, Visualizer};

/// Consecutive capture failures between two "still failing" warnings.
const FAILURE_REPORT_EVERY: u32 = 30;

// ════════════════════════════════════════════════════════════════════════════
// Clock
// ════════════════════════════════════════════════════════════════════════════

/// Monotonic session time.
pub trait Clock {
    fn now(&self) -> Duration;
}

pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn start() -> Self { MonotonicClock { start: Instant::now() } }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration { self.start.elapsed() }
}

// ════════════════════════════════════════════════════════════════════════════
// Session state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The on-screen EXIT key was pressed.
    ExitKey,
    /// The host quit key was pressed.
    QuitKey,
    /// The window went away.
    WindowClosed,
    /// Too many consecutive frame grabs failed.
    CaptureFailed,
    /// The video stream ended.
    CameraClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Terminated(StopReason),
}

/// What one call to [`Session::step`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    pub cursor:  Option<Cursor>,
    /// Indices of keys that accepted a click this frame.
    pub pressed: Vec<usize>,
    /// Labels that took effect, in order.
    pub typed:   Vec<String>,
}

pub struct Session {
    keyboard: Keyboard,
    buffer:   TextBuffer,
    theme:    Theme,
    policy:   CursorPolicy,
    state:    SessionState,
}

impl Session {
    pub fn new(keyboard: Keyboard, theme: Theme, policy: CursorPolicy) -> Self {
        Session {
            keyboard,
            buffer: TextBuffer::new(),
            theme,
            policy,
            state: SessionState::Running,
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Session::new(cfg.build_keyboard(), cfg.theme, cfg.detector.cursor_policy)
    }

    // ── process one frame ────────────────────────────────────────────────

    /// Map `hands` to key presses at `now`, apply them to the text, and
    /// draw the overlay onto `frame`.  Does nothing once terminated.
    ///
    /// EXIT ends the session immediately and leaves `frame` undrawn.
    pub fn step(&mut self, frame: &mut Frame, hands: &[Hand], now: Duration) -> StepReport {
        if self.is_terminated() {
            return StepReport::default();
        }

        let events  = map_frame(&mut self.keyboard, hands, self.policy, now);
        let applied = apply_presses(&mut self.buffer, &self.keyboard, &events.pressed);

        if applied.outcome == Outcome::Exit {
            self.stop(StopReason::ExitKey);
        } else {
            render_overlay(
                frame,
                &self.keyboard,
                &events.pressed,
                events.cursor.as_ref(),
                self.buffer.as_str(),
                &self.theme,
            );
        }

        StepReport { cursor: events.cursor, pressed: events.pressed, typed: applied.typed }
    }

    /// Move to `Terminated`.  The first reason sticks.
    pub fn stop(&mut self, reason: StopReason) {
        if self.state == SessionState::Running {
            log::info!("session ending: {:?}", reason);
            self.state = SessionState::Terminated(reason);
        }
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn state(&self)    -> SessionState { self.state }
    pub fn text(&self)     -> &str         { self.buffer.as_str() }
    pub fn keyboard(&self) -> &Keyboard    { &self.keyboard }

    pub fn is_terminated(&self) -> bool {
        matches!(self.state, SessionState::Terminated(_))
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.state {
            SessionState::Terminated(r) => Some(r),
            SessionState::Running       => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Resources — camera + display, released exactly once
// ════════════════════════════════════════════════════════════════════════════

/// Owns the camera and the display.  [`Resources::release`] frees both and
/// is idempotent; `Drop` calls it, so every exit path releases.
pub struct Resources<C: FrameSource, D: Display> {
    camera:   C,
    display:  D,
    released: bool,
}

impl<C: FrameSource, D: Display> Resources<C, D> {
    pub fn new(camera: C, display: D) -> Self {
        Resources { camera, display, released: false }
    }

    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.camera.release();
        self.display.close();
        log::info!("camera and display released");
    }

    pub fn is_released(&self) -> bool { self.released }
}

impl<C: FrameSource, D: Display> Drop for Resources<C, D> {
    fn drop(&mut self) { self.release(); }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the frame loop
// ════════════════════════════════════════════════════════════════════════════

/// Capture → detect → map → apply → render → present → poll quit, until the
/// session terminates.  Resources are released before returning.
///
/// A failed grab is logged and retried at once.  With `max_failures` set,
/// that many consecutive failures end the session.
pub fn run<C, D, H, K>(
    mut resources: Resources<C, D>,
    detector:      &mut H,
    clock:         &K,
    session:       &mut Session,
    max_failures:  Option<u32>,
) -> StopReason
where
    C: FrameSource,
    D: Display,
    H: HandDetector + ?Sized,
    K: Clock + ?Sized,
{
    let mut failures = 0u32;

    while !session.is_terminated() {
        // 1. Grab a frame
        let mut frame = match resources.camera.read() {
            Ok(f) => {
                failures = 0;
                f
            }
            Err(CaptureError::Closed) => {
                log::warn!("video source closed");
                session.stop(StopReason::CameraClosed);
                break;
            }
            Err(CaptureError::Failed(e)) => {
                failures += 1;
                log::warn!("failed to capture image from webcam: {}", e);
                if max_failures.is_some_and(|cap| failures >= cap) {
                    log::error!("giving up after {} consecutive capture failures", failures);
                    session.stop(StopReason::CaptureFailed);
                    break;
                }
                if failures % FAILURE_REPORT_EVERY == 0 {
                    log::warn!("{} consecutive capture failures so far", failures);
                }
                continue;
            }
        };

        // 2. Detect, map, apply, render
        let hands = detector.find_hands(&frame);
        let report = session.step(&mut frame, &hands, clock.now());
        if !report.typed.is_empty() {
            log::debug!("applied {:?}, text {:?}", report.typed, session.text());
        }
        if session.is_terminated() {
            break;
        }

        // 3. Present and poll
        if !resources.display.present(&frame) {
            session.stop(StopReason::WindowClosed);
        } else if resources.display.quit_requested() {
            session.stop(StopReason::QuitKey);
        }
    }

    resources.release();
    session.stop_reason().unwrap_or(StopReason::WindowClosed)
}

/// Build everything `cfg` describes and run one session.
pub fn run_from_config(cfg: &AppConfig) -> Result<StopReason> {
    let (w, h) = (cfg.window.width, cfg.window.height);

    let camera = camera::open(&cfg.camera, w, h).context("camera unavailable")?;

    let (pointer_tx, mut detector) = match cfg.detector.kind {
        DetectorKind::Pointer => {
            let (tx, rx) = std::sync::mpsc::channel();
            (Some(tx), Box::new(PointerHands::new(rx)) as Box<dyn HandDetector>)
        }
        DetectorKind::Pipe => {
            let pipe = LandmarkPipe::spawn(&cfg.detector).context("hand detector unavailable")?;
            (None, Box::new(pipe) as Box<dyn HandDetector>)
        }
    };

    let display = Visualizer::new(&cfg.window.title, w, h, cfg.quit_key, pointer_tx)
        .context("cannot open display window")?;

    let mut session = Session::from_config(cfg);
    log::info!(
        "keyboard ready: {} keys, click delay {:?}, quit with '{}'",
        session.keyboard().len(),
        cfg.click_delay(),
        cfg.quit_key,
    );

    let clock = MonotonicClock::start();
    let reason = run(
        Resources::new(camera, display),
        detector.as_mut(),
        &clock,
        &mut session,
        cfg.max_capture_failures,
    );
    Ok(reason)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::collections::VecDeque;
    use std::rc::Rc;
    use air_keys::Key;

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    /// A clock that only moves when told to.
    #[derive(Default)]
    struct ManualClock {
        now: Cell<Duration>,
    }

    impl ManualClock {
        fn set(&self, t: Duration) { self.now.set(t); }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Duration { self.now.get() }
    }

    fn frame() -> Frame { Frame::filled(1280, 720, 0) }

    fn session() -> Session { Session::from_config(&AppConfig::default()) }

    fn over(session: &Session, label: &str) -> Hand {
        let b = session.keyboard().find(label).map(Key::bounds).expect("key exists");
        let (x, y) = (b.origin.x as f32, b.origin.y as f32);
        Hand::with_tips((x + 30.0, y + 35.0), (x + 45.0, y + 35.0))
    }

    fn away() -> Hand { Hand::with_tips((700.0, 500.0), (720.0, 500.0)) }

    // ── Session::step ────────────────────────────────────────────────────

    #[test]
    fn hover_is_typed_once_per_window() {
        let mut s = session();
        let h = over(&s, "H");
        s.step(&mut frame(), &[h.clone()], ms(0));
        assert_eq!(s.text(), "H");
        s.step(&mut frame(), &[h.clone()], ms(100));
        assert_eq!(s.text(), "H");
        s.step(&mut frame(), &[away()], ms(300));
        assert_eq!(s.text(), "H");
        s.step(&mut frame(), &[h], ms(500));
        assert_eq!(s.text(), "HH");
    }

    #[test]
    fn del_then_clear() {
        let mut s = session();
        let h = over(&s, "H");
        s.step(&mut frame(), &[h.clone()], ms(0));
        s.step(&mut frame(), &[h], ms(500));
        assert_eq!(s.text(), "HH");

        let del = over(&s, "DEL");
        s.step(&mut frame(), &[del], ms(600));
        assert_eq!(s.text(), "H");

        let clear = over(&s, "CLEAR");
        s.step(&mut frame(), &[clear], ms(700));
        assert_eq!(s.text(), "");
    }

    #[test]
    fn no_hands_types_nothing() {
        let mut s = session();
        let r = s.step(&mut frame(), &[], ms(0));
        assert_eq!(r, StepReport::default());
        assert_eq!(s.state(), SessionState::Running);
    }

    #[test]
    fn exit_key_terminates() {
        let mut s = session();
        let exit = over(&s, "EXIT");
        let r = s.step(&mut frame(), &[exit], ms(0));
        assert_eq!(r.typed, vec!["EXIT"]);
        assert_eq!(s.state(), SessionState::Terminated(StopReason::ExitKey));
        // later frames are ignored
        let h = over(&s, "H");
        s.step(&mut frame(), &[h], ms(1000));
        assert_eq!(s.text(), "");
    }

    #[test]
    fn first_stop_reason_sticks() {
        let mut s = session();
        s.stop(StopReason::QuitKey);
        s.stop(StopReason::ExitKey);
        assert_eq!(s.stop_reason(), Some(StopReason::QuitKey));
    }

    #[test]
    fn step_draws_overlay() {
        let mut s = session();
        let mut f = frame();
        s.step(&mut f, &[], ms(0));
        let q = s.keyboard().find("Q").map(Key::bounds).expect("Q");
        assert_eq!(f.pixel(q.origin.x as usize, q.origin.y as usize), Some(Theme::default().key_top));
    }

    // ── run() with fakes ─────────────────────────────────────────────────

    #[derive(Default)]
    struct Counters {
        camera_released: Cell<u32>,
        display_closed:  Cell<u32>,
        presented:       Cell<u32>,
    }

    /// Replays a script of capture results, then reports the stream closed.
    struct FakeCamera {
        script:   VecDeque<Result<(), ()>>,
        counters: Rc<Counters>,
    }

    impl FrameSource for FakeCamera {
        fn read(&mut self) -> Result<Frame, CaptureError> {
            match self.script.pop_front() {
                Some(Ok(()))  => Ok(Frame::filled(1280, 720, 0)),
                Some(Err(())) => Err(CaptureError::Failed("scripted".into())),
                None          => Err(CaptureError::Closed),
            }
        }
        fn release(&mut self) {
            self.counters.camera_released.set(self.counters.camera_released.get() + 1);
        }
    }

    struct FakeDisplay {
        counters:  Rc<Counters>,
        quit_at:   Option<u32>,
        closed_at: Option<u32>,
    }

    impl Display for FakeDisplay {
        fn present(&mut self, _frame: &Frame) -> bool {
            let n = self.counters.presented.get() + 1;
            self.counters.presented.set(n);
            self.closed_at != Some(n)
        }
        fn quit_requested(&mut self) -> bool {
            self.quit_at == Some(self.counters.presented.get())
        }
        fn close(&mut self) {
            self.counters.display_closed.set(self.counters.display_closed.get() + 1);
        }
    }

    /// Hands for each successful frame, and the clock time to read it at.
    struct FakeDetector<'a> {
        script: RefCell<VecDeque<(Duration, Vec<Hand>)>>,
        clock:  &'a ManualClock,
    }

    impl HandDetector for FakeDetector<'_> {
        fn find_hands(&mut self, _frame: &Frame) -> Vec<Hand> {
            let (t, hands) = self.script.borrow_mut().pop_front().unwrap_or_default();
            self.clock.set(t);
            hands
        }
    }

    fn rig(
        frames: Vec<Result<(), ()>>,
        quit_at: Option<u32>,
        closed_at: Option<u32>,
    ) -> (Resources<FakeCamera, FakeDisplay>, Rc<Counters>) {
        let counters = Rc::new(Counters::default());
        let camera  = FakeCamera { script: frames.into(), counters: counters.clone() };
        let display = FakeDisplay { counters: counters.clone(), quit_at, closed_at };
        (Resources::new(camera, display), counters)
    }

    fn assert_released_once(c: &Counters) {
        assert_eq!(c.camera_released.get(), 1);
        assert_eq!(c.display_closed.get(), 1);
    }

    #[test]
    fn exit_key_ends_run_and_releases_once() {
        let mut s = session();
        let (h, exit) = (over(&s, "H"), over(&s, "EXIT"));
        let clock = ManualClock::default();
        let mut det = FakeDetector {
            script: RefCell::new(VecDeque::from(vec![
                (ms(0), vec![h]),
                (ms(50), vec![exit]),
                (ms(100), vec![]),
            ])),
            clock: &clock,
        };
        let (res, counters) = rig(vec![Ok(()); 3], None, None);

        let reason = run(res, &mut det, &clock, &mut s, None);

        assert_eq!(reason, StopReason::ExitKey);
        assert_eq!(s.text(), "H");
        // the EXIT frame is never presented
        assert_eq!(counters.presented.get(), 1);
        assert_released_once(&counters);
    }

    #[test]
    fn quit_key_ends_run() {
        let mut s = session();
        let clock = ManualClock::default();
        let mut det = FakeDetector { script: RefCell::new(VecDeque::new()), clock: &clock };
        let (res, counters) = rig(vec![Ok(()); 10], Some(2), None);

        assert_eq!(run(res, &mut det, &clock, &mut s, None), StopReason::QuitKey);
        assert_eq!(counters.presented.get(), 2);
        assert_released_once(&counters);
    }

    #[test]
    fn closed_window_ends_run() {
        let mut s = session();
        let clock = ManualClock::default();
        let mut det = FakeDetector { script: RefCell::new(VecDeque::new()), clock: &clock };
        let (res, counters) = rig(vec![Ok(()); 10], None, Some(3));

        assert_eq!(run(res, &mut det, &clock, &mut s, None), StopReason::WindowClosed);
        assert_released_once(&counters);
    }

    #[test]
    fn capture_failures_are_retried() {
        let mut s = session();
        let h = over(&s, "A");
        let clock = ManualClock::default();
        let mut det = FakeDetector {
            script: RefCell::new(VecDeque::from(vec![(ms(0), vec![h])])),
            clock: &clock,
        };
        let (res, counters) = rig(vec![Err(()), Err(()), Ok(()), Err(())], None, None);

        assert_eq!(run(res, &mut det, &clock, &mut s, None), StopReason::CameraClosed);
        assert_eq!(s.text(), "A");
        assert_eq!(counters.presented.get(), 1);
        assert_released_once(&counters);
    }

    #[test]
    fn failure_cap_ends_run() {
        let mut s = session();
        let clock = ManualClock::default();
        let mut det = FakeDetector { script: RefCell::new(VecDeque::new()), clock: &clock };
        let (res, counters) = rig(vec![Err(()); 10], None, None);

        assert_eq!(run(res, &mut det, &clock, &mut s, Some(3)), StopReason::CaptureFailed);
        assert_eq!(counters.presented.get(), 0);
        assert_released_once(&counters);
    }

    #[test]
    fn dropping_unused_resources_releases_once() {
        let (mut res, counters) = rig(vec![], None, None);
        res.release();
        assert!(res.is_released());
        drop(res);
        assert_released_once(&counters);
    }
}
