use crate::classify::classify_with;
use crate::config::PanelConfig;
use crate::dispatch::{CommandSink, Dispatcher, Outcome};
use crate::stability::StabilityTracker;
use crate::tracker::FrameSource;
use crate::types::{FrameEvent, GestureLabel, HandFrame};
use crate::{PanelError, Result};
use std::time::{Duration, Instant};

const RATE_REPORT_INTERVAL: Duration = Duration::from_secs(3);

/// Inbound side of the panel link: lines the device printed since the last poll.
pub trait Inbound {
    fn poll_lines(&mut self) -> Result<Vec<String>>;
}

/// Everything the loop learned from one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    pub hand_present: bool,
    pub raw: GestureLabel,
    pub raw_count: u32,
    pub stable: GestureLabel,
    pub outcome: Outcome,
}

/// Classify, debounce, dispatch: the per-frame pipeline with its state.
#[derive(Debug, Clone)]
pub struct Engine {
    fist_threshold: f64,
    stability: StabilityTracker,
    dispatcher: Dispatcher,
}

impl Engine {
    pub fn new(stable_frames: u32, cooldown: Duration, fist_threshold: f64) -> Self {
        Self {
            fist_threshold,
            stability: StabilityTracker::new(stable_frames),
            dispatcher: Dispatcher::new(cooldown),
        }
    }

    pub fn from_config(cfg: &PanelConfig) -> Self {
        Self::new(cfg.stable_frames, cfg.cooldown, cfg.fist_threshold)
    }

    pub fn stability(&self) -> &StabilityTracker {
        &self.stability
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Process one frame. `hand` is `None` when the tracker found no hand.
    pub fn step<S: CommandSink + ?Sized>(
        &mut self,
        hand: Option<&HandFrame>,
        now: Instant,
        sink: &mut S,
    ) -> FrameReport {
        let raw = hand
            .map(|f| classify_with(f, self.fist_threshold))
            .unwrap_or(GestureLabel::None);
        let stable = self.stability.update(hand.is_some(), raw);
        let outcome = self.dispatcher.dispatch(stable, now, sink);

        FrameReport {
            hand_present: hand.is_some(),
            raw,
            raw_count: self.stability.state().raw_count,
            stable,
            outcome,
        }
    }
}

/// Counters kept across one run of the loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub frames: u64,
    pub skipped_frames: u64,
    pub commands_sent: u64,
    pub send_failures: u64,
    pub serial_read_errors: u64,
}

/// Owns the frame source and the panel link for the lifetime of the loop.
///
/// Both are released exactly once, by `shutdown` or on drop, whichever comes
/// first. A failure releasing one does not stop the other from being released.
pub struct Session<F: FrameSource, L: CommandSink + Inbound> {
    source: Option<F>,
    link: Option<L>,
    engine: Engine,
    stats: Stats,
}

impl<F: FrameSource, L: CommandSink + Inbound> Session<F, L> {
    pub fn new(source: F, link: L, engine: Engine) -> Self {
        Self {
            source: Some(source),
            link: Some(link),
            engine,
            stats: Stats::default(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none() && self.link.is_none()
    }

    /// Drive frames until the source reports quit.
    ///
    /// Per-frame problems (bad tracker line, serial read error, failed write)
    /// are logged and the loop carries on.
    pub fn run(&mut self) -> Result<Stats> {
        let (Some(source), Some(link)) = (self.source.as_mut(), self.link.as_mut()) else {
            return Err(PanelError::SessionClosed);
        };

        let threshold = self.engine.stability().threshold();
        let start = Instant::now();
        let mut last_report = start;

        loop {
            match link.poll_lines() {
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Serial read error: {}", e);
                    self.stats.serial_read_errors += 1;
                }
            }

            let event = match source.next_frame() {
                Ok(event) => event,
                Err(e) => {
                    log::warn!("Frame read failed: {}; skipping", e);
                    self.stats.skipped_frames += 1;
                    continue;
                }
            };

            let hand = match &event {
                FrameEvent::Quit => {
                    log::info!("Quit requested");
                    break;
                }
                FrameEvent::Hand(frame) => Some(frame),
                FrameEvent::NoHand => None,
            };

            let report = self.engine.step(hand, Instant::now(), link);
            self.stats.frames += 1;
            match report.outcome {
                Outcome::Sent(_) => self.stats.commands_sent += 1,
                Outcome::Failed(_) => self.stats.send_failures += 1,
                _ => {}
            }

            log::debug!(
                "raw={} ({}/{}) stable={}",
                report.raw,
                report.raw_count,
                threshold,
                report.stable
            );

            let now = Instant::now();
            if now.duration_since(last_report) >= RATE_REPORT_INTERVAL {
                let elapsed = now.duration_since(start).as_secs_f64();
                log::info!(
                    "{} frames in {:.1}s ({:.1} Hz)",
                    self.stats.frames,
                    elapsed,
                    self.stats.frames as f64 / elapsed
                );
                last_report = now;
            }
        }

        Ok(self.stats)
    }

    /// Release the source and the link. Safe to call more than once.
    pub fn shutdown(&mut self) {
        if let Some(mut source) = self.source.take() {
            if let Err(e) = source.close() {
                log::warn!("Failed to close hand tracker: {}", e);
            }
        }
        if let Some(link) = self.link.take() {
            drop(link);
            log::info!("Serial link closed");
        }
    }
}

impl<F: FrameSource, L: CommandSink + Inbound> Drop for Session<F, L> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tests::{hand, F};
    use crate::dispatch::tests::RecordingSink;
    use crate::protocol::tests::hand_line;
    use crate::serial::tests::FakePort;
    use crate::serial::SerialLink;
    use crate::tracker::LineSource;
    use crate::types::Command;
    use std::io::Cursor;

    impl Inbound for RecordingSink {
        fn poll_lines(&mut self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn lines(frames: &[Option<HandFrame>]) -> String {
        let mut out = String::new();
        for f in frames {
            match f {
                Some(frame) => out.push_str(&hand_line(frame)),
                None => out.push_str(r#"{"hands":[]}"#),
            }
            out.push('\n');
        }
        out
    }

    fn fist() -> HandFrame {
        hand([F::Curl, F::Curl, F::Curl, F::Curl])
    }

    #[test]
    fn test_engine_needs_n_frames_before_send() {
        let mut engine = Engine::new(6, Duration::from_millis(350), 0.10);
        let mut sink = RecordingSink::default();
        let now = Instant::now();
        let frame = fist();

        for _ in 0..5 {
            let r = engine.step(Some(&frame), now, &mut sink);
            assert_eq!(r.raw, GestureLabel::Fist);
            assert_eq!(r.stable, GestureLabel::None);
        }
        let r = engine.step(Some(&frame), now, &mut sink);
        assert_eq!(r.outcome, Outcome::Sent(Command::Arm));
        assert_eq!(r.raw_count, 6);
    }

    #[test]
    fn test_engine_hand_loss_allows_retrigger() {
        let mut engine = Engine::new(2, Duration::from_millis(350), 0.10);
        let mut sink = RecordingSink::default();
        let base = Instant::now();
        let frame = fist();

        engine.step(Some(&frame), base, &mut sink);
        engine.step(Some(&frame), base, &mut sink);
        let r = engine.step(None, base + Duration::from_millis(30), &mut sink);
        assert!(!r.hand_present);
        assert_eq!(r.stable, GestureLabel::None);
        assert_eq!(r.outcome, Outcome::Committed);

        let later = base + Duration::from_secs(1);
        engine.step(Some(&frame), later, &mut sink);
        engine.step(Some(&frame), later, &mut sink);
        assert_eq!(sink.sent, vec![Command::Arm, Command::Arm]);
    }

    #[test]
    fn test_session_sends_once_for_held_fist() {
        let frames: Vec<Option<HandFrame>> = (0..26).map(|_| Some(fist())).collect();
        let source = LineSource::new(Cursor::new(lines(&frames)));
        let link = SerialLink::from_port(FakePort::default(), "fake");
        let mut session = Session::new(source, link, Engine::new(6, Duration::ZERO, 0.10));

        let stats = session.run().unwrap();
        assert_eq!(stats.frames, 26);
        assert_eq!(stats.commands_sent, 1);

        let link = session.link.take().unwrap();
        assert_eq!(link.into_port().written, b"ARM\n");
    }

    #[test]
    fn test_session_skips_bad_frames_without_touching_state() {
        let mut input = lines(&[Some(fist()), Some(fist()), Some(fist())]);
        input.push_str("{\"error\":\"frame read failed\"}\n");
        input.push_str("garbage\n");
        input.push_str(&lines(&[Some(fist()), Some(fist()), Some(fist())]));

        let source = LineSource::new(Cursor::new(input));
        let mut session = Session::new(
            source,
            RecordingSink::default(),
            Engine::new(6, Duration::ZERO, 0.10),
        );
        let stats = session.run().unwrap();
        assert_eq!(stats.skipped_frames, 2);
        assert_eq!(stats.frames, 6);
        assert_eq!(stats.commands_sent, 1);
        assert_eq!(session.link.as_ref().unwrap().sent, vec![Command::Arm]);
    }

    #[test]
    fn test_session_stops_on_quit() {
        let mut input = lines(&[None, None]);
        input.push_str("{\"quit\":true}\n");
        input.push_str(&lines(&vec![Some(fist()); 10]));

        let source = LineSource::new(Cursor::new(input));
        let mut session = Session::new(
            source,
            RecordingSink::default(),
            Engine::new(1, Duration::ZERO, 0.10),
        );
        let stats = session.run().unwrap();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.commands_sent, 0);
    }

    /// Link whose reads always fail but whose writes go through.
    #[derive(Default)]
    struct DeafLink {
        sent: Vec<Command>,
    }

    impl CommandSink for DeafLink {
        fn send(&mut self, cmd: Command) -> Result<()> {
            self.sent.push(cmd);
            Ok(())
        }
    }

    impl Inbound for DeafLink {
        fn poll_lines(&mut self) -> Result<Vec<String>> {
            Err(PanelError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "port reset",
            )))
        }
    }

    #[test]
    fn test_serial_read_errors_do_not_stop_dispatch() {
        let frames: Vec<Option<HandFrame>> = (0..8).map(|_| Some(fist())).collect();
        let source = LineSource::new(Cursor::new(lines(&frames)));
        let mut session = Session::new(
            source,
            DeafLink::default(),
            Engine::new(6, Duration::ZERO, 0.10),
        );

        let stats = session.run().unwrap();
        assert_eq!(stats.frames, 8);
        assert_eq!(stats.commands_sent, 1);
        assert!(stats.serial_read_errors > 0);
        assert_eq!(session.link.as_ref().unwrap().sent, vec![Command::Arm]);
    }

    struct StubbornSource;

    impl FrameSource for StubbornSource {
        fn next_frame(&mut self) -> Result<FrameEvent> {
            Ok(FrameEvent::Quit)
        }

        fn close(&mut self) -> Result<()> {
            Err(PanelError::CaptureOpen("already gone".into()))
        }
    }

    #[test]
    fn test_shutdown_releases_everything_once() {
        let mut session = Session::new(
            StubbornSource,
            RecordingSink::default(),
            Engine::new(6, Duration::ZERO, 0.10),
        );
        session.run().unwrap();
        session.shutdown();
        assert!(session.is_closed());
        session.shutdown();
        assert!(matches!(session.run(), Err(PanelError::SessionClosed)));
    }
}
