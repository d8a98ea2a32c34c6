use crate::types::{Command, GestureLabel};
use crate::Result;
use std::time::{Duration, Instant};

/// Default minimum spacing between two transmitted commands.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(350);

/// Outbound capability: deliver one command to the panel.
pub trait CommandSink {
    fn send(&mut self, cmd: Command) -> Result<()>;
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn send(&mut self, cmd: Command) -> Result<()> {
        (**self).send(cmd)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for Box<S> {
    fn send(&mut self, cmd: Command) -> Result<()> {
        (**self).send(cmd)
    }
}

/// Edge-trigger bookkeeping owned by the dispatcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchState {
    /// Last stable gesture whose transition was finalized.
    pub stable_prev: GestureLabel,
    /// When the last command went out. `None` means never.
    pub last_send_time: Option<Instant>,
}

/// What one `dispatch` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stable gesture unchanged.
    Idle,
    /// Transition to a NOOP gesture committed without sending.
    Committed,
    /// Command written to the sink.
    Sent(Command),
    /// Cooldown still running; transition stays pending.
    Deferred(Command),
    /// Sink rejected the command; transition stays pending.
    Failed(Command),
}

impl Outcome {
    pub fn sent(&self) -> Option<Command> {
        match self {
            Outcome::Sent(cmd) => Some(*cmd),
            _ => None,
        }
    }
}

/// Maps stable-gesture transitions to rate-limited commands.
///
/// A command fires once per confirmed transition. A transition blocked by the
/// cooldown (or by a failed write) is not committed, so it is re-evaluated on
/// every later frame until it goes out or the stable gesture moves on.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    cooldown: Duration,
    state: DispatchState,
    pending: Option<Command>,
}

impl Dispatcher {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            state: DispatchState::default(),
            pending: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    /// Command waiting on cooldown or on a retry after a failed write.
    pub fn pending(&self) -> Option<Command> {
        self.pending
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        self.state
            .last_send_time
            .map_or(true, |t| now.saturating_duration_since(t) >= self.cooldown)
    }

    fn supersede(&mut self, next: Option<Command>) {
        if let Some(dropped) = self.pending.take() {
            if Some(dropped) != next {
                log::warn!("pending {} dropped before it could be sent", dropped);
            }
        }
    }

    /// Evaluate the current stable gesture. Call once per frame, after the tracker.
    pub fn dispatch<S: CommandSink + ?Sized>(
        &mut self,
        stable: GestureLabel,
        now: Instant,
        sink: &mut S,
    ) -> Outcome {
        if stable == self.state.stable_prev {
            self.supersede(None);
            return Outcome::Idle;
        }

        let cmd = stable.command();
        if cmd.is_noop() {
            self.supersede(None);
            self.state.stable_prev = stable;
            return Outcome::Committed;
        }

        self.supersede(Some(cmd));
        if !self.cooldown_elapsed(now) {
            log::trace!("{} deferred by cooldown", cmd);
            self.pending = Some(cmd);
            return Outcome::Deferred(cmd);
        }

        match sink.send(cmd) {
            Ok(()) => {
                log::info!("sent {}", cmd);
                self.state.last_send_time = Some(now);
                self.state.stable_prev = stable;
                Outcome::Sent(cmd)
            }
            Err(e) => {
                log::warn!("failed to send {}: {} (will retry)", cmd, e);
                self.pending = Some(cmd);
                Outcome::Failed(cmd)
            }
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
