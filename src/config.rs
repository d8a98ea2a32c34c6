use crate::classify::DEFAULT_FIST_THRESHOLD;
use crate::dispatch::DEFAULT_COOLDOWN;
use crate::protocol::DEFAULT_BAUD;
use crate::serial::{Handshake, DEFAULT_BOOT_WINDOW, DEFAULT_READ_TIMEOUT, DEFAULT_SETTLE};
use crate::stability::DEFAULT_STABLE_FRAMES;
use std::time::Duration;

pub const DEFAULT_TRACKER: &str = "python3 hand_tracker.py";

#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM6";
#[cfg(not(windows))]
pub const DEFAULT_PORT: &str = "/dev/ttyACM0";

/// Runtime settings. Fixed defaults, each overridable from the environment.
///
/// - `GESTURE_PANEL_PORT`, `GESTURE_PANEL_BAUD`, `GESTURE_PANEL_READ_TIMEOUT_MS`
/// - `GESTURE_PANEL_SETTLE_MS`, `GESTURE_PANEL_BOOT_WINDOW_MS`
/// - `GESTURE_PANEL_COOLDOWN_MS`, `GESTURE_PANEL_STABLE_FRAMES`, `GESTURE_PANEL_FIST_THRESH`
/// - `GESTURE_PANEL_TRACKER`
#[derive(Debug, Clone, PartialEq)]
pub struct PanelConfig {
    pub port: String,
    pub baud: u32,
    pub read_timeout: Duration,
    pub settle: Duration,
    pub boot_window: Duration,
    pub cooldown: Duration,
    pub stable_frames: u32,
    pub fist_threshold: f64,
    pub tracker_command: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baud: DEFAULT_BAUD,
            read_timeout: DEFAULT_READ_TIMEOUT,
            settle: DEFAULT_SETTLE,
            boot_window: DEFAULT_BOOT_WINDOW,
            cooldown: DEFAULT_COOLDOWN,
            stable_frames: DEFAULT_STABLE_FRAMES,
            fist_threshold: DEFAULT_FIST_THRESHOLD,
            tracker_command: DEFAULT_TRACKER.to_string(),
        }
    }
}

impl PanelConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Bad values keep the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let env = Env { lookup };
        let cfg = Self {
            port: env.string("GESTURE_PANEL_PORT", &d.port),
            baud: env.parse("GESTURE_PANEL_BAUD", d.baud),
            read_timeout: env.millis("GESTURE_PANEL_READ_TIMEOUT_MS", d.read_timeout),
            settle: env.millis("GESTURE_PANEL_SETTLE_MS", d.settle),
            boot_window: env.millis("GESTURE_PANEL_BOOT_WINDOW_MS", d.boot_window),
            cooldown: env.millis("GESTURE_PANEL_COOLDOWN_MS", d.cooldown),
            stable_frames: env.parse("GESTURE_PANEL_STABLE_FRAMES", d.stable_frames).max(1),
            fist_threshold: env.parse("GESTURE_PANEL_FIST_THRESH", d.fist_threshold),
            tracker_command: env.string("GESTURE_PANEL_TRACKER", &d.tracker_command),
        };
        log::debug!("{:?}", cfg);
        cfg
    }

    pub fn handshake(&self) -> Handshake {
        Handshake {
            settle: self.settle,
            boot_window: self.boot_window,
        }
    }
}

struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    fn raw(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn string(&self, name: &str, default: &str) -> String {
        self.raw(name).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&self, name: &str, default: T) -> T
    where
        T: std::str::FromStr + std::fmt::Display,
    {
        match self.raw(name) {
            None => default,
            Some(v) => v.parse::<T>().unwrap_or_else(|_| {
                log::warn!("Ignoring {}='{}', using {}", name, v, default);
                default
            }),
        }
    }

    fn millis(&self, name: &str, default: Duration) -> Duration {
        Duration::from_millis(self.parse(name, default.as_millis() as u64))
    }
}
