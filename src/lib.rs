//! # gesture_panel - hand-gesture control for a serial alarm panel
//!
//! Turns per-frame hand landmarks into panel commands. Provides:
//! - Geometric gesture classification (OPEN, FIST, POINT, PANIC)
//! - Run-length debouncing with instant reset when the hand is lost
//! - Edge-triggered, cooldown-limited command dispatch (`ARM`, `DISARM`, `TRIP`, `PANIC`)
//! - A serial link with the connect-time handshake the panel firmware expects
//!
//! ## Quick Start
//! ```no_run
//! use gesture_panel::{Engine, PanelConfig, ProcessSource, SerialLink, Session};
//!
//! let cfg = PanelConfig::from_env();
//! let source = ProcessSource::spawn(&cfg.tracker_command).unwrap();
//! let mut link = SerialLink::open(&cfg.port, cfg.baud, cfg.read_timeout).unwrap();
//! link.handshake(&cfg.handshake()).unwrap();
//!
//! let mut session = Session::new(source, link, Engine::from_config(&cfg));
//! let stats = session.run().unwrap();
//! println!("sent {} commands", stats.commands_sent);
//! ```

pub mod error;
pub mod types;
pub mod protocol;
pub mod classify;
pub mod stability;
pub mod dispatch;
pub mod serial;
pub mod tracker;
pub mod config;
pub mod session;

pub use classify::classify;
pub use config::PanelConfig;
pub use dispatch::{CommandSink, DispatchState, Dispatcher, Outcome};
pub use error::PanelError;
pub use serial::{Handshake, SerialLink};
pub use session::{Engine, FrameReport, Session, Stats};
pub use stability::{StabilityState, StabilityTracker};
pub use tracker::{FrameSource, LineSource, ProcessSource};
pub use types::*;

/// Result type alias for gesture_panel operations.
pub type Result<T> = std::result::Result<T, PanelError>;
