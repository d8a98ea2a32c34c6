//! Watch the hand tracker and drive the panel over serial.
//!
//! Usage: cargo run --release
//! Settings come from `GESTURE_PANEL_*` environment variables; press `q` in the
//! tracker window to stop.

use gesture_panel::{Engine, FrameSource, PanelConfig, ProcessSource, SerialLink, Session};

fn main() {
    env_logger::init();

    let cfg = PanelConfig::from_env();

    // No camera, no loop.
    let mut source = match ProcessSource::spawn(&cfg.tracker_command) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start hand tracker: {}", e);
            std::process::exit(1);
        }
    };

    let mut link = match SerialLink::open(&cfg.port, cfg.baud, cfg.read_timeout) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to open {}: {}", cfg.port, e);
            // exit() skips destructors; release the camera first.
            if let Err(e) = source.close() {
                log::warn!("Hand tracker shutdown failed: {}", e);
            }
            std::process::exit(1);
        }
    };

    // Both handles belong to the session from here on.
    let handshake = link.handshake(&cfg.handshake());
    let mut session = Session::new(source, link, Engine::from_config(&cfg));
    if let Err(e) = handshake {
        eprintln!("Serial handshake failed: {}", e);
        session.shutdown();
        std::process::exit(1);
    }

    let result = session.run();
    session.shutdown();

    match result {
        Ok(stats) => {
            println!(
                "\nTotal: {} frames, {} skipped, {} commands sent, {} send failures, {} serial read errors",
                stats.frames,
                stats.skipped_frames,
                stats.commands_sent,
                stats.send_failures,
                stats.serial_read_errors
            );
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
