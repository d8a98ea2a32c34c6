//! Replay a recorded tracker JSON-lines file through the gesture engine.
//!
//! Usage: cargo run --example replay -- recording.jsonl
//! Frames are stamped at 30 fps; commands are printed instead of sent.

use gesture_panel::{
    Command, CommandSink, Engine, FrameEvent, FrameSource, LineSource, PanelConfig,
};
use std::fs::File;
use std::io::BufReader;
use std::time::{Duration, Instant};

const FRAME_INTERVAL: Duration = Duration::from_micros(33_333);

struct PrintSink {
    frame: u64,
}

impl CommandSink for PrintSink {
    fn send(&mut self, cmd: Command) -> gesture_panel::Result<()> {
        println!("frame {:>6}  -> {}", self.frame, cmd);
        Ok(())
    }
}

fn main() {
    env_logger::init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: replay <recording.jsonl>");
        std::process::exit(2);
    };

    let file = match File::open(&path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to open {}: {}", path, e);
            std::process::exit(1);
        }
    };

    let cfg = PanelConfig::from_env();
    let mut engine = Engine::from_config(&cfg);
    let mut source = LineSource::new(BufReader::new(file));
    let mut sink = PrintSink { frame: 0 };
    let start = Instant::now();
    let mut skipped = 0u64;

    loop {
        let event = match source.next_frame() {
            Ok(FrameEvent::Quit) => break,
            Ok(event) => event,
            Err(e) => {
                eprintln!("skipping line: {}", e);
                skipped += 1;
                continue;
            }
        };

        let hand = match &event {
            FrameEvent::Hand(frame) => Some(frame),
            _ => None,
        };
        let now = start + FRAME_INTERVAL * sink.frame as u32;
        let report = engine.step(hand, now, &mut sink);
        log::debug!(
            "frame {} raw={} ({}) stable={}",
            sink.frame,
            report.raw,
            report.raw_count,
            report.stable
        );
        sink.frame += 1;
    }

    println!("\nReplayed {} frames ({} skipped)", sink.frame, skipped);
}
