use crate::protocol;
use crate::types::FrameEvent;
use crate::{PanelError, Result};
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdout, Command, Stdio};

/// Upstream capability: yields one tracked-hand event per camera frame.
///
/// `Err` is a transient read failure for that frame; the caller skips it.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<FrameEvent>;

    /// Release whatever the source holds. Called once at teardown.
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<FrameEvent> {
        (**self).next_frame()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }
}

/// Reads tracker JSON lines from any buffered reader.
///
/// End of input is reported as `FrameEvent::Quit`.
pub struct LineSource<R: BufRead> {
    reader: R,
    line: String,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> FrameSource for LineSource<R> {
    fn next_frame(&mut self) -> Result<FrameEvent> {
        loop {
            self.line.clear();
            if self.reader.read_line(&mut self.line)? == 0 {
                log::info!("Tracker stream ended");
                return Ok(FrameEvent::Quit);
            }
            if let Some(event) = protocol::parse_tracker_line(&self.line)? {
                return Ok(event);
            }
        }
    }
}

/// Hand tracker running as a child process that prints JSON lines on stdout.
///
/// The child owns the camera and the preview window; it reports the quit key
/// as `{"quit":true}`.
pub struct ProcessSource {
    child: Child,
    lines: LineSource<BufReader<ChildStdout>>,
    closed: bool,
}

impl ProcessSource {
    /// Spawn `command_line` (program followed by whitespace-separated args).
    ///
    /// Failure here is the fatal "capture could not be opened" case.
    pub fn spawn(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts
            .next()
            .ok_or_else(|| PanelError::CaptureOpen("empty tracker command".into()))?;

        log::info!("Starting hand tracker: {}", command_line);
        let mut child = Command::new(program)
            .args(parts)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| PanelError::CaptureOpen(format!("{}: {}", program, e)))?;

        let stdout = match child.stdout.take() {
            Some(s) => s,
            None => {
                let _ = child.kill();
                return Err(PanelError::CaptureOpen("tracker stdout not captured".into()));
            }
        };

        Ok(Self {
            child,
            lines: LineSource::new(BufReader::new(stdout)),
            closed: false,
        })
    }

    /// OS process id of the tracker child.
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl FrameSource for ProcessSource {
    fn next_frame(&mut self) -> Result<FrameEvent> {
        self.lines.next_frame()
    }

    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        if self.child.try_wait()?.is_none() {
            self.child.kill()?;
        }
        let status = self.child.wait()?;
        log::info!("Hand tracker exited: {}", status);
        Ok(())
    }
}

impl Drop for ProcessSource {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Hand tracker shutdown failed: {}", e);
        }
    }
}
