use crate::dispatch::CommandSink;
use crate::protocol::{self, LineBuffer};
use crate::session::Inbound;
use crate::types::Command;
use crate::{PanelError, Result};
use serialport::{ClearBuffer, SerialPort};
use std::io::{Read, Write};
use std::time::{Duration, Instant};

/// Default delay after opening, covering the microcontroller's reset-on-connect.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(2000);
/// Default window for draining the boot banner after the settle delay.
pub const DEFAULT_BOOT_WINDOW: Duration = Duration::from_millis(2500);
/// Default read timeout for the serial handle.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// The few operations the link needs beyond `Read + Write`.
pub trait Port: Read + Write {
    /// Bytes ready to read without blocking.
    fn bytes_available(&mut self) -> Result<u32>;
    /// Discard stale input and output.
    fn clear_buffers(&mut self) -> Result<()>;
}

impl Port for Box<dyn SerialPort> {
    fn bytes_available(&mut self) -> Result<u32> {
        Ok(self.bytes_to_read()?)
    }

    fn clear_buffers(&mut self) -> Result<()> {
        Ok(self.clear(ClearBuffer::All)?)
    }
}

/// Timing of the once-per-connection startup sequence.
#[derive(Debug, Clone, Copy)]
pub struct Handshake {
    pub settle: Duration,
    pub boot_window: Duration,
}

impl Default for Handshake {
    fn default() -> Self {
        Self {
            settle: DEFAULT_SETTLE,
            boot_window: DEFAULT_BOOT_WINDOW,
        }
    }
}

/// Line-oriented serial link to the panel microcontroller.
///
/// Outbound commands are `NAME\n`. Inbound lines are decoded permissively and
/// only logged; nothing the device says feeds back into gesture state.
pub struct SerialLink<P: Port = Box<dyn SerialPort>> {
    port: P,
    rx: LineBuffer,
    name: String,
}

impl SerialLink {
    /// Open `port_name` at `baud` with a short read timeout for polling.
    pub fn open(port_name: &str, baud: u32, read_timeout: Duration) -> Result<Self> {
        let port = serialport::new(port_name, baud)
            .timeout(read_timeout)
            .open()?;
        log::info!("Opened serial port {} @ {}", port_name, baud);
        Ok(Self::from_port(port, port_name))
    }
}

impl<P: Port> SerialLink<P> {
    pub fn from_port(port: P, name: &str) -> Self {
        Self {
            port,
            rx: LineBuffer::new(),
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the startup sequence: settle, flush both directions, then drain the
    /// boot banner for `boot_window`. Returns the lines seen during the drain.
    pub fn handshake(&mut self, hs: &Handshake) -> Result<Vec<String>> {
        log::info!(
            "Waiting {:?} for {} to settle after connect",
            hs.settle,
            self.name
        );
        std::thread::sleep(hs.settle);

        self.port.clear_buffers()?;
        self.rx.clear();
        log::info!("Connected to panel on {}", self.name);

        let deadline = Instant::now() + hs.boot_window;
        let mut boot = Vec::new();
        while Instant::now() < deadline {
            let lines = self.poll_lines()?;
            if lines.is_empty() {
                std::thread::sleep(Duration::from_millis(10));
            }
            boot.extend(lines);
        }
        Ok(boot)
    }

    /// Read whatever is already buffered and return the completed lines.
    /// Never waits for data that has not arrived.
    pub fn poll_lines(&mut self) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let available = self.port.bytes_available()? as usize;
            if available == 0 {
                break;
            }
            let mut chunk = vec![0u8; available];
            let n = match self.port.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
                Err(e) => return Err(e.into()),
            };
            if n == 0 {
                break;
            }
            for line in self.rx.push(&chunk[..n]) {
                log::info!("device: {}", line);
                lines.push(line);
            }
        }
        Ok(lines)
    }

    /// Write one command line. `NOOP` is a no-op.
    pub fn send_command(&mut self, cmd: Command) -> Result<()> {
        let Some(bytes) = protocol::encode_command(cmd) else {
            return Ok(());
        };
        self.port
            .write_all(&bytes)
            .and_then(|_| self.port.flush())
            .map_err(|e| PanelError::SendFailed(format!("{} on {}: {}", cmd, self.name, e)))
    }

    /// Consume the link, releasing the handle.
    pub fn into_port(self) -> P {
        self.port
    }
}

impl<P: Port> CommandSink for SerialLink<P> {
    fn send(&mut self, cmd: Command) -> Result<()> {
        self.send_command(cmd)
    }
}

impl<P: Port> Inbound for SerialLink<P> {
    fn poll_lines(&mut self) -> Result<Vec<String>> {
        SerialLink::<P>::poll_lines(self)
    }
}
