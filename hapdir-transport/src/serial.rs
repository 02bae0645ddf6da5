//! Serial-line link to the wearable/hand-held actuator (ESP32 over USB).

use std::path::Path;
use std::time::Duration;

use serial2::SerialPort;

use crate::error::TransportError;
use crate::gateway::CommandSink;

pub const DEFAULT_BAUD_RATE: u32 = 115200;

/// Upper bound on a single write so a wedged port cannot stall the worker
/// forever.
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Writes each command as one newline-terminated line.
pub struct SerialSink {
    port: SerialPort,
    name: String,
}

impl SerialSink {
    pub fn open(path: impl AsRef<Path>, baud_rate: u32) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let mut port = SerialPort::open(path, baud_rate)?;
        port.set_write_timeout(WRITE_TIMEOUT)?;
        Ok(Self {
            port,
            name: format!("SerialSink({})", path.display()),
        })
    }

    /// Lists candidate device paths for the actuator.
    pub fn available_ports() -> Result<Vec<String>, TransportError> {
        Ok(SerialPort::available_ports()?
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect())
    }
}

impl CommandSink for SerialSink {
    fn describe(&self) -> String {
        self.name.clone()
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let mut line = Vec::with_capacity(bytes.len() + 1);
        line.extend_from_slice(bytes);
        line.push(b'\n');
        self.port.write_all(&line).map_err(TransportError::from_io)
    }
}
