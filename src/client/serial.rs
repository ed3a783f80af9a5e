use log::{debug, info};
use serialport::{ClearBuffer, SerialPort, SerialPortType};
use std::io::{self, BufRead, BufReader, Write};
use std::thread;
use thiserror::Error;

use crate::config::SerialConfig;
use crate::protocol::Command;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open serial port {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },

    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("serial I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serial port is closed")]
    Closed,
}

/// Line-oriented link to the microcontroller.
pub trait Transport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Next line without its trailing whitespace. Empty on read timeout.
    fn read_line(&mut self) -> Result<String, TransportError>;

    fn close(&mut self);

    fn send(&mut self, command: &Command) -> Result<(), TransportError> {
        self.write(command.as_bytes())
    }
}

/// Opens a fresh [`Transport`] for each exchange that needs one.
pub trait Connector {
    fn connect(&self) -> Result<Box<dyn Transport>, TransportError>;
}

pub struct SerialTransport {
    port_name: String,
    reader: Option<BufReader<Box<dyn SerialPort>>>,
    /// Bytes of a line cut short by a read timeout.
    partial: Vec<u8>,
}

impl SerialTransport {
    pub fn open(config: &SerialConfig) -> Result<Self, TransportError> {
        info!(
            "Opening serial port {} at {} baud",
            config.port, config.baud_rate
        );

        let port = serialport::new(&config.port, config.baud_rate)
            .timeout(config.read_timeout())
            .open()
            .map_err(|source| TransportError::Open {
                port: config.port.clone(),
                source,
            })?;

        // Opening the port resets the board; give its bootloader time to hand over
        thread::sleep(config.boot_delay());

        port.clear(ClearBuffer::Input)?;
        debug!("Serial port {} ready", config.port);

        Ok(Self {
            port_name: config.port.clone(),
            reader: Some(BufReader::new(port)),
            partial: Vec::new(),
        })
    }
}

impl Transport for SerialTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let reader = self.reader.as_mut().ok_or(TransportError::Closed)?;
        debug!("serial write: {:?}", String::from_utf8_lossy(bytes));

        let port = reader.get_mut();
        port.write_all(bytes)?;
        port.flush()?;
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, TransportError> {
        let reader = self.reader.as_mut().ok_or(TransportError::Closed)?;

        match read_line_into(reader, &mut self.partial)? {
            Some(line) => {
                debug!("serial read: {:?}", line);
                Ok(line)
            }
            None => {
                debug!(
                    "serial read timed out on {} ({} bytes of a partial line kept)",
                    self.port_name,
                    self.partial.len()
                );
                Ok(String::new())
            }
        }
    }

    fn close(&mut self) {
        self.partial.clear();
        if self.reader.take().is_some() {
            debug!("Closing serial port {}", self.port_name);
        }
    }
}

impl Drop for SerialTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reads up to the next `\n`, accumulating into `partial`.
///
/// On timeout the bytes read so far stay in `partial` and `None` is returned,
/// so the next call completes the same line instead of yielding a fragment.
fn read_line_into<R: BufRead>(
    reader: &mut R,
    partial: &mut Vec<u8>,
) -> Result<Option<String>, TransportError> {
    match reader.read_until(b'\n', partial) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let line = String::from_utf8_lossy(partial).trim_end().to_string();
    partial.clear();
    Ok(Some(line))
}

/// Connects to the configured serial device.
#[derive(Debug, Clone)]
pub struct SerialConnector {
    config: SerialConfig,
}

impl SerialConnector {
    pub fn new(config: SerialConfig) -> Self {
        Self { config }
    }
}

impl Connector for SerialConnector {
    fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        Ok(Box::new(SerialTransport::open(&self.config)?))
    }
}

/// Serial devices visible to the host, with a short kind label.
pub fn available_ports() -> Result<Vec<(String, &'static str)>, TransportError> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let kind = match p.port_type {
                SerialPortType::UsbPort(_) => "USB",
                SerialPortType::BluetoothPort => "Bluetooth",
                SerialPortType::PciPort => "PCI",
                SerialPortType::Unknown => "Unknown",
            };
            (p.port_name, kind)
        })
        .collect())
}
