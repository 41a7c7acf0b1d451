use std::io::{self, BufRead, BufReader};
use std::time::Duration;

use serialport::{SerialPort, SerialPortInfo};

use crate::link::{Connector, DEFAULT_READ_TIMEOUT, Link, LinkError};

#[derive(Debug, Clone)]
pub struct SerialConnector {
    port: String,
    baud_rate: u32,
    read_timeout: Duration,
}

impl SerialConnector {
    pub fn new(port: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

impl Connector for SerialConnector {
    type Link = SerialLink;

    fn name(&self) -> &str {
        &self.port
    }

    fn connect(&mut self) -> io::Result<SerialLink> {
        let port = serialport::new(&self.port, self.baud_rate)
            .timeout(self.read_timeout)
            .data_bits(serialport::DataBits::Eight)
            .stop_bits(serialport::StopBits::One)
            .parity(serialport::Parity::None)
            .flow_control(serialport::FlowControl::None)
            .open()?;

        Ok(SerialLink {
            reader: BufReader::new(port),
        })
    }
}

/// Closed when dropped.
pub struct SerialLink {
    reader: BufReader<Box<dyn SerialPort>>,
}

impl Link for SerialLink {
    fn read_line(&mut self) -> Result<Vec<u8>, LinkError> {
        let mut line = Vec::new();

        match self.reader.read_until(b'\n', &mut line) {
            // A port that reports end of stream has gone away.
            Ok(0) => Err(LinkError::Lost(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "serial port closed",
            ))),
            Ok(_) => Ok(line),
            // Bytes consumed before the timeout are already in `line`.
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                Ok(line)
            }
            Err(err) => Err(LinkError::Lost(err)),
        }
    }
}

/// Serial ports visible to the host.
pub fn list_ports() -> io::Result<Vec<SerialPortInfo>> {
    Ok(serialport::available_ports()?)
}
