//! The physical connection to the sensor.
//!
//! [`LinkManager::open`] makes a bounded number of attempts before giving
//! up with [`LinkError::Unavailable`]. A [`Link`] that fails mid-read
//! reports [`LinkError::Lost`]; the caller drops it and opens a new one.

pub mod serial;

use std::io;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("link {port} unavailable after {attempts} attempts")]
    Unavailable {
        port: String,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("link lost")]
    Lost(#[source] io::Error),
}

/// An open connection.
pub trait Link {
    /// Blocks until a line terminator arrives or the read timeout passes,
    /// returning every byte read, terminator included. A timeout with
    /// nothing received returns an empty vector.
    fn read_line(&mut self) -> Result<Vec<u8>, LinkError>;
}

/// Opens links. Each call makes exactly one attempt.
pub trait Connector {
    type Link: Link;

    /// Name of the endpoint for log lines.
    fn name(&self) -> &str;

    fn connect(&mut self) -> io::Result<Self::Link>;
}

#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            connect_attempts: DEFAULT_CONNECT_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

#[derive(Debug)]
pub struct LinkManager<C> {
    connector: C,
    config: LinkConfig,
}

impl<C: Connector> LinkManager<C> {
    pub fn new(connector: C, config: LinkConfig) -> Self {
        Self { connector, config }
    }

    pub fn retry_delay(&self) -> Duration {
        self.config.retry_delay
    }

    pub fn open(&mut self) -> Result<C::Link, LinkError> {
        let attempts = self.config.connect_attempts.max(1);

        let mut attempt = 1;
        loop {
            match self.connector.connect() {
                Ok(link) => {
                    info!(port = self.connector.name(), attempt, "link open");
                    return Ok(link);
                }
                Err(err) => {
                    warn!(
                        port = self.connector.name(),
                        attempt,
                        error = %err,
                        "connection attempt failed"
                    );

                    if attempt >= attempts {
                        return Err(LinkError::Unavailable {
                            port: self.connector.name().to_owned(),
                            attempts,
                            source: err,
                        });
                    }
                }
            }

            thread::sleep(self.config.retry_delay);
            attempt += 1;
        }
    }
}
