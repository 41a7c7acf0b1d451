//! Hands readings to the downstream sink.
//!
//! Each reading is submitted on its own. A failure is logged and the next
//! reading is still attempted; nothing is retried or reported upstream.

pub mod http;

use thiserror::Error;
use tracing::{debug, warn};

use crate::reading::Reading;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("sink responded with status {code}")]
    Status { code: u16 },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid sink URL: {0}")]
    InvalidUrl(String),
}

pub trait Sink {
    fn submit(&self, reading: &Reading) -> Result<(), ForwardError>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct Forwarder<S> {
    sink: S,
}

impl<S: Sink> Forwarder<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns whether the sink accepted the reading.
    pub fn forward(&self, reading: Reading) -> bool {
        match self.sink.submit(&reading) {
            Ok(()) => {
                debug!(timestamp = %reading.timestamp(), co2 = reading.co2, "forwarded reading");
                true
            }
            Err(err) => {
                warn!(timestamp = %reading.timestamp(), "failed to forward reading: {err}");
                false
            }
        }
    }

    /// Forwards in order, one request per reading.
    pub fn forward_all(&self, readings: Vec<Reading>) -> ForwardOutcome {
        let mut outcome = ForwardOutcome::default();
        for reading in readings {
            if self.forward(reading) {
                outcome.sent += 1;
            } else {
                outcome.failed += 1;
            }
        }
        outcome
    }
}
