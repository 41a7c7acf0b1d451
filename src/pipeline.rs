//! One ingestion run: read, decode, frame, parse, forward, repeat.
//!
//! Everything the loop mutates lives in [`Pipeline`], so independent runs
//! never share state. The loop is strictly sequential. Its only blocking
//! point is the link read, which is bounded by the read timeout, and the
//! shutdown flag is checked once per iteration.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{debug, info, trace, warn};

use crate::decode::decode;
use crate::forward::{Forwarder, Sink};
use crate::frame::{DEFAULT_MAX_BUFFER_BYTES, FrameAssembler};
use crate::link::{Connector, Link, LinkConfig, LinkError, LinkManager};
use crate::packet::parse_packet;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub link: LinkConfig,
    pub max_buffer_bytes: usize,
    /// Zone the ingestion timestamp is rendered in.
    pub timezone: Tz,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            max_buffer_bytes: DEFAULT_MAX_BUFFER_BYTES,
            timezone: Tz::UTC,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub packets: u64,
    pub dropped_packets: u64,
    pub readings: u64,
    pub forwarded: u64,
    pub forward_failures: u64,
    pub reconnects: u64,
}

pub struct Pipeline<C, S> {
    links: LinkManager<C>,
    assembler: FrameAssembler,
    forwarder: Forwarder<S>,
    timezone: Tz,
    shutdown: Arc<AtomicBool>,
    stats: RunStats,
}

impl<C: Connector, S: Sink> Pipeline<C, S> {
    pub fn new(connector: C, sink: S, config: PipelineConfig) -> Self {
        Self {
            links: LinkManager::new(connector, config.link),
            assembler: FrameAssembler::new(config.max_buffer_bytes),
            forwarder: Forwarder::new(sink),
            timezone: config.timezone,
            shutdown: Arc::new(AtomicBool::new(false)),
            stats: RunStats::default(),
        }
    }

    /// Uses `flag` as the shutdown flag instead of a private one.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    /// Setting the flag stops [`Pipeline::run`] after the current iteration.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub fn assembler(&self) -> &FrameAssembler {
        &self.assembler
    }

    pub fn sink(&self) -> &S {
        self.forwarder.sink()
    }

    /// Runs until shut down or until the link cannot be reopened.
    ///
    /// A lost link is closed, and after one retry delay it is reopened with
    /// the usual bounded attempts. The buffer carries over, so a packet
    /// split by the reconnect can still complete. The run summary is logged
    /// on every exit, including a failed reopen.
    pub fn run(&mut self) -> Result<RunStats, LinkError> {
        let result = self.read_until_stopped();
        info!(stats = ?self.stats, "ingestion stopped");
        result.map(|()| self.stats.clone())
    }

    fn read_until_stopped(&mut self) -> Result<(), LinkError> {
        let mut link = self.links.open()?;

        while !self.shutdown.load(Ordering::SeqCst) {
            match link.read_line() {
                Ok(bytes) => self.ingest(&bytes),
                Err(err) => {
                    warn!(error = %err, "link lost, reconnecting");
                    drop(link);
                    self.stats.reconnects += 1;
                    thread::sleep(self.links.retry_delay());
                    link = self.links.open()?;
                }
            }
        }

        Ok(())
    }

    /// Processes the bytes of one read.
    pub fn ingest(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        trace!(bytes = ?String::from_utf8_lossy(bytes), "read");

        let decoded = decode(bytes);
        if decoded.encoding.is_degraded() {
            debug!(encoding = decoded.encoding.as_str(), "input is not plain ASCII");
        }

        let mut text = decoded.text;
        if bytes.ends_with(b"\n") {
            text.push('\n');
        }

        for packet in self.assembler.feed(&text) {
            self.stats.packets += 1;

            let measured_at = Utc::now().with_timezone(&self.timezone);
            let readings = match parse_packet(&packet, measured_at) {
                Ok(readings) => readings,
                Err(err) => {
                    self.stats.dropped_packets += 1;
                    warn!(packet = packet.as_str(), "dropping unparseable packet: {err}");
                    continue;
                }
            };

            self.stats.readings += readings.len() as u64;
            let outcome = self.forwarder.forward_all(readings);
            self.stats.forwarded += outcome.sent as u64;
            self.stats.forward_failures += outcome.failed as u64;
        }
    }
}
