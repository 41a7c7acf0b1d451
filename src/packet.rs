//! Turns the text of one packet into readings.
//!
//! The comma/semicolon format is tried first. Only when it yields nothing
//! are bare numbers pulled out of the text and grouped in sixes.

mod strict;
mod tolerant;

use chrono::DateTime;
use chrono_tz::Tz;
use thiserror::Error;
use tracing::debug;

pub use strict::parse_strict;
pub use tolerant::{extract_numbers, parse_tolerant};

use crate::reading::Reading;

/// Value order on the wire. Differs from the field order of [`Reading`].
pub const WIRE_FIELDS: [&str; 6] = ["co2", "temperature", "humidity", "vocs", "pm25", "pm10"];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PacketError {
    #[error("found {found} numeric tokens, need at least 6")]
    TooFewNumbers { found: usize },

    #[error("value #{index} ({field}) out of range: {value}")]
    OutOfRange {
        index: usize,
        field: &'static str,
        value: f64,
    },

    #[error("group #{group} contains a non-finite value")]
    NonFinite { group: usize },
}

/// Parses one packet, stamping every reading with `measured_at`.
pub fn parse_packet(text: &str, measured_at: DateTime<Tz>) -> Result<Vec<Reading>, PacketError> {
    let readings = parse_strict(text, measured_at);
    if !readings.is_empty() {
        debug!(count = readings.len(), "parsed packet with strict format");
        return Ok(readings);
    }

    let readings = parse_tolerant(text, measured_at)?;
    debug!(count = readings.len(), "parsed packet by number extraction");

    Ok(readings)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::UTC;

    use super::*;

    fn at() -> DateTime<Tz> {
        UTC.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn strict_format_wins() {
        let readings = parse_packet("400,22,50,100,8,20;", at()).unwrap();

        assert_eq!(readings.len(), 1);
        let r = &readings[0];
        assert_eq!(r.co2, 400.0);
        assert_eq!(r.temperature, 22.0);
        assert_eq!(r.humidity, 50.0);
        assert_eq!(r.vocs, 100.0);
        assert_eq!(r.pm25, 8.0);
        assert_eq!(r.pm10, 20.0);
    }

    #[test]
    fn falls_back_to_number_extraction() {
        let readings =
            parse_packet("co2=400 temp=22 hum=50 vocs=100 pm25=8 pm10=20 extra=99", at()).unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].co2, 400.0);
        assert_eq!(readings[0].pm10, 20.0);
    }

    #[test]
    fn strict_failure_falls_through_to_tolerant() {
        // Every strict entry is short, but the numbers still form one group.
        let readings = parse_packet("400,22,50;100,8,20;", at()).unwrap();

        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].humidity, 50.0);
        assert_eq!(readings[0].vocs, 100.0);
    }

    #[test]
    fn five_numbers_is_unparseable() {
        let err = parse_packet("400,22,50,100,8", at()).unwrap_err();

        assert_eq!(err, PacketError::TooFewNumbers { found: 5 });
    }

    #[test]
    fn empty_packet_is_unparseable() {
        assert!(parse_packet("garbage", at()).is_err());
    }
}
