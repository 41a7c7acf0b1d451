use std::array;
use std::sync::LazyLock;

use chrono::DateTime;
use chrono_tz::Tz;
use regex::Regex;
use tracing::debug;

use crate::packet::{PacketError, WIRE_FIELDS};
use crate::reading::Reading;

// Identifiers are matched as a whole so digits inside names like `pm25`,
// `pm2.5` or `co2` are never read as values.
static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z_][A-Za-z0-9_]*(?:\.\d+)*|[-+]?\d+(?:\.\d+)?")
        .expect("invalid token pattern")
});

const GLOBAL_MIN: f64 = -100.0;
const GLOBAL_MAX: f64 = 100_000.0;

const CO2_MIN: f64 = 50.0;
const TEMPERATURE_MIN: f64 = -50.0;
const TEMPERATURE_MAX: f64 = 100.0;
const HUMIDITY_MIN: f64 = 0.0;
const HUMIDITY_MAX: f64 = 105.0;

const GROUP: usize = WIRE_FIELDS.len();

/// Every standalone number in `text`, in order.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str())
        .filter(|t| !t.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_'))
        .filter_map(|t| t.parse().ok())
        .collect()
}

/// Groups the numbers of free-form text into readings.
///
/// Numbers past the last complete group of six are dropped. Every value is
/// range checked for its slot, and one bad value rejects the whole packet.
pub fn parse_tolerant(
    text: &str,
    measured_at: DateTime<Tz>,
) -> Result<Vec<Reading>, PacketError> {
    let mut numbers = extract_numbers(text);
    if numbers.len() < GROUP {
        return Err(PacketError::TooFewNumbers {
            found: numbers.len(),
        });
    }

    let surplus = numbers.len() % GROUP;
    if surplus != 0 {
        debug!(dropped = surplus, "dropping numbers past the last full group");
        numbers.truncate(numbers.len() - surplus);
    }

    for (index, &value) in numbers.iter().enumerate() {
        check_range(index, value)?;
    }

    numbers
        .chunks_exact(GROUP)
        .enumerate()
        .map(|(group, chunk)| {
            let values = array::from_fn(|slot| chunk[slot]);
            Reading::from_wire_order(values, measured_at).ok_or(PacketError::NonFinite { group })
        })
        .collect()
}

fn check_range(index: usize, value: f64) -> Result<(), PacketError> {
    let slot = index % GROUP;
    let in_range = (GLOBAL_MIN..=GLOBAL_MAX).contains(&value)
        && match slot {
            0 => value >= CO2_MIN,
            1 => (TEMPERATURE_MIN..=TEMPERATURE_MAX).contains(&value),
            2 => (HUMIDITY_MIN..=HUMIDITY_MAX).contains(&value),
            _ => true,
        };

    if in_range {
        Ok(())
    } else {
        Err(PacketError::OutOfRange {
            index,
            field: WIRE_FIELDS[slot],
            value,
        })
    }
}
