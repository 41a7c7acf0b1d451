use anyhow::{Context as _, Result, bail};
use chrono::DateTime;
use chrono_tz::Tz;
use tracing::debug;

use crate::packet::WIRE_FIELDS;
use crate::reading::Reading;

/// Parses `v1,v2,v3,v4,v5,v6;v1,...;` entries.
///
/// Text without both separators is not this format and yields nothing. A
/// bad entry is skipped on its own; the rest of the packet still counts.
/// Fields past the sixth are ignored.
pub fn parse_strict(text: &str, measured_at: DateTime<Tz>) -> Vec<Reading> {
    if !(text.contains(';') && text.contains(',')) {
        return Vec::new();
    }

    text.split(';')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match parse_entry(entry, measured_at) {
            Ok(reading) => Some(reading),
            Err(err) => {
                debug!(entry, "skipping entry: {err:#}");
                None
            }
        })
        .collect()
}

fn parse_entry(entry: &str, measured_at: DateTime<Tz>) -> Result<Reading> {
    let fields: Vec<&str> = entry.split(',').map(str::trim).collect();
    if fields.len() < WIRE_FIELDS.len() {
        bail!(
            "entry too short: expected at least {} fields, got {}",
            WIRE_FIELDS.len(),
            fields.len()
        );
    }

    let mut values = [0f64; 6];
    for (i, (value, name)) in values.iter_mut().zip(WIRE_FIELDS).enumerate() {
        *value = fields[i]
            .parse()
            .with_context(|| format!("failed to parse {name}: {:?}", fields[i]))?;
    }

    Reading::from_wire_order(values, measured_at)
        .with_context(|| format!("non-finite value in entry: {entry:?}"))
}
