use chrono::DateTime;
use chrono_tz::Tz;
use serde::{Serialize, Serializer};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One complete sensor sample.
///
/// Only the packet parser builds these, and only once all six values are
/// present and finite. The link never supplies a time, so `measured_at` is
/// the ingestion time in the configured zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub co2: f64,

    pub vocs: f64,

    pub pm25: f64,

    pub pm10: f64,

    pub temperature: f64,

    pub humidity: f64,

    #[serde(rename = "timestamp", serialize_with = "serialize_timestamp")]
    pub measured_at: DateTime<Tz>,
}

impl Reading {
    /// Builds a reading from values in wire order
    /// `(co2, temperature, humidity, vocs, pm25, pm10)`.
    ///
    /// Returns `None` if any value is NaN or infinite.
    pub fn from_wire_order(values: [f64; 6], measured_at: DateTime<Tz>) -> Option<Self> {
        if values.iter().any(|v| !v.is_finite()) {
            return None;
        }

        let [co2, temperature, humidity, vocs, pm25, pm10] = values;

        Some(Self {
            co2,
            vocs,
            pm25,
            pm10,
            temperature,
            humidity,
            measured_at,
        })
    }

    /// ISO-8601 local wall-clock time, second precision, no offset.
    pub fn timestamp(&self) -> String {
        self.measured_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn serialize_timestamp<S>(measured_at: &DateTime<Tz>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&measured_at.format(TIMESTAMP_FORMAT))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use chrono_tz::Asia::Tokyo;

    use super::*;

    #[test]
    fn remaps_wire_order_to_named_fields() {
        let at = Tokyo.with_ymd_and_hms(2025, 3, 1, 9, 30, 15).unwrap();
        let r = Reading::from_wire_order([400.0, 22.0, 50.0, 100.0, 8.0, 20.0], at).unwrap();

        assert_eq!(r.co2, 400.0);
        assert_eq!(r.temperature, 22.0);
        assert_eq!(r.humidity, 50.0);
        assert_eq!(r.vocs, 100.0);
        assert_eq!(r.pm25, 8.0);
        assert_eq!(r.pm10, 20.0);
    }

    #[test]
    fn rejects_non_finite_values() {
        let at = Tokyo.with_ymd_and_hms(2025, 3, 1, 9, 30, 15).unwrap();

        assert!(Reading::from_wire_order([f64::NAN, 1.0, 1.0, 1.0, 1.0, 1.0], at).is_none());
        assert!(Reading::from_wire_order([1.0, 1.0, 1.0, 1.0, 1.0, f64::INFINITY], at).is_none());
    }

    #[test]
    fn serializes_sink_json_shape() {
        let at = Tokyo.with_ymd_and_hms(2025, 3, 1, 9, 30, 15).unwrap();
        let r = Reading::from_wire_order([400.0, 22.5, 50.0, 100.0, 8.0, 20.0], at).unwrap();

        let json = serde_json::to_value(&r).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "co2": 400.0,
                "vocs": 100.0,
                "pm25": 8.0,
                "pm10": 20.0,
                "temperature": 22.5,
                "humidity": 50.0,
                "timestamp": "2025-03-01T09:30:15",
            })
        );
        assert_eq!(r.timestamp(), "2025-03-01T09:30:15");
    }
}
