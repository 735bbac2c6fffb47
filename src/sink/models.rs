use serde::{Deserialize, Serialize};

use crate::device::SensorReadings;
use crate::geo::Position;

/// One row for the sink's fixed 8-slot field namespace.
///
/// The numbered slots are the sink's schema, not ours: field1-6 carry pm1,
/// pm25, pm10, co2, temperature and humidity, field7/field8 carry latitude
/// and longitude. Absent fields are omitted from the request entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadRecord {
    pub field1: Option<f64>,
    pub field2: Option<f64>,
    pub field3: Option<f64>,
    pub field4: Option<f64>,
    pub field5: Option<f64>,
    pub field6: Option<f64>,
    pub field7: Option<f64>,
    pub field8: Option<f64>,
}

/// Drop NaN/infinite values at mapping time; the sink stores them as garbage.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl UploadRecord {
    /// Merge whatever was obtained this cycle into one record.
    #[must_use]
    pub fn from_parts(readings: Option<&SensorReadings>, position: Option<&Position>) -> Self {
        Self {
            field1: finite(readings.and_then(|r| r.pm1)),
            field2: finite(readings.and_then(|r| r.pm25)),
            field3: finite(readings.and_then(|r| r.pm10)),
            field4: finite(readings.and_then(|r| r.co2)),
            field5: finite(readings.and_then(|r| r.temperature)),
            field6: finite(readings.and_then(|r| r.humidity)),
            field7: finite(position.map(|p| p.latitude)),
            field8: finite(position.map(|p| p.longitude)),
        }
    }

    /// A record with zero populated fields must never reach the sink.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Populated fields as `fieldN=value` query pairs.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("field1", self.field1),
            ("field2", self.field2),
            ("field3", self.field3),
            ("field4", self.field4),
            ("field5", self.field5),
            ("field6", self.field6),
            ("field7", self.field7),
            ("field8", self.field8),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v.to_string())))
        .collect()
    }
}

/// Response from `GET /channels/<id>/feeds.json?results=1`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedsResponse {
    #[serde(default)]
    pub feeds: Vec<FeedEntry>,
}

/// One stored entry as the sink echoes it back. Field values arrive as
/// strings (or null) and parse leniently to numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedEntry {
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub entry_id: Option<i64>,
    #[serde(default)]
    pub field1: Option<String>,
    #[serde(default)]
    pub field2: Option<String>,
    #[serde(default)]
    pub field3: Option<String>,
    #[serde(default)]
    pub field4: Option<String>,
    #[serde(default)]
    pub field5: Option<String>,
    #[serde(default)]
    pub field6: Option<String>,
    #[serde(default)]
    pub field7: Option<String>,
    #[serde(default)]
    pub field8: Option<String>,
}

fn parse_field(field: &Option<String>) -> Option<f64> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Read-only projection of the sink's newest entry, for display.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LatestReadings {
    pub pm1: Option<f64>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub co2: Option<f64>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&FeedEntry> for LatestReadings {
    fn from(feed: &FeedEntry) -> Self {
        Self {
            pm1: parse_field(&feed.field1),
            pm25: parse_field(&feed.field2),
            pm10: parse_field(&feed.field3),
            co2: parse_field(&feed.field4),
            temperature: parse_field(&feed.field5),
            humidity: parse_field(&feed.field6),
            latitude: parse_field(&feed.field7),
            longitude: parse_field(&feed.field8),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_maps_fields_into_the_sink_namespace() {
        let readings = SensorReadings {
            co2: Some(450.0),
            pm25: Some(8.2),
            ..Default::default()
        };
        let position = Position::new(53.35, -6.26, Some(12.0));

        let record = UploadRecord::from_parts(Some(&readings), Some(&position));
        assert_eq!(record.field4, Some(450.0));
        assert_eq!(record.field2, Some(8.2));
        assert_eq!(record.field7, Some(53.35));
        assert_eq!(record.field8, Some(-6.26));
        assert_eq!(record.field1, None);
        assert!(!record.is_empty());
    }

    #[test]
    fn record_from_nothing_is_empty() {
        assert!(UploadRecord::from_parts(None, None).is_empty());
        assert!(
            UploadRecord::from_parts(Some(&SensorReadings::default()), None).is_empty()
        );
    }

    #[test]
    fn non_finite_values_are_dropped() {
        let readings = SensorReadings {
            co2: Some(f64::NAN),
            temperature: Some(21.5),
            ..Default::default()
        };
        let record = UploadRecord::from_parts(Some(&readings), None);
        assert_eq!(record.field4, None);
        assert_eq!(record.field5, Some(21.5));
    }

    #[test]
    fn query_pairs_only_contain_populated_fields() {
        let position = Position::new(53.35, -6.26, None);
        let record = UploadRecord::from_parts(None, Some(&position));
        let pairs = record.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("field7", "53.35".to_string()),
                ("field8", "-6.26".to_string()),
            ]
        );
    }

    #[test]
    fn feed_entry_parses_leniently() {
        let feed: FeedEntry = serde_json::from_str(
            r#"{"created_at":"2026-08-23T10:00:00Z","entry_id":123,
                "field2":"8.2","field4":"450","field5":"","field7":"53.3498"}"#,
        )
        .unwrap();

        let latest = LatestReadings::from(&feed);
        assert_eq!(latest.pm25, Some(8.2));
        assert_eq!(latest.co2, Some(450.0));
        assert_eq!(latest.temperature, None);
        assert_eq!(latest.latitude, Some(53.3498));
        assert_eq!(latest.longitude, None);
    }
}
