use serde::{Deserialize, Serialize};

/// Current readings from `GET /sensors`.
///
/// Every field is optional: a sensor that is warming up or disconnected is
/// simply absent from the payload, never zeroed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings {
    #[serde(default)]
    pub pm1: Option<f64>,
    #[serde(default)]
    pub pm25: Option<f64>,
    #[serde(default)]
    pub pm10: Option<f64>,
    #[serde(default)]
    pub co2: Option<f64>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub humidity: Option<f64>,
}

impl SensorReadings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pm1.is_none()
            && self.pm25.is_none()
            && self.pm10.is_none()
            && self.co2.is_none()
            && self.temperature.is_none()
            && self.humidity.is_none()
    }
}

/// Response from `GET /status`, used to restore state after a restart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(rename = "uploadsEnabled", default)]
    pub uploads_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readings_parse_with_missing_fields() {
        let readings: SensorReadings =
            serde_json::from_str(r#"{"co2": 450.0, "pm25": 8.2}"#).unwrap();
        assert_eq!(readings.co2, Some(450.0));
        assert_eq!(readings.pm25, Some(8.2));
        assert_eq!(readings.pm10, None);
        assert!(!readings.is_empty());
    }

    #[test]
    fn empty_payload_is_empty() {
        let readings: SensorReadings = serde_json::from_str("{}").unwrap();
        assert!(readings.is_empty());
    }
}
