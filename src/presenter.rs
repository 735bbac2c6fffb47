use crate::sink::LatestReadings;

/// Outbound seam to whatever renders the dashboard. The controller only
/// calls out; nothing here ever drives the session.
pub trait Presenter: Send + Sync {
    /// Human-readable progress/error line. The sole error channel an
    /// average user sees.
    fn status(&self, message: &str);

    /// Move the map marker.
    fn map_update(&self, latitude: f64, longitude: f64, accuracy_meters: f64);

    /// Flip the start/stop affordances.
    fn sharing_changed(&self, active: bool);

    /// Refresh the read-only "latest entry" numbers.
    fn latest_readings(&self, latest: &LatestReadings);
}

fn fmt(value: Option<f64>) -> String {
    value.map_or_else(|| "—".to_string(), |v| format!("{v:.1}"))
}

/// Presenter that renders to the structured log.
pub struct TracingPresenter;

impl Presenter for TracingPresenter {
    fn status(&self, message: &str) {
        tracing::info!(target: "rover_uplink::status", "{message}");
    }

    fn map_update(&self, latitude: f64, longitude: f64, accuracy_meters: f64) {
        tracing::info!(
            latitude = %format!("{latitude:.6}"),
            longitude = %format!("{longitude:.6}"),
            accuracy_m = accuracy_meters.round(),
            "Map marker updated"
        );
    }

    fn sharing_changed(&self, active: bool) {
        tracing::info!(active, "Sharing state changed");
    }

    fn latest_readings(&self, latest: &LatestReadings) {
        tracing::info!(
            co2 = %fmt(latest.co2),
            pm1 = %fmt(latest.pm1),
            pm25 = %fmt(latest.pm25),
            pm10 = %fmt(latest.pm10),
            temperature = %fmt(latest.temperature),
            humidity = %fmt(latest.humidity),
            latitude = %fmt(latest.latitude),
            longitude = %fmt(latest.longitude),
            "Latest stored entry"
        );
    }
}
