use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::common::AppState;
use crate::presenter::Presenter;
use crate::sink::LatestReadings;

/// Run the latest-entry refresh task on a schedule.
///
/// A read-only projection of the sink's newest stored entry, refreshed on
/// its own cadence, uncoupled from the upload cadence. Failures are logged
/// and skipped; the next tick tries again.
pub async fn run_feed_refresh(state: AppState, presenter: Arc<dyn Presenter>) {
    let interval_secs = state.config.feed_refresh_interval_seconds;

    tracing::info!(interval_secs, "Starting latest-entry refresh task");

    let mut ticker = interval(Duration::from_secs(interval_secs));

    // Run initial refresh immediately
    ticker.tick().await;

    loop {
        match state.sink_client.latest_feed().await {
            Ok(Some(feed)) => {
                presenter.latest_readings(&LatestReadings::from(&feed));
            }
            Ok(None) => {
                tracing::debug!("Channel has no stored entries yet");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Latest-entry refresh failed");
            }
        }

        // Wait for next tick
        ticker.tick().await;
    }
}
