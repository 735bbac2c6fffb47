use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::geo::PositionSource;
use crate::presenter::Presenter;
use crate::session::{DeviceLink, RecordSink};
use crate::sink::UploadRecord;

/// One gather-then-upload iteration.
///
/// Each source is independently fallible: a failed readings fetch or a
/// missed fix is reported as a warning and its fields are simply omitted.
/// The one hard gate is an empty merged record. The location relay back to
/// the device is fire-and-forget and never affects the outcome.
///
/// # Errors
///
/// Returns `AppError::NothingToSend` when both sources failed,
/// `AppError::Superseded` when `still_current` turns false mid-cycle, or
/// the sink's rejection/transport error when submission fails.
pub(crate) async fn run_cycle<D, S, G, F>(
    device: &Arc<D>,
    sink: &S,
    geo: &G,
    presenter: &dyn Presenter,
    position_timeout: Duration,
    still_current: F,
) -> AppResult<String>
where
    D: DeviceLink,
    S: RecordSink,
    G: PositionSource,
    F: Fn() -> bool,
{
    // The device client enforces its own bounded wait (and the mixed-content
    // precondition, which lands here as an error like any other).
    let readings = match device.fetch_readings().await {
        Ok(readings) if !readings.is_empty() => Some(readings),
        Ok(_) => {
            let e = AppError::SourceUnavailable("Sensors", "device returned no readings".to_string());
            presenter.status(&e.to_string());
            None
        }
        Err(e) => {
            let e = AppError::SourceUnavailable("Sensors", e.to_string());
            tracing::warn!(error = %e, "Sensor readings unavailable this cycle");
            presenter.status(&e.to_string());
            None
        }
    };

    let position = match tokio::time::timeout(position_timeout, geo.current_position()).await {
        Ok(Ok(position)) => Some(position),
        Ok(Err(e)) => {
            let e = AppError::SourceUnavailable("GPS", e.to_string());
            tracing::warn!(error = %e, "No position fix this cycle");
            presenter.status(&e.to_string());
            None
        }
        Err(_) => {
            let e = AppError::SourceUnavailable("GPS", "timed out".to_string());
            tracing::warn!(timeout = ?position_timeout, "Position fix timed out");
            presenter.status(&e.to_string());
            None
        }
    };

    if let Some(p) = &position {
        presenter.map_update(p.latitude, p.longitude, p.display_accuracy());
    }

    let record = UploadRecord::from_parts(readings.as_ref(), position.as_ref());
    if record.is_empty() {
        return Err(AppError::NothingToSend);
    }

    // The session may have been stopped while we were gathering; the driver
    // discards our result either way, but checking here keeps a stale cycle
    // from reaching the sink at all.
    if !still_current() {
        return Err(AppError::Superseded);
    }

    let entry = sink.submit(&record).await?;

    if let Some(position) = position {
        let device = Arc::clone(device);
        tokio::spawn(async move {
            if let Err(e) = device.push_location(position).await {
                tracing::debug!(error = %e, "Location relay to device failed");
            }
        });
    }

    Ok(entry)
}
