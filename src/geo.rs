use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{AppError, AppResult};

/// One GPS fix. Latitude and longitude are mandatory whenever a position
/// exists at all; accuracy is optional and defaults to 0 for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

impl Position {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, accuracy_meters: Option<f64>) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_meters,
        }
    }

    #[must_use]
    pub fn display_accuracy(&self) -> f64 {
        self.accuracy_meters.unwrap_or(0.0)
    }
}

/// Source of GPS fixes: a bounded one-shot fetch for upload cycles, plus a
/// continuous subscription the controller uses for live map feedback only.
pub trait PositionSource: Send + Sync + 'static {
    /// Whether any position capability exists. `start()` checks this before
    /// touching session state.
    fn supported(&self) -> bool {
        true
    }

    /// One-shot fix, accuracy preferred over speed, no stale cache.
    fn current_position(&self) -> impl Future<Output = AppResult<Position>> + Send;

    /// Continuous updates; `None` until the first fix arrives.
    fn subscribe(&self) -> watch::Receiver<Option<Position>>;
}

/// Position source pinned to configured bench coordinates. Reports
/// unsupported when no coordinates were configured, which makes `start()`
/// refuse up front exactly like a rig with no GPS at all.
pub struct FixedPositionSource {
    position: Option<Position>,
    tx: watch::Sender<Option<Position>>,
}

impl FixedPositionSource {
    #[must_use]
    pub fn new(position: Option<Position>) -> Self {
        let (tx, _rx) = watch::channel(position);
        Self { position, tx }
    }

    #[must_use]
    pub fn from_coordinates(latitude: Option<f64>, longitude: Option<f64>) -> Self {
        let position = match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Position::new(lat, lon, None)),
            _ => None,
        };
        Self::new(position)
    }
}

impl PositionSource for FixedPositionSource {
    fn supported(&self) -> bool {
        self.position.is_some()
    }

    async fn current_position(&self) -> AppResult<Position> {
        self.position.ok_or(AppError::GeolocationUnsupported)
    }

    fn subscribe(&self) -> watch::Receiver<Option<Position>> {
        self.tx.subscribe()
    }
}
