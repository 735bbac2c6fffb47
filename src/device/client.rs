use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::device::models::{DeviceStatus, SensorReadings};
use crate::error::{AppError, AppResult};
use crate::geo::Position;
use crate::session::DeviceLink;

/// HTTP client for the rig's local network device (sensors + GPS relay).
pub struct DeviceClient {
    http_client: Client,
    base_url: String,
    /// Dashboard served over HTTPS while the device is plain HTTP. Detected
    /// once at construction; the readings request is never issued in this
    /// state so a mixed-content block cannot masquerade as a real outage.
    mixed_content_blocked: bool,
}

impl DeviceClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.device_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        let base_url = config.device_base_url.trim_end_matches('/').to_string();
        let mixed_content_blocked = config.dashboard_https && base_url.starts_with("http:");

        Self {
            http_client,
            base_url,
            mixed_content_blocked,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[must_use]
    pub fn is_mixed_content_blocked(&self) -> bool {
        self.mixed_content_blocked
    }

    /// Fetch current sensor readings from `GET /sensors`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PreconditionBlocked` without issuing the request
    /// when mixed content would block it, and `AppError::Transport` on
    /// network failure, non-success status, or a non-JSON body.
    pub async fn readings(&self) -> AppResult<SensorReadings> {
        if self.mixed_content_blocked {
            return Err(AppError::PreconditionBlocked);
        }

        let response = self
            .http_client
            .get(self.url("/sensors"))
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("/sensors fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "/sensors HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|_| AppError::Transport("/sensors returned non-JSON".to_string()))
    }

    /// Relay the latest position to the device via `POST /location`.
    ///
    /// Best-effort by contract: no response body is consumed, and a
    /// mixed-content block silently skips the call.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the request itself fails.
    pub async fn send_location(&self, position: &Position) -> AppResult<()> {
        if self.mixed_content_blocked {
            tracing::debug!("Skipping /location relay (mixed content)");
            return Ok(());
        }

        self.http_client
            .post(self.url("/location"))
            .json(&serde_json::json!({
                "lat": position.latitude,
                "lon": position.longitude,
            }))
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("/location post failed: {e}")))?;

        Ok(())
    }

    /// Tell the device the dashboard has started sharing (`POST /startUploads`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the request fails or the device
    /// answers with a non-success status.
    pub async fn start_uploads(&self) -> AppResult<()> {
        self.post_lifecycle("/startUploads").await
    }

    /// Tell the device sharing has stopped (`POST /stopUploads`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the request fails or the device
    /// answers with a non-success status.
    pub async fn stop_uploads(&self) -> AppResult<()> {
        self.post_lifecycle("/stopUploads").await
    }

    /// Tell the device to drop its cached location (`POST /stopLocation`).
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the request fails or the device
    /// answers with a non-success status.
    pub async fn stop_location(&self) -> AppResult<()> {
        self.post_lifecycle("/stopLocation").await
    }

    /// Query `GET /status` to restore state after a restart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::PreconditionBlocked` when mixed content would
    /// block the call, `AppError::Transport` otherwise.
    pub async fn status(&self) -> AppResult<DeviceStatus> {
        if self.mixed_content_blocked {
            return Err(AppError::PreconditionBlocked);
        }

        let response = self
            .http_client
            .get(self.url("/status"))
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("/status fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "/status HTTP {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|_| AppError::Transport("/status returned non-JSON".to_string()))
    }

    async fn post_lifecycle(&self, path: &str) -> AppResult<()> {
        if self.mixed_content_blocked {
            return Ok(());
        }

        let response = self
            .http_client
            .post(self.url(path))
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("{path} post failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "{path} HTTP {}",
                response.status()
            )));
        }

        Ok(())
    }
}

impl DeviceLink for DeviceClient {
    async fn fetch_readings(&self) -> AppResult<SensorReadings> {
        self.readings().await
    }

    async fn push_location(&self, position: Position) -> AppResult<()> {
        self.send_location(&position).await
    }

    async fn notify_sharing(&self, active: bool) -> AppResult<()> {
        if active {
            self.start_uploads().await
        } else {
            self.stop_uploads().await?;
            self.stop_location().await
        }
    }
}
