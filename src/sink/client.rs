use reqwest::Client;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::session::RecordSink;
use crate::sink::models::{FeedEntry, FeedsResponse, UploadRecord};

/// Client for the remote time-series ingestion channel.
///
/// The write side is an unauthenticated key-based GET; the sink's whole
/// response contract is the body text: `"0"` means rejected (rate limit or
/// bad key/fields), anything else is the opaque entry id.
pub struct SinkClient {
    http_client: Client,
    base_url: String,
    api_key: String,
    channel_id: String,
}

impl SinkClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.sink_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: config.sink_base_url.trim_end_matches('/').to_string(),
            api_key: config.sink_api_key.clone(),
            channel_id: config.sink_channel_id.clone(),
        }
    }

    /// Submit one record via `GET /update`, returning the entry id.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NothingToSend` for an empty record (it never goes
    /// on the wire), `AppError::SinkRejected` for a `"0"` body, and
    /// `AppError::Transport` for network failures, non-success statuses, or
    /// an empty body.
    pub async fn update(&self, record: &UploadRecord) -> AppResult<String> {
        if record.is_empty() {
            return Err(AppError::NothingToSend);
        }

        let response = self
            .http_client
            .get(format!("{}/update", self.base_url))
            .query(&[("api_key", self.api_key.as_str())])
            .query(&record.query_pairs())
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("sink update failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "sink HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AppError::Transport(format!("sink body unreadable: {e}")))?;

        interpret_update_body(&body)
    }

    /// Read back the newest stored entry, if the channel has any.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Transport` if the request fails, returns a
    /// non-success status, or the body does not parse.
    pub async fn latest_feed(&self) -> AppResult<Option<FeedEntry>> {
        let url = format!(
            "{}/channels/{}/feeds.json?results=1",
            self.base_url, self.channel_id
        );

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("feed fetch failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Transport(format!(
                "feed HTTP {}",
                response.status()
            )));
        }

        let feeds: FeedsResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("feed parse failed: {e}")))?;

        Ok(feeds.feeds.into_iter().next())
    }
}

/// Apply the sink's body contract: trimmed `"0"` is a rejection, an empty
/// body is malformed, anything else is the opaque entry id.
fn interpret_update_body(body: &str) -> AppResult<String> {
    let body = body.trim();
    if body == "0" {
        return Err(AppError::SinkRejected);
    }
    if body.is_empty() {
        return Err(AppError::Transport("sink returned an empty body".to_string()));
    }
    Ok(body.to_string())
}

impl RecordSink for SinkClient {
    async fn submit(&self, record: &UploadRecord) -> AppResult<String> {
        self.update(record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Deployment;

    fn config() -> Config {
        Config {
            device_base_url: "http://192.168.4.1".to_string(),
            device_timeout_seconds: 8,
            dashboard_https: false,
            sink_base_url: "https://api.thingspeak.com/".to_string(),
            sink_api_key: "KEY".to_string(),
            sink_channel_id: "2960675".to_string(),
            sink_timeout_seconds: 10,
            push_period_seconds: 60,
            push_jitter_max_ms: 0,
            position_timeout_seconds: 8,
            feed_refresh_interval_seconds: 30,
            geo_latitude: None,
            geo_longitude: None,
            deployment: Deployment::Local,
        }
    }

    #[tokio::test]
    async fn empty_record_never_goes_on_the_wire() {
        let client = SinkClient::new(&config());
        let err = client.update(&UploadRecord::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NothingToSend));
    }

    #[test]
    fn zero_body_is_a_rejection() {
        assert!(matches!(
            interpret_update_body("0"),
            Err(AppError::SinkRejected)
        ));
        assert!(matches!(
            interpret_update_body(" 0\n"),
            Err(AppError::SinkRejected)
        ));
    }

    #[test]
    fn empty_body_is_a_transport_error() {
        assert!(matches!(
            interpret_update_body(""),
            Err(AppError::Transport(_))
        ));
        assert!(matches!(
            interpret_update_body("  \n"),
            Err(AppError::Transport(_))
        ));
    }

    #[test]
    fn any_other_body_is_the_entry_id() {
        assert_eq!(interpret_update_body("123").unwrap(), "123");
        assert_eq!(interpret_update_body("\n123 ").unwrap(), "123");
        // "0" only rejects as the whole body.
        assert_eq!(interpret_update_body("100").unwrap(), "100");
    }
}
