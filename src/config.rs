use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Deployment {
    Local,
    Dev,
    Stage,
    Prod,
}

impl Deployment {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Self::Dev,
            "stage" | "staging" => Self::Stage,
            "prod" | "production" => Self::Prod,
            _ => Self::Local,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Local device
    pub device_base_url: String,
    pub device_timeout_seconds: u64,
    /// True when the dashboard page is served over HTTPS. Combined with an
    /// http:// device base URL this blocks the readings fetch up front
    /// (mixed content) instead of letting it fail as a generic outage.
    pub dashboard_https: bool,

    // Upload sink
    pub sink_base_url: String,
    pub sink_api_key: String,
    pub sink_channel_id: String,
    pub sink_timeout_seconds: u64,

    // Upload session
    pub push_period_seconds: u64,
    pub push_jitter_max_ms: u64,
    pub position_timeout_seconds: u64,

    // Latest-entry read-back
    pub feed_refresh_interval_seconds: u64,

    // Position source (bench coordinates; unset means no geolocation)
    pub geo_latitude: Option<f64>,
    pub geo_longitude: Option<f64>,

    // Application metadata
    pub deployment: Deployment,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if required environment variables are not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            // Local device
            device_base_url: env::var("DEVICE_BASE_URL")
                .unwrap_or_else(|_| "http://192.168.4.1".to_string()),
            device_timeout_seconds: env::var("DEVICE_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
            dashboard_https: env::var("DASHBOARD_HTTPS")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),

            // Upload sink
            sink_base_url: env::var("SINK_BASE_URL")
                .unwrap_or_else(|_| "https://api.thingspeak.com".to_string()),
            sink_api_key: env::var("SINK_API_KEY").map_err(|_| ConfigError::Missing("SINK_API_KEY"))?,
            sink_channel_id: env::var("SINK_CHANNEL_ID")
                .map_err(|_| ConfigError::Missing("SINK_CHANNEL_ID"))?,
            sink_timeout_seconds: env::var("SINK_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),

            // Upload session
            push_period_seconds: env::var("PUSH_PERIOD_SECONDS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            push_jitter_max_ms: env::var("PUSH_JITTER_MAX_MS")
                .unwrap_or_else(|_| "2000".to_string())
                .parse()
                .unwrap_or(2000),
            position_timeout_seconds: env::var("POSITION_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),

            // Latest-entry read-back
            feed_refresh_interval_seconds: env::var("FEED_REFRESH_INTERVAL_SECONDS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap_or(30),

            // Position source
            geo_latitude: env::var("GEO_LATITUDE").ok().and_then(|v| v.parse().ok()),
            geo_longitude: env::var("GEO_LONGITUDE").ok().and_then(|v| v.parse().ok()),

            // Application metadata
            deployment: Deployment::from_str(
                &env::var("DEPLOYMENT").unwrap_or_else(|_| "local".to_string()),
            ),
        })
    }

    #[must_use]
    pub fn push_period(&self) -> Duration {
        Duration::from_secs(self.push_period_seconds)
    }

    #[must_use]
    pub fn position_timeout(&self) -> Duration {
        Duration::from_secs(self.position_timeout_seconds)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
