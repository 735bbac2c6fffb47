/// Error taxonomy for the upload session.
///
/// The split matters to the cycle, not to the caller: source failures are
/// recovered by omission, sink failures fail the cycle, and no cycle error
/// ever propagates out of `start()`/`stop()`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Readings or position could not be obtained; the cycle proceeds
    /// without that source's fields.
    #[error("{0} unavailable: {1}")]
    SourceUnavailable(&'static str, String),

    /// The session was stopped or restarted while a cycle was mid-flight;
    /// the cycle is abandoned without submitting.
    #[error("cycle abandoned: session no longer current")]
    Superseded,

    /// Both sources failed in the same cycle; nothing to submit.
    #[error("nothing to send: no sensor readings and no position fix")]
    NothingToSend,

    /// The sink answered with the literal rejection body `"0"`.
    #[error("sink rejected update (rate limit or bad key/fields)")]
    SinkRejected,

    /// Network, timeout, or malformed-body failure on any call.
    #[error("transport error: {0}")]
    Transport(String),

    /// Dashboard is served over HTTPS while the device endpoint is plain
    /// HTTP; the readings request is never issued.
    #[error("blocked: dashboard is HTTPS but device is HTTP; host on the device or proxy it")]
    PreconditionBlocked,

    /// No position capability at all; aborts `start()` before any state change.
    #[error("geolocation not supported on this device")]
    GeolocationUnsupported,

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

pub type AppResult<T> = Result<T, AppError>;
