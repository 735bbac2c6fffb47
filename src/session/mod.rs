//! The upload session: start/stop lifecycle, generation-guarded scheduling,
//! and the gather-then-upload cycle.

mod controller;
mod cycle;

use std::future::Future;

pub use controller::{SessionController, SessionSettings};

use crate::device::SensorReadings;
use crate::error::AppResult;
use crate::geo::Position;
use crate::sink::UploadRecord;

/// The local device as the session sees it: a readings source plus a
/// best-effort location relay.
pub trait DeviceLink: Send + Sync + 'static {
    fn fetch_readings(&self) -> impl Future<Output = AppResult<SensorReadings>> + Send;

    fn push_location(&self, position: Position) -> impl Future<Output = AppResult<()>> + Send;

    /// Mirror the sharing state onto the device (uploads lifecycle
    /// endpoints). Best-effort; devices without the endpoints ignore it.
    fn notify_sharing(&self, _active: bool) -> impl Future<Output = AppResult<()>> + Send {
        async { Ok(()) }
    }
}

/// The remote time-series channel as the session sees it: submit one record,
/// get back an opaque entry id.
pub trait RecordSink: Send + Sync + 'static {
    fn submit(&self, record: &UploadRecord) -> impl Future<Output = AppResult<String>> + Send;
}
