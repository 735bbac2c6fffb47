mod client;
mod models;

pub use client::SinkClient;
pub use models::{FeedEntry, FeedsResponse, LatestReadings, UploadRecord};
