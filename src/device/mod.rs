mod client;
mod models;

pub use client::DeviceClient;
pub use models::{DeviceStatus, SensorReadings};
