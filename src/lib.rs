//! rover-uplink - Upload session controller for a mobile air-quality sensor rig
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod device;
pub mod error;
pub mod exclusivity;
pub mod feed;
pub mod geo;
pub mod presenter;
pub mod session;
pub mod sink;
