use std::sync::Arc;

use crate::config::Config;
use crate::device::DeviceClient;
use crate::sink::SinkClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub device_client: Arc<DeviceClient>,
    pub sink_client: Arc<SinkClient>,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, device_client: DeviceClient, sink_client: SinkClient) -> Self {
        Self {
            config: Arc::new(config),
            device_client: Arc::new(device_client),
            sink_client: Arc::new(sink_client),
        }
    }
}
