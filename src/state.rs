use std::sync::Arc;

use crate::broadcast::Broadcaster;
use crate::config::HubConfig;
use crate::dispatch::Dispatcher;
use crate::registry::Registry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Registry>,
    pub dispatcher: Dispatcher,
    pub broadcaster: Broadcaster,
    pub config: HubConfig,
}

impl AppState {
    pub fn new(config: HubConfig) -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            dispatcher: Dispatcher::new(registry.clone()),
            broadcaster: Broadcaster::new(registry.clone()),
            registry,
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}
