use std::sync::Arc;

use notifex_config::Config;
use notifex_core::Aggregator;

/// Shared application state handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(aggregator: Arc<Aggregator>, config: Arc<Config>) -> Self {
        Self { aggregator, config }
    }
}
