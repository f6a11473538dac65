use std::sync::Arc;

use openback::{ContentDigestSigner, HttpOpenPaymentsClient, OpenPaymentsClient};

use crate::config::ServerConfig;
use crate::items::ItemStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub client: Arc<dyn OpenPaymentsClient>,
    pub items: Arc<ItemStore>,
}

impl AppState {
    /// State backed by the HTTP Open Payments client built from `config`.
    pub fn new(config: ServerConfig) -> Self {
        let client = HttpOpenPaymentsClient::new(config.credentials.clone(), ContentDigestSigner)
            .with_timeout(config.upstream_timeout)
            .with_plain_http(config.use_http);
        Self::with_client(config, Arc::new(client))
    }

    pub fn with_client(config: ServerConfig, client: Arc<dyn OpenPaymentsClient>) -> Self {
        Self {
            config: Arc::new(config),
            client,
            items: Arc::new(ItemStore::seeded()),
        }
    }
}
