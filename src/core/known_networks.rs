//! Saved-network view for the known-networks characteristic

use std::sync::Arc;
use tracing::{error, warn};

use crate::{
    backend::WifiBackend,
    core::{scan_cache::FALLBACK_PAYLOAD, types::KnownNetwork},
};

/// Always-fresh JSON view of the saved networks
pub struct KnownNetworks<B: WifiBackend> {
    backend: Arc<B>,
}

impl<B: WifiBackend> KnownNetworks<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Saved networks as `[{ssid, selected}]`, `{}` on failure
    pub async fn read(&self) -> Vec<u8> {
        let saved = match self.backend.list_saved_networks().await {
            Ok(saved) => saved,
            Err(e) => {
                warn!("Listing saved networks failed: {}", e);
                return FALLBACK_PAYLOAD.to_vec();
            }
        };

        let known: Vec<KnownNetwork> = saved
            .iter()
            .map(|network| KnownNetwork {
                ssid: network.ssid.clone(),
                selected: network.is_current(),
            })
            .collect();

        serde_json::to_vec(&known).unwrap_or_else(|e| {
            error!("Failed to serialize known networks: {}", e);
            FALLBACK_PAYLOAD.to_vec()
        })
    }
}
