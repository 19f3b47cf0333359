//! Cached, size-bounded scan results for the available-networks characteristic

use std::{collections::HashSet, sync::Arc, time::Duration};
use tokio::{sync::Mutex, time::Instant};
use tracing::{debug, warn};

use crate::{
    backend::WifiBackend,
    core::types::{AvailableNetwork, NetworkInfo},
};

/// Upper bound of the serialized payload, the longest value iOS reads back
pub const MAX_PAYLOAD_SIZE: usize = 512;

/// Payload served when the control interface fails
pub const FALLBACK_PAYLOAD: &[u8] = b"{}";

/// Filtering and caching policy for scan results
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPolicy {
    /// How long a payload is served without rescanning
    pub ttl: Duration,
    /// Networks at or below this level (dBm) are dropped
    pub min_signal_dbm: i32,
    /// Enterprise networks that are listed despite their EAP flag
    pub enterprise_allowlist: Vec<String>,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            ttl: Duration::from_millis(5000),
            min_signal_dbm: -85,
            enterprise_allowlist: vec!["eduroam".to_string()],
        }
    }
}

impl ScanPolicy {
    fn admits(&self, network: &NetworkInfo) -> bool {
        network.signal_level > self.min_signal_dbm
            && (!network.is_enterprise() || self.enterprise_allowlist.contains(&network.ssid))
    }
}

/// Filter, deduplicate and serialize scan results into a JSON array
///
/// Entries are appended in scan order until the next one would make the
/// payload reach `MAX_PAYLOAD_SIZE`; the array is never cut mid-entry.
pub fn build_payload(networks: &[NetworkInfo], policy: &ScanPolicy) -> Vec<u8> {
    let mut seen = HashSet::new();
    let mut entries: Vec<String> = Vec::new();
    // Length of "[" + entries joined by "," + "]"
    let mut length = 2;

    for network in networks.iter().filter(|n| policy.admits(n)) {
        if !seen.insert(network.ssid.as_str()) {
            continue;
        }

        let entry = AvailableNetwork {
            ssid: network.ssid.clone(),
            flags: network.flags.clone(),
        };
        let Ok(json) = serde_json::to_string(&entry) else {
            continue;
        };

        let separator = usize::from(!entries.is_empty());
        if length + separator + json.len() >= MAX_PAYLOAD_SIZE {
            break;
        }
        length += separator + json.len();
        entries.push(json);
    }

    format!("[{}]", entries.join(",")).into_bytes()
}

#[derive(Debug, Clone)]
struct ScanCacheEntry {
    payload: Vec<u8>,
    captured_at: Instant,
}

/// Most recent scan payload with a time-to-live
pub struct ScanCache<B: WifiBackend> {
    backend: Arc<B>,
    policy: ScanPolicy,
    entry: Mutex<Option<ScanCacheEntry>>,
}

impl<B: WifiBackend> ScanCache<B> {
    pub fn new(backend: Arc<B>, policy: ScanPolicy) -> Self {
        Self {
            backend,
            policy,
            entry: Mutex::new(None),
        }
    }

    /// Current payload, rescanning when the cached one has expired
    pub async fn read(&self) -> Vec<u8> {
        {
            let mut entry = self.entry.lock().await;
            if let Some(cached) = entry.as_ref() {
                if Instant::now() < cached.captured_at + self.policy.ttl {
                    debug!("Serving cached scan results");
                    return cached.payload.clone();
                }
            }
            *entry = None;
        }

        let networks = match self.backend.scan().await {
            Ok(networks) => networks,
            Err(e) => {
                warn!("Scan failed, serving empty payload: {}", e);
                return FALLBACK_PAYLOAD.to_vec();
            }
        };

        let payload = build_payload(&networks, &self.policy);
        debug!(
            "Scan cached: {} networks scanned, {} bytes",
            networks.len(),
            payload.len()
        );

        *self.entry.lock().await = Some(ScanCacheEntry {
            payload: payload.clone(),
            captured_at: Instant::now(),
        });
        payload
    }
}
