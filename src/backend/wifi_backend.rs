//! WiFi backend trait definition

use trait_variant::make;

use crate::core::error::WifiResult;
use crate::core::types::{InterfaceStatus, NetworkInfo, SavedNetwork};

/// Abstraction over the wireless control interface (typically wpa_supplicant)
///
/// Every operation targets the interface the backend was created for.
/// Implementations apply their own timeouts; callers never retry.
#[make(Send)]
pub trait WifiBackend: Send + Sync + 'static {
    /// Trigger a scan and return the discovered networks
    async fn scan(&self) -> WifiResult<Vec<NetworkInfo>>;

    /// Current IP address and associated SSID
    async fn status(&self) -> WifiResult<InterfaceStatus>;

    /// Networks persisted in the configuration
    async fn list_saved_networks(&self) -> WifiResult<Vec<SavedNetwork>>;

    /// Allocate a new, empty network entry and return its id
    async fn add_network(&self) -> WifiResult<String>;

    /// Set a single field of a network entry
    ///
    /// `value` is passed verbatim, so string literals must already be quoted.
    async fn set_network_field(&self, network_id: &str, key: &str, value: &str) -> WifiResult<()>;

    async fn enable_network(&self, network_id: &str) -> WifiResult<()>;

    async fn select_network(&self, network_id: &str) -> WifiResult<()>;

    async fn remove_network(&self, network_id: &str) -> WifiResult<()>;

    /// Persist the current network list
    async fn save_config(&self) -> WifiResult<()>;

    async fn interface_up(&self) -> WifiResult<()>;

    async fn interface_down(&self) -> WifiResult<()>;
}
