//! Mock WiFi backend for testing

use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

use crate::backend::WifiBackend;
use crate::core::error::{WifiError, WifiResult};
use crate::core::types::{InterfaceStatus, NetworkInfo, SavedNetwork};

/// A control-interface call observed by the mock
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Scan,
    Status,
    ListSavedNetworks,
    AddNetwork,
    SetNetworkField {
        id: String,
        key: String,
        value: String,
    },
    EnableNetwork(String),
    SelectNetwork(String),
    RemoveNetwork(String),
    SaveConfig,
    InterfaceUp,
    InterfaceDown,
}

/// Internal state for the mock backend
#[derive(Debug, Default)]
struct MockState {
    scan_results: Vec<NetworkInfo>,
    status: InterfaceStatus,
    saved_networks: Vec<SavedNetwork>,
    next_network_id: usize,
    should_fail_scan: bool,
    should_fail_status: bool,
    should_fail_list: bool,
    should_fail_commands: bool,
    failing_field: Option<String>,
    status_gate: Option<Arc<Notify>>,
    calls: Vec<BackendCall>,
}

/// Mock WiFi backend for testing
///
/// Keeps an in-memory saved-network list so connect/forget flows can be
/// exercised end to end, and records every call for later inspection.
#[derive(Debug, Clone, Default)]
pub struct MockWifiBackend {
    inner: Arc<Mutex<MockState>>,
}

impl MockWifiBackend {
    /// Create a new mock backend with default state
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure mock to return specific networks on scan
    pub async fn set_scan_results(&self, networks: Vec<NetworkInfo>) {
        self.inner.lock().await.scan_results = networks;
    }

    /// Configure the status sample
    pub async fn set_status(&self, ip_address: Option<&str>, ssid: Option<&str>) {
        self.inner.lock().await.status = InterfaceStatus {
            ip_address: ip_address.map(str::to_string),
            ssid: ssid.map(str::to_string),
        };
    }

    /// Seed the saved-network list
    pub async fn set_saved_networks(&self, networks: Vec<SavedNetwork>) {
        let mut state = self.inner.lock().await;
        state.next_network_id = networks.len();
        state.saved_networks = networks;
    }

    /// Configure mock to fail scan operations
    pub async fn set_scan_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_scan = should_fail;
    }

    /// Configure mock to fail status queries
    pub async fn set_status_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_status = should_fail;
    }

    /// Configure mock to fail listing saved networks
    pub async fn set_list_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_list = should_fail;
    }

    /// Configure mock to fail every mutating command
    pub async fn set_command_failure(&self, should_fail: bool) {
        self.inner.lock().await.should_fail_commands = should_fail;
    }

    /// Reject `SET_NETWORK` for a single field name
    pub async fn fail_field(&self, key: &str) {
        self.inner.lock().await.failing_field = Some(key.to_string());
    }

    /// Make status queries block until `release_status`
    pub async fn hold_status(&self) {
        self.inner.lock().await.status_gate = Some(Arc::new(Notify::new()));
    }

    /// Unblock status queries held by `hold_status`
    pub async fn release_status(&self) {
        if let Some(gate) = self.inner.lock().await.status_gate.take() {
            gate.notify_waiters();
        }
    }

    /// Calls observed so far
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.inner.lock().await.calls.clone()
    }

    /// Number of scans triggered so far
    pub async fn scan_count(&self) -> usize {
        self.inner
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| **call == BackendCall::Scan)
            .count()
    }

    /// Snapshot of the saved-network list
    pub async fn saved_networks(&self) -> Vec<SavedNetwork> {
        self.inner.lock().await.saved_networks.clone()
    }

    fn command(state: &mut MockState, call: BackendCall) -> WifiResult<()> {
        let name = format!("{:?}", call);
        state.calls.push(call);
        if state.should_fail_commands {
            Err(WifiError::CommandRejected {
                command: name,
                reply: "FAIL".into(),
            })
        } else {
            Ok(())
        }
    }
}

impl WifiBackend for MockWifiBackend {
    async fn scan(&self) -> WifiResult<Vec<NetworkInfo>> {
        let mut state = self.inner.lock().await;
        state.calls.push(BackendCall::Scan);
        if state.should_fail_scan {
            Err(WifiError::ScanFailed("Mock scan failure".into()))
        } else {
            Ok(state.scan_results.clone())
        }
    }

    async fn status(&self) -> WifiResult<InterfaceStatus> {
        let gate = {
            let mut state = self.inner.lock().await;
            state.calls.push(BackendCall::Status);
            state.status_gate.clone()
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.inner.lock().await;
        if state.should_fail_status {
            Err(WifiError::WpaSupplicantError("Mock status failure".into()))
        } else {
            Ok(state.status.clone())
        }
    }

    async fn list_saved_networks(&self) -> WifiResult<Vec<SavedNetwork>> {
        let mut state = self.inner.lock().await;
        state.calls.push(BackendCall::ListSavedNetworks);
        if state.should_fail_list {
            Err(WifiError::WpaSupplicantError("Mock list failure".into()))
        } else {
            Ok(state.saved_networks.clone())
        }
    }

    async fn add_network(&self) -> WifiResult<String> {
        let mut state = self.inner.lock().await;
        Self::command(&mut state, BackendCall::AddNetwork)?;

        let id = state.next_network_id.to_string();
        state.next_network_id += 1;
        state.saved_networks.push(SavedNetwork {
            network_id: id.clone(),
            ssid: String::new(),
            bssid: "any".into(),
            flags: vec![],
        });
        Ok(id)
    }

    async fn set_network_field(&self, network_id: &str, key: &str, value: &str) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        Self::command(
            &mut state,
            BackendCall::SetNetworkField {
                id: network_id.to_string(),
                key: key.to_string(),
                value: value.to_string(),
            },
        )?;

        if state.failing_field.as_deref() == Some(key) {
            return Err(WifiError::CommandRejected {
                command: format!("SET_NETWORK {} {}", network_id, key),
                reply: "FAIL".into(),
            });
        }

        if key == "ssid" {
            let ssid = value.trim_matches('"').to_string();
            if let Some(network) = state
                .saved_networks
                .iter_mut()
                .find(|n| n.network_id == network_id)
            {
                network.ssid = ssid;
            }
        }
        Ok(())
    }

    async fn enable_network(&self, network_id: &str) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        Self::command(&mut state, BackendCall::EnableNetwork(network_id.to_string()))
    }

    async fn select_network(&self, network_id: &str) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        Self::command(&mut state, BackendCall::SelectNetwork(network_id.to_string()))?;

        for network in state.saved_networks.iter_mut() {
            network.flags.retain(|flag| flag != crate::core::types::CURRENT_FLAG);
            if network.network_id == network_id {
                network.flags.push(crate::core::types::CURRENT_FLAG.to_string());
            }
        }
        Ok(())
    }

    async fn remove_network(&self, network_id: &str) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        Self::command(&mut state, BackendCall::RemoveNetwork(network_id.to_string()))?;
        state.saved_networks.retain(|n| n.network_id != network_id);
        Ok(())
    }

    async fn save_config(&self) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        Self::command(&mut state, BackendCall::SaveConfig)
    }

    async fn interface_up(&self) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        Self::command(&mut state, BackendCall::InterfaceUp)
    }

    async fn interface_down(&self) -> WifiResult<()> {
        let mut state = self.inner.lock().await;
        Self::command(&mut state, BackendCall::InterfaceDown)
    }
}
