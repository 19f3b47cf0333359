//! wifi-ctrl backend implementation

use std::path::Path;
use tokio::process::Command;
use tracing::{debug, error};
use wifi_ctrl::sta::{RequestClient, WifiSetup};

use crate::{
    backend::WifiBackend,
    core::{
        error::{WifiError, WifiResult},
        types::{InterfaceStatus, NetworkInfo, SavedNetwork, parse_flags},
    },
};

/// wpa_supplicant backend talking to the control socket through wifi-ctrl
pub struct WifiCtrlBackend {
    interface: String,
    client: RequestClient,
}

impl WifiCtrlBackend {
    pub async fn new(interface: String, ctrl_dir: &str) -> WifiResult<Self> {
        let path = format!("{}/{}", ctrl_dir.trim_end_matches('/'), interface);
        if !Path::new(&path).exists() {
            return Err(WifiError::BackendUnavailable(format!(
                "no wpa_supplicant control socket at {}",
                path
            )));
        }

        let mut setup =
            WifiSetup::new().map_err(|e| WifiError::BackendUnavailable(e.to_string()))?;
        setup.set_socket_path(path);

        let client = setup.get_request_client();
        let station = setup.complete();

        // Spawn the station runtime
        tokio::spawn(async move {
            if let Err(e) = station.run().await {
                error!("WifiStation runtime error: {}", e);
            }
        });

        Ok(Self { interface, client })
    }

    /// Parse `LIST_NETWORKS` output
    ///
    /// The first line is a header; rows that do not carry exactly four
    /// tab-separated fields are skipped.
    fn parse_network_list(output: &str) -> Vec<SavedNetwork> {
        output
            .lines()
            .skip(1)
            .filter_map(|line| {
                let parts: Vec<&str> = line.split('\t').collect();
                if parts.len() != 4 {
                    return None;
                }
                Some(SavedNetwork {
                    network_id: parts[0].to_string(),
                    ssid: parts[1].to_string(),
                    bssid: parts[2].to_string(),
                    flags: parse_flags(parts[3]),
                })
            })
            .collect()
    }

    /// Send a raw control command, treating a `FAIL` reply as an error
    async fn request(&self, command: String) -> WifiResult<String> {
        debug!("wpa_supplicant request: {}", command);
        let reply = self
            .client
            .send_custom(command.clone())
            .await
            .map_err(|e| WifiError::WpaSupplicantError(format!("{}: {}", command, e)))?;

        if reply.trim().starts_with("FAIL") {
            return Err(WifiError::CommandRejected {
                command,
                reply: reply.trim().to_string(),
            });
        }
        Ok(reply)
    }

    /// Get IP address using ip command
    async fn get_ip_address(&self) -> Option<String> {
        let output = Command::new("ip")
            .args(["-4", "addr", "show", &self.interface])
            .output()
            .await
            .ok()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        for line in stdout.lines() {
            let line = line.trim();
            if line.starts_with("inet ") {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 {
                    let ip = parts[1].split('/').next()?;
                    return Some(ip.to_string());
                }
            }
        }

        None
    }

    async fn set_link(&self, state: &str) -> WifiResult<()> {
        debug!("Setting {} {}", self.interface, state);

        let output = Command::new("ip")
            .args(["link", "set", &self.interface, state])
            .output()
            .await
            .map_err(|e| WifiError::InterfaceError(format!("Failed to run ip: {}", e)))?;

        if !output.status.success() {
            return Err(WifiError::InterfaceError(format!(
                "ip link set {} {} failed: {}",
                self.interface,
                state,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

impl WifiBackend for WifiCtrlBackend {
    async fn scan(&self) -> WifiResult<Vec<NetworkInfo>> {
        debug!("Starting WiFi scan on interface: {}", self.interface);

        let results = self
            .client
            .get_scan()
            .await
            .map_err(|e| WifiError::ScanFailed(e.to_string()))?;

        let networks: Vec<NetworkInfo> = results
            .iter()
            .map(|res| NetworkInfo {
                ssid: res.name.clone(),
                flags: parse_flags(&res.flags),
                signal_level: res.signal as i32,
            })
            .collect();

        debug!("Scan complete, found {} networks", networks.len());
        Ok(networks)
    }

    async fn status(&self) -> WifiResult<InterfaceStatus> {
        let status =
            self.client.get_status().await.map_err(|e| {
                WifiError::WpaSupplicantError(format!("Failed to get status: {}", e))
            })?;

        let ssid = status.get("ssid").cloned();
        let ip_address = match status.get("ip_address").cloned() {
            Some(ip) => Some(ip),
            None if status.get("wpa_state").map(String::as_str) == Some("COMPLETED") => {
                self.get_ip_address().await
            }
            None => None,
        };

        Ok(InterfaceStatus { ip_address, ssid })
    }

    async fn list_saved_networks(&self) -> WifiResult<Vec<SavedNetwork>> {
        let output = self.request("LIST_NETWORKS".to_string()).await?;
        Ok(Self::parse_network_list(&output))
    }

    async fn add_network(&self) -> WifiResult<String> {
        let network_id = self.client.add_network().await.map_err(|e| {
            WifiError::WpaSupplicantError(format!("Failed to add network: {}", e))
        })?;
        Ok(network_id.to_string())
    }

    async fn set_network_field(&self, network_id: &str, key: &str, value: &str) -> WifiResult<()> {
        self.request(format!("SET_NETWORK {} {} {}", network_id, key, value))
            .await
            .map(|_| ())
    }

    async fn enable_network(&self, network_id: &str) -> WifiResult<()> {
        self.request(format!("ENABLE_NETWORK {}", network_id))
            .await
            .map(|_| ())
    }

    async fn select_network(&self, network_id: &str) -> WifiResult<()> {
        self.request(format!("SELECT_NETWORK {}", network_id))
            .await
            .map(|_| ())
    }

    async fn remove_network(&self, network_id: &str) -> WifiResult<()> {
        self.request(format!("REMOVE_NETWORK {}", network_id))
            .await
            .map(|_| ())
    }

    async fn save_config(&self) -> WifiResult<()> {
        self.client.save_config().await.map_err(|e| {
            WifiError::WpaSupplicantError(format!("Failed to save configuration: {}", e))
        })
    }

    async fn interface_up(&self) -> WifiResult<()> {
        self.set_link("up").await
    }

    async fn interface_down(&self) -> WifiResult<()> {
        self.set_link("down").await
    }
}
