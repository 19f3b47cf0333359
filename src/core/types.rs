//! Domain types for Wi-Fi provisioning

use serde::{Deserialize, Serialize};

/// Flag carried by the saved network wpa_supplicant is currently using
pub const CURRENT_FLAG: &str = "CURRENT";

/// Represents a network discovered by a scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Network SSID
    pub ssid: String,
    /// Capability flags, e.g. `WPA2-PSK-CCMP`, `ESS`
    pub flags: Vec<String>,
    /// Signal level in dBm
    pub signal_level: i32,
}

impl NetworkInfo {
    /// Whether the network advertises enterprise (802.1X) authentication
    pub fn is_enterprise(&self) -> bool {
        self.flags.iter().any(|flag| flag.contains("EAP"))
    }
}

/// A network persisted in the wpa_supplicant configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedNetwork {
    pub network_id: String,
    pub ssid: String,
    pub bssid: String,
    pub flags: Vec<String>,
}

impl SavedNetwork {
    /// Whether this entry is the one the interface is associated with
    pub fn is_current(&self) -> bool {
        self.flags.iter().any(|flag| flag == CURRENT_FLAG)
    }
}

/// Liveness fields of the wireless interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceStatus {
    /// Assigned IPv4 address
    pub ip_address: Option<String>,
    /// SSID of the associated network
    pub ssid: Option<String>,
}

/// Liveness field tracked by a notifying characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessField {
    IpAddress,
    Ssid,
}

impl LivenessField {
    /// Extract the field from a status sample, empty when absent
    pub fn extract(&self, status: &InterfaceStatus) -> String {
        let value = match self {
            LivenessField::IpAddress => &status.ip_address,
            LivenessField::Ssid => &status.ssid,
        };
        value.clone().unwrap_or_default()
    }
}

/// Entry of the available-networks payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailableNetwork {
    pub ssid: String,
    pub flags: Vec<String>,
}

/// Entry of the known-networks payload
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KnownNetwork {
    pub ssid: String,
    pub selected: bool,
}

/// Split a wpa_supplicant flag string such as `[WPA2-PSK-CCMP][ESS]`
pub fn parse_flags(raw: &str) -> Vec<String> {
    raw.split(['[', ']'])
        .map(str::trim)
        .filter(|flag| !flag.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_flags() {
        assert_eq!(
            parse_flags("[WPA2-PSK-CCMP][ESS]"),
            vec!["WPA2-PSK-CCMP".to_string(), "ESS".to_string()]
        );
        assert_eq!(parse_flags("[CURRENT]"), vec!["CURRENT".to_string()]);
        assert!(parse_flags("").is_empty());
    }

    #[test]
    fn test_enterprise_detection() {
        let network = NetworkInfo {
            ssid: "corp".into(),
            flags: parse_flags("[WPA2-EAP-CCMP][ESS]"),
            signal_level: -50,
        };
        assert!(network.is_enterprise());

        let network = NetworkInfo {
            ssid: "home".into(),
            flags: parse_flags("[WPA2-PSK-CCMP][ESS]"),
            signal_level: -50,
        };
        assert!(!network.is_enterprise());
    }

    #[test]
    fn test_liveness_field_extract() {
        let status = InterfaceStatus {
            ip_address: Some("192.168.1.20".into()),
            ssid: None,
        };
        assert_eq!(LivenessField::IpAddress.extract(&status), "192.168.1.20");
        assert_eq!(LivenessField::Ssid.extract(&status), "");
    }

    #[test]
    fn test_saved_network_current() {
        let network = SavedNetwork {
            network_id: "0".into(),
            ssid: "home".into(),
            bssid: "any".into(),
            flags: parse_flags("[CURRENT]"),
        };
        assert!(network.is_current());
    }
}
