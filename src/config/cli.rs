//! Command-line argument parsing

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[clap(name = "ble-wifi-provisioner", version, author)]
#[clap(about = "Wi-Fi provisioning over a BLE GATT profile")]
pub struct CliArgs {
    /// Wireless network interface name
    #[clap(short, long, default_value = "wlan0")]
    pub interface: String,

    /// Name the device advertises under
    #[clap(short, long, default_value = "Blue Raspberry")]
    pub device_name: String,

    /// wpa_supplicant control socket directory
    #[clap(long, default_value = "/var/run/wpa_supplicant")]
    pub ctrl_dir: String,

    /// How long scan results are served before rescanning (milliseconds)
    #[clap(long, default_value = "5000")]
    pub scan_cache_ttl_ms: u64,

    /// Polling period of IP address and SSID notifications (milliseconds)
    #[clap(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_interval_ms: u64,

    /// Networks at or below this signal level (dBm) are not listed
    #[clap(long, default_value = "-85", allow_hyphen_values = true)]
    pub min_signal_dbm: i32,

    /// Enterprise (EAP) network listed despite being enterprise; repeatable
    #[clap(long = "enterprise-ssid", default_value = "eduroam")]
    pub enterprise_ssids: Vec<String>,
}
