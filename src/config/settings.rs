//! Runtime settings

use std::time::Duration;

use crate::{config::CliArgs, core::scan_cache::ScanPolicy};

/// Runtime configuration settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub interface: String,
    pub device_name: String,
    pub ctrl_dir: String,
    pub scan_cache_ttl: Duration,
    pub poll_interval: Duration,
    pub min_signal_dbm: i32,
    pub enterprise_ssids: Vec<String>,
}

impl Settings {
    pub fn scan_policy(&self) -> ScanPolicy {
        ScanPolicy {
            ttl: self.scan_cache_ttl,
            min_signal_dbm: self.min_signal_dbm,
            enterprise_allowlist: self.enterprise_ssids.clone(),
        }
    }
}

impl From<CliArgs> for Settings {
    fn from(args: CliArgs) -> Self {
        Settings {
            interface: args.interface,
            device_name: args.device_name,
            ctrl_dir: args.ctrl_dir,
            scan_cache_ttl: Duration::from_millis(args.scan_cache_ttl_ms),
            poll_interval: Duration::from_millis(args.poll_interval_ms),
            min_signal_dbm: args.min_signal_dbm,
            enterprise_ssids: args.enterprise_ssids,
        }
    }
}
