//! BLE Wi-Fi Provisioner
//!
//! Exposes the Wi-Fi state of a headless Linux device over two BLE GATT
//! services and lets a client scan, join and forget networks through
//! wpa_supplicant.

pub mod backend;
pub mod config;
pub mod core;
pub mod transport;

pub use core::{
    error::{AttError, ServiceError, TransportError, WifiError},
    service::ProvisioningServices,
    types::{InterfaceStatus, NetworkInfo, SavedNetwork},
};
