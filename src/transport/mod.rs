//! Transport layers exposing the provisioning profile

pub mod ble;
