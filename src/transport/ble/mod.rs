//! Bluetooth Low Energy transport layer

pub mod adapter;
pub mod gatt;
pub mod uuids;

pub use {
    adapter::BleAdapter,
    gatt::{BleNotifySink, GattServer},
    uuids::*,
};
