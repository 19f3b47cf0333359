//! BLE GATT UUIDs of the provisioning profile

use uuid::Uuid;

use crate::core::{characteristics::CharacteristicKind, service::ServiceKind};

/// Service UUID carried in advertisements
pub const ADVERTISED_SERVICE_UUID: Uuid = Uuid::from_u128(0xd3bec8c1_2b35_40e2_b92b_f9b429f4d3e5);

/// Connectivity service UUID
pub const CONNECTIVITY_SERVICE_UUID: Uuid = Uuid::from_u128(0x8f7e321d_df0a_4096_bb5b_34c267671b06);

/// Wi-Fi configuration service UUID
pub const WIFI_CONFIG_SERVICE_UUID: Uuid = Uuid::from_u128(0xb2adb965_76f6_4afe_9450_2117326a6afb);

// Connectivity service characteristics
/// Current IPv4 address (read/notify)
pub const IP_ADDRESS_CHAR_UUID: Uuid = Uuid::from_u128(0x132d7244_46c0_481b_b947_42f329f6be55);

/// Connected SSID (read/notify)
pub const SSID_CHAR_UUID: Uuid = Uuid::from_u128(0xef92dd60_b49c_4874_b93f_018e80fcf818);

// Wi-Fi configuration service characteristics
/// Visible networks as JSON (read, chunked)
pub const AVAILABLE_NETWORKS_CHAR_UUID: Uuid =
    Uuid::from_u128(0x94f76327_6bc8_4b86_a3c5_f96f90574267);

/// Saved networks as JSON (read, chunked)
pub const KNOWN_NETWORKS_CHAR_UUID: Uuid = Uuid::from_u128(0xef0cc4ae_40b0_493f_a5c3_e4bc83f0d8dd);

/// Join request as JSON (write)
pub const CONNECT_NETWORK_CHAR_UUID: Uuid = Uuid::from_u128(0xe5508928_1536_4ef4_9bbd_b9a65c183d03);

/// SSID to remove (write)
pub const FORGET_NETWORK_CHAR_UUID: Uuid = Uuid::from_u128(0xa5df4bff_5fee_43f8_8566_07d9a98eb734);

/// Interface on/off, one byte (write)
pub const WIFI_SWITCH_CHAR_UUID: Uuid = Uuid::from_u128(0x640bef8f_0048_4a65_98bd_287731cf282c);

/// Characteristic User Description descriptor
pub const USER_DESCRIPTION_UUID: Uuid = Uuid::from_u128(0x00002901_0000_1000_8000_00805f9b34fb);

pub fn service_uuid(kind: ServiceKind) -> Uuid {
    match kind {
        ServiceKind::Connectivity => CONNECTIVITY_SERVICE_UUID,
        ServiceKind::WifiConfig => WIFI_CONFIG_SERVICE_UUID,
    }
}

pub fn characteristic_uuid(kind: CharacteristicKind) -> Uuid {
    match kind {
        CharacteristicKind::IpAddress => IP_ADDRESS_CHAR_UUID,
        CharacteristicKind::ConnectedSsid => SSID_CHAR_UUID,
        CharacteristicKind::AvailableNetworks => AVAILABLE_NETWORKS_CHAR_UUID,
        CharacteristicKind::KnownNetworks => KNOWN_NETWORKS_CHAR_UUID,
        CharacteristicKind::ConnectNetwork => CONNECT_NETWORK_CHAR_UUID,
        CharacteristicKind::ForgetNetwork => FORGET_NETWORK_CHAR_UUID,
        CharacteristicKind::WifiSwitch => WIFI_SWITCH_CHAR_UUID,
    }
}
