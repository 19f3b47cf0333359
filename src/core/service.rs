//! The two GATT services of the provisioning profile

use std::{sync::Arc, time::Duration};

use crate::{
    backend::WifiBackend,
    core::{
        characteristics::{Characteristic, LivenessCharacteristic},
        chunked::ChunkedRead,
        connector::NetworkConnector,
        known_networks::KnownNetworks,
        scan_cache::{ScanCache, ScanPolicy},
        types::LivenessField,
    },
};

/// Identifies a service of the provisioning profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Connectivity,
    WifiConfig,
}

/// Read/notify view of the current IP address and SSID
pub struct ConnectivityService<B: WifiBackend> {
    pub ip_address: Arc<Characteristic<B>>,
    pub ssid: Arc<Characteristic<B>>,
}

impl<B: WifiBackend> ConnectivityService<B> {
    pub fn new(backend: Arc<B>, poll_interval: Duration) -> Self {
        Self {
            ip_address: Arc::new(Characteristic::IpAddress(LivenessCharacteristic::new(
                backend.clone(),
                LivenessField::IpAddress,
                poll_interval,
            ))),
            ssid: Arc::new(Characteristic::ConnectedSsid(LivenessCharacteristic::new(
                backend,
                LivenessField::Ssid,
                poll_interval,
            ))),
        }
    }

    pub fn characteristics(&self) -> Vec<Arc<Characteristic<B>>> {
        vec![self.ip_address.clone(), self.ssid.clone()]
    }
}

/// Network discovery and management
pub struct WifiConfigService<B: WifiBackend> {
    pub available_networks: Arc<Characteristic<B>>,
    pub known_networks: Arc<Characteristic<B>>,
    pub connect_network: Arc<Characteristic<B>>,
    pub forget_network: Arc<Characteristic<B>>,
    pub wifi_switch: Arc<Characteristic<B>>,
}

impl<B: WifiBackend> WifiConfigService<B> {
    pub fn new(backend: Arc<B>, scan_policy: ScanPolicy) -> Self {
        let connector = Arc::new(NetworkConnector::new(backend.clone()));

        Self {
            available_networks: Arc::new(Characteristic::AvailableNetworks {
                cache: ScanCache::new(backend.clone(), scan_policy),
                chunked: ChunkedRead::new(),
            }),
            known_networks: Arc::new(Characteristic::KnownNetworks {
                view: KnownNetworks::new(backend.clone()),
                chunked: ChunkedRead::new(),
            }),
            connect_network: Arc::new(Characteristic::ConnectNetwork(connector.clone())),
            forget_network: Arc::new(Characteristic::ForgetNetwork(connector)),
            wifi_switch: Arc::new(Characteristic::WifiSwitch(backend)),
        }
    }

    pub fn characteristics(&self) -> Vec<Arc<Characteristic<B>>> {
        vec![
            self.available_networks.clone(),
            self.known_networks.clone(),
            self.connect_network.clone(),
            self.forget_network.clone(),
            self.wifi_switch.clone(),
        ]
    }
}

/// Both services, sharing one backend
///
/// Built once at startup and handed to the transport.
pub struct ProvisioningServices<B: WifiBackend> {
    pub connectivity: ConnectivityService<B>,
    pub wifi_config: WifiConfigService<B>,
}

impl<B: WifiBackend> ProvisioningServices<B> {
    pub fn new(backend: Arc<B>, scan_policy: ScanPolicy, poll_interval: Duration) -> Self {
        Self {
            connectivity: ConnectivityService::new(backend.clone(), poll_interval),
            wifi_config: WifiConfigService::new(backend, scan_policy),
        }
    }

    /// Every service with its characteristics, in registration order
    pub fn services(&self) -> Vec<(ServiceKind, Vec<Arc<Characteristic<B>>>)> {
        vec![
            (ServiceKind::Connectivity, self.connectivity.characteristics()),
            (ServiceKind::WifiConfig, self.wifi_config.characteristics()),
        ]
    }

    /// Look up a characteristic by kind
    #[cfg(test)]
    pub(crate) fn characteristic(
        &self,
        kind: crate::core::characteristics::CharacteristicKind,
    ) -> Arc<Characteristic<B>> {
        use crate::core::characteristics::CharacteristicKind;

        match kind {
            CharacteristicKind::IpAddress => self.connectivity.ip_address.clone(),
            CharacteristicKind::ConnectedSsid => self.connectivity.ssid.clone(),
            CharacteristicKind::AvailableNetworks => self.wifi_config.available_networks.clone(),
            CharacteristicKind::KnownNetworks => self.wifi_config.known_networks.clone(),
            CharacteristicKind::ConnectNetwork => self.wifi_config.connect_network.clone(),
            CharacteristicKind::ForgetNetwork => self.wifi_config.forget_network.clone(),
            CharacteristicKind::WifiSwitch => self.wifi_config.wifi_switch.clone(),
        }
    }
}
