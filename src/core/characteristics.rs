//! The GATT characteristic set, independent of the BLE stack
//!
//! Each characteristic is one variant of [`Characteristic`] holding its own
//! state; the BLE transport only forwards read, write, subscribe and
//! unsubscribe events to it.

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    backend::WifiBackend,
    core::{
        chunked::ChunkedRead,
        connector::{ForgetOutcome, NetworkConnector},
        credentials::JoinParams,
        error::{AttError, AttResult, ServiceError},
        known_networks::KnownNetworks,
        poller::{self, NotificationPoller, NotificationSink},
        scan_cache::ScanCache,
        types::LivenessField,
    },
};

/// Identifies a characteristic of the provisioning profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    IpAddress,
    ConnectedSsid,
    AvailableNetworks,
    KnownNetworks,
    ConnectNetwork,
    ForgetNetwork,
    WifiSwitch,
}

/// Operations a characteristic exposes to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Properties {
    pub read: bool,
    pub write: bool,
    pub notify: bool,
}

impl CharacteristicKind {
    /// Value of the user description descriptor
    pub fn description(&self) -> &'static str {
        match self {
            CharacteristicKind::IpAddress => "IP Address",
            CharacteristicKind::ConnectedSsid => "Connected SSID",
            CharacteristicKind::AvailableNetworks => "Available Networks",
            CharacteristicKind::KnownNetworks => "Known Networks",
            CharacteristicKind::ConnectNetwork => "Connect to Network",
            CharacteristicKind::ForgetNetwork => "Forget Network",
            CharacteristicKind::WifiSwitch => "Turn On or Off Wi-Fi",
        }
    }

    pub fn properties(&self) -> Properties {
        match self {
            CharacteristicKind::IpAddress | CharacteristicKind::ConnectedSsid => Properties {
                read: true,
                write: false,
                notify: true,
            },
            CharacteristicKind::AvailableNetworks | CharacteristicKind::KnownNetworks => {
                Properties {
                    read: true,
                    write: false,
                    notify: false,
                }
            }
            CharacteristicKind::ConnectNetwork
            | CharacteristicKind::ForgetNetwork
            | CharacteristicKind::WifiSwitch => Properties {
                read: false,
                write: true,
                notify: false,
            },
        }
    }
}

/// IP address or connected SSID: fresh reads plus change notifications
pub struct LivenessCharacteristic<B: WifiBackend> {
    backend: Arc<B>,
    field: LivenessField,
    chunked: ChunkedRead,
    poller: NotificationPoller<B>,
}

impl<B: WifiBackend> LivenessCharacteristic<B> {
    pub fn new(backend: Arc<B>, field: LivenessField, poll_interval: std::time::Duration) -> Self {
        Self {
            poller: NotificationPoller::new(backend.clone(), field, poll_interval),
            backend,
            field,
            chunked: ChunkedRead::new(),
        }
    }
}

/// A characteristic of the provisioning profile and its private state
pub enum Characteristic<B: WifiBackend> {
    IpAddress(LivenessCharacteristic<B>),
    ConnectedSsid(LivenessCharacteristic<B>),
    AvailableNetworks {
        cache: ScanCache<B>,
        chunked: ChunkedRead,
    },
    KnownNetworks {
        view: KnownNetworks<B>,
        chunked: ChunkedRead,
    },
    ConnectNetwork(Arc<NetworkConnector<B>>),
    ForgetNetwork(Arc<NetworkConnector<B>>),
    WifiSwitch(Arc<B>),
}

impl<B: WifiBackend> Characteristic<B> {
    pub fn kind(&self) -> CharacteristicKind {
        match self {
            Characteristic::IpAddress(_) => CharacteristicKind::IpAddress,
            Characteristic::ConnectedSsid(_) => CharacteristicKind::ConnectedSsid,
            Characteristic::AvailableNetworks { .. } => CharacteristicKind::AvailableNetworks,
            Characteristic::KnownNetworks { .. } => CharacteristicKind::KnownNetworks,
            Characteristic::ConnectNetwork(_) => CharacteristicKind::ConnectNetwork,
            Characteristic::ForgetNetwork(_) => CharacteristicKind::ForgetNetwork,
            Characteristic::WifiSwitch(_) => CharacteristicKind::WifiSwitch,
        }
    }

    /// Handle a read request at `offset`, answering at most `max_size`
    /// bytes for the first chunk
    pub async fn on_read(&self, offset: usize, max_size: usize) -> AttResult<Vec<u8>> {
        debug!("{:?} read at offset {}", self.kind(), offset);

        match self {
            Characteristic::IpAddress(c) | Characteristic::ConnectedSsid(c) => {
                c.chunked
                    .read(offset, max_size, || async {
                        poller::sample(c.backend.as_ref(), c.field)
                            .await
                            .into_bytes()
                    })
                    .await
            }
            Characteristic::AvailableNetworks { cache, chunked } => {
                chunked.read(offset, max_size, || cache.read()).await
            }
            Characteristic::KnownNetworks { view, chunked } => {
                chunked.read(offset, max_size, || view.read()).await
            }
            _ => Err(AttError::NotSupported),
        }
    }

    /// Handle a write request carrying `value`
    pub async fn on_write(&self, value: &[u8]) -> AttResult<()> {
        debug!("{:?} write ({} bytes)", self.kind(), value.len());

        match self {
            Characteristic::ConnectNetwork(connector) => {
                let params = JoinParams::parse(value).map_err(|e| {
                    warn!("Rejecting connect request: {}", e);
                    AttError::from(e)
                })?;

                match connector.connect(&params).await {
                    Ok(path) => {
                        info!("Connect request for {} accepted: {:?}", params.ssid, path);
                        Ok(())
                    }
                    Err(e) => {
                        error!("Connect to {} failed: {}", params.ssid, e);
                        Err(AttError::from(e))
                    }
                }
            }
            Characteristic::ForgetNetwork(connector) => {
                let ssid = std::str::from_utf8(value).map_err(|e| {
                    warn!("Rejecting forget request: {}", e);
                    AttError::InvalidArgument
                })?;

                match connector.forget(ssid).await {
                    Ok(ForgetOutcome::Removed(_)) => Ok(()),
                    Ok(ForgetOutcome::NotFound) => {
                        warn!("Forget: {} is not a saved network", ssid);
                        Ok(())
                    }
                    Err(e) => {
                        error!("Forget {} failed: {}", ssid, e);
                        Err(AttError::from(e))
                    }
                }
            }
            Characteristic::WifiSwitch(backend) => {
                let [command] = value else {
                    return Err(AttError::InvalidAttributeLength);
                };

                let result = if *command == 0 {
                    info!("Turning Wi-Fi off");
                    backend.interface_down().await
                } else {
                    info!("Turning Wi-Fi on");
                    backend.interface_up().await
                };
                result.map_err(|e| {
                    error!("Wi-Fi switch failed: {}", e);
                    AttError::from(ServiceError::from(e))
                })
            }
            _ => Err(AttError::NotSupported),
        }
    }

    /// Start pushing change notifications to `sink`
    pub async fn on_subscribe<S: NotificationSink>(&self, sink: S) -> AttResult<()> {
        match self {
            Characteristic::IpAddress(c) | Characteristic::ConnectedSsid(c) => {
                c.poller.subscribe(sink).await;
                Ok(())
            }
            _ => Err(AttError::NotSupported),
        }
    }

    pub async fn on_unsubscribe(&self) {
        if let Characteristic::IpAddress(c) | Characteristic::ConnectedSsid(c) = self {
            c.poller.unsubscribe().await;
        }
    }
}
