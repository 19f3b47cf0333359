//! GATT server implementation

use bluer::{
    Adapter,
    gatt::local::{
        Application, ApplicationHandle, Characteristic as GattCharacteristic,
        CharacteristicNotifier, CharacteristicNotify, CharacteristicNotifyMethod,
        CharacteristicRead, CharacteristicWrite, CharacteristicWriteMethod, Descriptor,
        DescriptorRead, ReqError, Service,
    },
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    backend::WifiBackend,
    core::{
        characteristics::Characteristic,
        error::{AttError, TransportResult},
        poller::NotificationSink,
        service::{ProvisioningServices, ServiceKind},
    },
};

use super::uuids::{USER_DESCRIPTION_UUID, characteristic_uuid, service_uuid};

impl From<AttError> for ReqError {
    fn from(err: AttError) -> Self {
        match err {
            AttError::InvalidOffset => ReqError::InvalidOffset,
            AttError::InvalidAttributeLength => ReqError::InvalidValueLength,
            // No dedicated ATT code for a malformed value in bluer
            AttError::InvalidArgument => ReqError::NotSupported,
            AttError::UnlikelyError => ReqError::Failed,
            AttError::NotSupported => ReqError::NotSupported,
        }
    }
}

/// Notification sink backed by a bluer notifier
pub struct BleNotifySink(CharacteristicNotifier);

impl NotificationSink for BleNotifySink {
    async fn push(&mut self, value: Vec<u8>) -> bool {
        match self.0.notify(value).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Notification failed: {}", e);
                false
            }
        }
    }

    fn is_closed(&self) -> bool {
        self.0.is_stopped()
    }
}

/// GATT server for the provisioning profile
pub struct GattServer<B: WifiBackend> {
    services: Arc<ProvisioningServices<B>>,
}

impl<B: WifiBackend> GattServer<B> {
    /// Create a new GATT server
    pub fn new(services: Arc<ProvisioningServices<B>>) -> Self {
        Self { services }
    }

    /// Build the GATT application
    pub fn build_application(&self) -> Application {
        Application {
            services: self
                .services
                .services()
                .into_iter()
                .map(|(kind, characteristics)| Self::build_service(kind, characteristics))
                .collect(),
            ..Default::default()
        }
    }

    fn build_service(kind: ServiceKind, characteristics: Vec<Arc<Characteristic<B>>>) -> Service {
        Service {
            uuid: service_uuid(kind),
            primary: true,
            characteristics: characteristics
                .into_iter()
                .map(Self::build_characteristic)
                .collect(),
            ..Default::default()
        }
    }

    fn build_characteristic(characteristic: Arc<Characteristic<B>>) -> GattCharacteristic {
        let kind = characteristic.kind();
        let properties = kind.properties();

        let read = properties.read.then(|| {
            let characteristic = characteristic.clone();
            CharacteristicRead {
                read: true,
                fun: Box::new(move |req| {
                    let characteristic = characteristic.clone();
                    Box::pin(async move {
                        // Room for the ATT opcode
                        let max_size = usize::from(req.mtu.saturating_sub(1));
                        characteristic
                            .on_read(usize::from(req.offset), max_size)
                            .await
                            .map_err(ReqError::from)
                    })
                }),
                ..Default::default()
            }
        });

        let write = properties.write.then(|| {
            let characteristic = characteristic.clone();
            CharacteristicWrite {
                write: true,
                write_without_response: false,
                method: CharacteristicWriteMethod::Fun(Box::new(move |new_value, _req| {
                    let characteristic = characteristic.clone();
                    Box::pin(async move {
                        characteristic
                            .on_write(&new_value)
                            .await
                            .map_err(ReqError::from)
                    })
                })),
                ..Default::default()
            }
        });

        let notify = properties.notify.then(|| {
            let characteristic = characteristic.clone();
            CharacteristicNotify {
                notify: true,
                method: CharacteristicNotifyMethod::Fun(Box::new(move |notifier| {
                    let characteristic = characteristic.clone();
                    Box::pin(async move {
                        debug!("{:?} notifications requested", characteristic.kind());
                        if let Err(e) = characteristic
                            .on_subscribe(BleNotifySink(notifier))
                            .await
                        {
                            warn!("Subscribe to {:?} rejected: {}", characteristic.kind(), e);
                        }
                    })
                })),
                ..Default::default()
            }
        });

        GattCharacteristic {
            uuid: characteristic_uuid(kind),
            read,
            write,
            notify,
            descriptors: vec![Self::user_description(kind.description())],
            ..Default::default()
        }
    }

    fn user_description(description: &'static str) -> Descriptor {
        Descriptor {
            uuid: USER_DESCRIPTION_UUID,
            read: Some(DescriptorRead {
                read: true,
                fun: Box::new(move |_req| {
                    Box::pin(async move { Ok(description.as_bytes().to_vec()) })
                }),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Register GATT application with adapter
    ///
    /// The application stays published for as long as the returned handle
    /// is alive.
    pub async fn register(&self, adapter: &Adapter) -> TransportResult<ApplicationHandle> {
        info!("Registering GATT application");
        let handle = adapter
            .serve_gatt_application(self.build_application())
            .await?;
        info!("GATT application registered");
        Ok(handle)
    }

    /// Stop every notification poller
    pub async fn shutdown(&self) {
        for (_, characteristics) in self.services.services() {
            for characteristic in characteristics {
                characteristic.on_unsubscribe().await;
            }
        }
    }
}
