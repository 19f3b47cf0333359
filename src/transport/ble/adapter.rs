//! BLE adapter management

use bluer::{
    Adapter, AdapterEvent,
    adv::{Advertisement, AdvertisementHandle, Type},
    gatt::local::ApplicationHandle,
};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    backend::WifiBackend,
    core::error::TransportResult,
    transport::ble::{gatt::GattServer, uuids::ADVERTISED_SERVICE_UUID},
};

/// BLE transport adapter
///
/// Owns the advertisement and GATT registration handles; dropping them
/// would unpublish the device.
pub struct BleAdapter<B: WifiBackend> {
    adapter: Adapter,
    gatt_server: Arc<GattServer<B>>,
    device_name: String,
    advertisement: Option<AdvertisementHandle>,
    application: Option<ApplicationHandle>,
}

impl<B: WifiBackend> BleAdapter<B> {
    /// Create a new BLE adapter on the default controller
    pub async fn new(device_name: String, gatt_server: Arc<GattServer<B>>) -> TransportResult<Self> {
        let session = bluer::Session::new().await?;
        let adapter = session.default_adapter().await?;

        info!("Using BLE adapter: {}", adapter.name());

        Ok(Self {
            adapter,
            gatt_server,
            device_name,
            advertisement: None,
            application: None,
        })
    }

    /// Power up, publish the GATT application and start advertising
    pub async fn start(&mut self) -> TransportResult<()> {
        info!("Starting BLE adapter");

        self.adapter.set_powered(true).await?;
        self.adapter.set_alias(self.device_name.clone()).await?;
        self.adapter.set_discoverable(true).await?;
        self.adapter.set_pairable(true).await?;

        self.application = Some(self.gatt_server.register(&self.adapter).await?);

        let advertisement = Advertisement {
            advertisement_type: Type::Peripheral,
            service_uuids: [ADVERTISED_SERVICE_UUID].into_iter().collect(),
            discoverable: Some(true),
            local_name: Some(self.device_name.clone()),
            ..Default::default()
        };
        self.advertisement = Some(self.adapter.advertise(advertisement).await?);

        info!("Advertising as '{}'", self.device_name);
        Ok(())
    }

    /// Stop notifications, unpublish and stop advertising
    pub async fn stop(&mut self) -> TransportResult<()> {
        info!("Stopping BLE adapter");

        self.gatt_server.shutdown().await;
        self.advertisement = None;
        self.application = None;
        self.adapter.set_discoverable(false).await?;

        info!("BLE adapter stopped");
        Ok(())
    }

    /// Run event loop (process BLE events)
    pub async fn run_event_loop(&self) -> TransportResult<()> {
        let mut events = self.adapter.events().await?;

        info!("BLE event loop started");

        while let Some(event) = events.next().await {
            match event {
                AdapterEvent::DeviceAdded(addr) => {
                    debug!("Device added: {}", addr);
                }
                AdapterEvent::DeviceRemoved(addr) => {
                    debug!("Device removed: {}", addr);
                }
                AdapterEvent::PropertyChanged(prop) => {
                    debug!("Adapter property changed: {:?}", prop);
                }
            }
        }

        warn!("BLE event loop ended");
        Ok(())
    }
}
