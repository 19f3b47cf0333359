//! BLE Wi-Fi Provisioner - Main Entry Point

use std::sync::Arc;

use ble_wifi_provisioner::{
    ProvisioningServices,
    backend::WifiCtrlBackend,
    config::{CliArgs, Settings},
    transport::ble::{BleAdapter, GattServer},
};
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ble_wifi_provisioner=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();
    info!(?args, "Starting BLE Wi-Fi provisioner");
    let settings = Settings::from(args);

    let backend =
        Arc::new(WifiCtrlBackend::new(settings.interface.clone(), &settings.ctrl_dir).await?);
    info!("WiFi backend initialized for interface: {}", settings.interface);

    let services = Arc::new(ProvisioningServices::new(
        backend,
        settings.scan_policy(),
        settings.poll_interval,
    ));
    let gatt_server = Arc::new(GattServer::new(services));

    let mut adapter = BleAdapter::new(settings.device_name.clone(), gatt_server).await?;
    adapter.start().await?;

    #[cfg(feature = "systemd")]
    if let Err(e) = sd_notify::notify(false, &[sd_notify::NotifyState::Ready]) {
        warn!("Failed to notify systemd: {}", e);
    }

    info!("Service started successfully");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully");
        }
        _ = shutdown_signal() => {
            info!("Received SIGTERM, shutting down gracefully");
        }
        result = adapter.run_event_loop() => {
            if let Err(e) = result {
                error!("BLE adapter error: {}", e);
            }
        }
    }

    info!("Shutting down...");
    if let Err(e) = adapter.stop().await {
        warn!("Failed to stop BLE adapter cleanly: {}", e);
    }
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    std::future::pending::<()>().await
}
