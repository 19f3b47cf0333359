//! Connect and forget flows against the saved-network list

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    backend::WifiBackend,
    core::{
        credentials::{self, JoinParams},
        error::{ServiceError, ServiceResult},
        resolver::{self, Resolution},
    },
};

/// Which path a successful connect request took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectPath {
    /// An existing saved network was selected
    Saved(String),
    /// A new network entry was created and selected
    Created(String),
}

/// Result of a forget request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForgetOutcome {
    Removed(String),
    NotFound,
}

/// Drives connect and forget requests through the WiFi backend
///
/// A failed step aborts the flow; nothing is rolled back, so a network id
/// allocated for a new entry may remain if a later field set fails.
pub struct NetworkConnector<B: WifiBackend> {
    backend: Arc<B>,
}

impl<B: WifiBackend> NetworkConnector<B> {
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    /// Connect to the network described by `params`
    ///
    /// A saved network with the same SSID takes precedence over any
    /// credentials in the request.
    pub async fn connect(&self, params: &JoinParams) -> ServiceResult<ConnectPath> {
        let saved = self.backend.list_saved_networks().await?;

        match resolver::resolve(&params.ssid, &saved) {
            Resolution::Known(id) => {
                info!("Connecting to saved network {} ({})", params.ssid, id);
                self.connect_saved(&id).await?;
                Ok(ConnectPath::Saved(id))
            }
            Resolution::New => {
                info!("Creating network entry for {}", params.ssid);
                let id = self.create_network(params).await?;
                self.connect_saved(&id).await?;
                Ok(ConnectPath::Created(id))
            }
        }
    }

    /// Enable, persist and select a saved network
    pub async fn connect_saved(&self, network_id: &str) -> ServiceResult<()> {
        self.backend.enable_network(network_id).await?;
        self.backend.save_config().await?;
        self.backend.select_network(network_id).await?;
        debug!("Network {} selected", network_id);
        Ok(())
    }

    async fn create_network(&self, params: &JoinParams) -> ServiceResult<String> {
        let formatted = credentials::format(params);
        let id = self.backend.add_network().await?;

        for (key, value) in &formatted.fields {
            if let Err(e) = self.backend.set_network_field(&id, key, value).await {
                warn!("Setting {} on network {} failed, entry left behind", key, id);
                return Err(e.into());
            }
        }
        Ok(id)
    }

    /// Remove the saved network with exactly this SSID
    ///
    /// An absent SSID is reported as `NotFound`; more than one match removes
    /// nothing and fails with `AmbiguousNetwork`.
    pub async fn forget(&self, ssid: &str) -> ServiceResult<ForgetOutcome> {
        let saved = self.backend.list_saved_networks().await?;

        match resolver::matching(ssid, &saved).as_slice() {
            [] => {
                debug!("Forget: {} is not saved", ssid);
                Ok(ForgetOutcome::NotFound)
            }
            [network] => {
                let id = network.network_id.clone();
                self.backend.remove_network(&id).await?;
                self.backend.save_config().await?;
                info!("Forgot network {} ({})", ssid, id);
                Ok(ForgetOutcome::Removed(id))
            }
            matches => Err(ServiceError::AmbiguousNetwork {
                ssid: ssid.to_string(),
                count: matches.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendCall, MockWifiBackend};
    use crate::core::types::SavedNetwork;
    use pretty_assertions::assert_eq;

    fn saved(id: &str, ssid: &str) -> SavedNetwork {
        SavedNetwork {
            network_id: id.into(),
            ssid: ssid.into(),
            bssid: "any".into(),
            flags: vec![],
        }
    }

    fn join(json: &str) -> JoinParams {
        JoinParams::parse(json.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_connect_known_network_uses_saved_id() {
        let backend = Arc::new(MockWifiBackend::new());
        backend
            .set_saved_networks(vec![saved("0", "office"), saved("3", "home")])
            .await;
        let connector = NetworkConnector::new(backend.clone());

        let path = connector
            .connect(&join(r#"{"ssid":"home","psk":"ignored-secret"}"#))
            .await
            .unwrap();

        assert_eq!(path, ConnectPath::Saved("3".into()));
        assert_eq!(
            backend.calls().await,
            vec![
                BackendCall::ListSavedNetworks,
                BackendCall::EnableNetwork("3".into()),
                BackendCall::SaveConfig,
                BackendCall::SelectNetwork("3".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_connect_new_network() {
        let backend = Arc::new(MockWifiBackend::new());
        let connector = NetworkConnector::new(backend.clone());

        let path = connector
            .connect(&join(r#"{"ssid":"CafeWiFi","psk":"opensesame"}"#))
            .await
            .unwrap();

        assert_eq!(path, ConnectPath::Created("0".into()));
        let calls = backend.calls().await;
        assert_eq!(calls[1], BackendCall::AddNetwork);
        assert_eq!(
            calls[2],
            BackendCall::SetNetworkField {
                id: "0".into(),
                key: "ssid".into(),
                value: "\"CafeWiFi\"".into(),
            }
        );
        assert_eq!(
            calls[3],
            BackendCall::SetNetworkField {
                id: "0".into(),
                key: "psk".into(),
                value: credentials::derive_psk("opensesame", "CafeWiFi"),
            }
        );
        assert_eq!(
            &calls[4..],
            &[
                BackendCall::EnableNetwork("0".into()),
                BackendCall::SaveConfig,
                BackendCall::SelectNetwork("0".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_connect_aborts_on_field_failure() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.fail_field("ssid").await;
        let connector = NetworkConnector::new(backend.clone());

        let result = connector
            .connect(&join(r#"{"ssid":"CafeWiFi","psk":"opensesame"}"#))
            .await;

        assert!(matches!(result, Err(ServiceError::Backend(_))));
        let calls = backend.calls().await;
        assert_eq!(calls.len(), 3);
        assert!(!calls.contains(&BackendCall::SaveConfig));
        // The allocated entry is not rolled back
        assert_eq!(backend.saved_networks().await.len(), 1);
    }

    #[tokio::test]
    async fn test_connect_list_failure() {
        let backend = Arc::new(MockWifiBackend::new());
        backend.set_list_failure(true).await;
        let connector = NetworkConnector::new(backend.clone());

        let result = connector.connect(&join(r#"{"ssid":"home"}"#)).await;
        assert!(result.is_err());
        assert_eq!(backend.calls().await, vec![BackendCall::ListSavedNetworks]);
    }

    #[tokio::test]
    async fn test_forget_single_match() {
        let backend = Arc::new(MockWifiBackend::new());
        backend
            .set_saved_networks(vec![saved("0", "office"), saved("1", "home")])
            .await;
        let connector = NetworkConnector::new(backend.clone());

        let outcome = connector.forget("home").await.unwrap();

        assert_eq!(outcome, ForgetOutcome::Removed("1".into()));
        assert_eq!(backend.saved_networks().await, vec![saved("0", "office")]);
        assert!(backend.calls().await.contains(&BackendCall::SaveConfig));
    }

    #[tokio::test]
    async fn test_forget_not_found() {
        let backend = Arc::new(MockWifiBackend::new());
        let connector = NetworkConnector::new(backend.clone());

        assert_eq!(
            connector.forget("home").await.unwrap(),
            ForgetOutcome::NotFound
        );
        assert_eq!(backend.calls().await, vec![BackendCall::ListSavedNetworks]);
    }

    #[tokio::test]
    async fn test_forget_ambiguous_removes_nothing() {
        let backend = Arc::new(MockWifiBackend::new());
        backend
            .set_saved_networks(vec![saved("0", "home"), saved("1", "home")])
            .await;
        let connector = NetworkConnector::new(backend.clone());

        let result = connector.forget("home").await;

        assert!(matches!(
            result,
            Err(ServiceError::AmbiguousNetwork { count: 2, .. })
        ));
        assert_eq!(backend.saved_networks().await.len(), 2);
    }
}
