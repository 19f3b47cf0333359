//! Error types for the provisioning service

use thiserror::Error;

/// Result type for WiFi backend operations
pub type WifiResult<T> = Result<T, WifiError>;

/// Result type for connect/forget flows
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for characteristic handlers
pub type AttResult<T> = Result<T, AttError>;

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// Errors reported by the wireless control interface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WifiError {
    #[error("WiFi scan failed: {0}")]
    ScanFailed(String),

    #[error("Command `{command}` rejected: {reply}")]
    CommandRejected { command: String, reply: String },

    #[error("Backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Network interface error: {0}")]
    InterfaceError(String),

    #[error("wpa_supplicant error: {0}")]
    WpaSupplicantError(String),
}

/// Errors raised by the connect and forget flows
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Invalid join parameters: {0}")]
    InvalidJoinParams(String),

    #[error("SSID {ssid:?} matches {count} saved networks")]
    AmbiguousNetwork { ssid: String, count: usize },

    #[error("Backend error: {0}")]
    Backend(#[from] WifiError),
}

/// Status codes a characteristic handler answers a BLE request with
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttError {
    #[error("Invalid offset")]
    InvalidOffset,

    #[error("Invalid attribute value length")]
    InvalidAttributeLength,

    #[error("Invalid argument")]
    InvalidArgument,

    #[error("Unlikely error")]
    UnlikelyError,

    #[error("Request not supported")]
    NotSupported,
}

impl From<ServiceError> for AttError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidJoinParams(_) => AttError::InvalidArgument,
            ServiceError::AmbiguousNetwork { .. } | ServiceError::Backend(_) => {
                AttError::UnlikelyError
            }
        }
    }
}

/// Errors related to the BLE transport
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("BLE error: {0}")]
    Ble(#[from] bluer::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_maps_to_att_status() {
        assert_eq!(
            AttError::from(ServiceError::InvalidJoinParams("bad".into())),
            AttError::InvalidArgument
        );
        assert_eq!(
            AttError::from(ServiceError::Backend(WifiError::ScanFailed("x".into()))),
            AttError::UnlikelyError
        );
        assert_eq!(
            AttError::from(ServiceError::AmbiguousNetwork {
                ssid: "home".into(),
                count: 2
            }),
            AttError::UnlikelyError
        );
    }
}
