//! WiFi backend abstraction layer

pub mod mock_backend;
pub mod wifi_backend;
pub mod wifi_ctrl_backend;

pub use mock_backend::{BackendCall, MockWifiBackend};
pub use wifi_backend::WifiBackend;
pub use wifi_ctrl_backend::WifiCtrlBackend;
