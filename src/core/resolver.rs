//! Saved-network resolution for connect and forget requests

use crate::core::types::SavedNetwork;

/// How a connect request for an SSID must be carried out
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The SSID is saved under this id; only selection is needed
    Known(String),
    /// The SSID is unknown; the full parameters must be submitted
    New,
}

/// Resolve a connect request, first match in list order wins
pub fn resolve(ssid: &str, saved: &[SavedNetwork]) -> Resolution {
    saved
        .iter()
        .find(|network| network.ssid == ssid)
        .map(|network| Resolution::Known(network.network_id.clone()))
        .unwrap_or(Resolution::New)
}

/// All saved entries with exactly this SSID
pub fn matching<'a>(ssid: &str, saved: &'a [SavedNetwork]) -> Vec<&'a SavedNetwork> {
    saved.iter().filter(|network| network.ssid == ssid).collect()
}
