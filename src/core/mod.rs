//! Core business logic module

pub mod characteristics;
pub mod chunked;
pub mod connector;
pub mod credentials;
pub mod error;
pub mod known_networks;
pub mod poller;
pub mod resolver;
pub mod scan_cache;
pub mod service;
pub mod types;
