//! Bluetooth functionality for the watch session core.
//! This module handles all bluetooth operations: permissions, scanning,
//! connecting, enumerating readable characteristics and reading values.

mod bluest_transport;
mod connection;
mod constants;
mod decode;
mod error;
mod manager;
mod permissions;
mod scanner;
mod transport;
mod types;

// Re-export types that should be publicly accessible
pub use bluest_transport::BluestTransport;
pub use connection::ConnectionSession;
pub use constants::*; // Re-export all constants
pub use decode::{decode_payload, encode_payload};
pub use error::TransportError;
pub use manager::BluetoothManager;
pub use permissions::{
    AlwaysGranted, Capability, PermissionGate, PermissionModel, PermissionRequester, PromptConfig,
};
pub use scanner::BluetoothScanner;
pub use transport::{BleTransport, CharacteristicInfo};
pub use types::{
    Advertisement, DiscoveredDevice, ReadOutcome, ReadableCharacteristic, ScanEvent, SessionState,
};
