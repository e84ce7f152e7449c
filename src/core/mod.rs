//! Core functionality for the watch session
//! This module contains the core functionality for interfacing with the watch

pub mod bluetooth;

// Re-export commonly used types
pub use bluetooth::BluetoothManager;
