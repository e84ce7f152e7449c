//! gshock-link library
//! BLE central session core for the Casio GM-B2100 watch: scan for the watch,
//! connect, enumerate the readable GATT characteristics and read their values
//! as text. The radio stack and the OS permission flow sit behind traits so a
//! front-end (or a test) can swap them out.

// Module declarations
pub mod core;
pub mod logging;

pub use crate::core::bluetooth::{
    BluetoothManager, DiscoveredDevice, ReadOutcome, ReadableCharacteristic, SessionState,
};
