//! Constants used throughout the application
//! This module contains all the constant values used in the application,
//! such as the target device name, permission prompt text and UUIDs.

use uuid::Uuid;

/// Advertised name fragment of the target watch
pub const WATCH_NAME: &str = "CASIO GM-B2100";

/// Standard Bluetooth Service UUIDs
pub const UUID_GENERIC_ACCESS_SERVICE: Uuid = Uuid::from_u128(0x00001800_0000_1000_8000_00805f9b34fb);
pub const UUID_DEVICE_INFORMATION_SERVICE: Uuid = Uuid::from_u128(0x0000180a_0000_1000_8000_00805f9b34fb);
pub const UUID_BATTERY_SERVICE: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);

/// Standard Bluetooth Characteristic UUIDs
pub const UUID_DEVICE_NAME: Uuid = Uuid::from_u128(0x00002a00_0000_1000_8000_00805f9b34fb);
pub const UUID_MANUFACTURER_NAME: Uuid = Uuid::from_u128(0x00002a29_0000_1000_8000_00805f9b34fb);
pub const UUID_MODEL_NUMBER: Uuid = Uuid::from_u128(0x00002a24_0000_1000_8000_00805f9b34fb);
pub const UUID_BATTERY_LEVEL: Uuid = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);

/// Title shown on the OS permission prompt
pub const PERMISSION_PROMPT_TITLE: &str = "Location Permission";

/// Message shown on the OS permission prompt
pub const PERMISSION_PROMPT_MESSAGE: &str = "Bluetooth Low Energy requires Location";

/// Affirmative button label on the OS permission prompt
pub const PERMISSION_PROMPT_AFFIRM: &str = "OK";
