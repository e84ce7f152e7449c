//! Transport seam between the session core and the BLE stack.
//!
//! The session logic never touches `bluest` directly; everything goes through
//! [`BleTransport`], so tests can script the radio side and the production
//! build plugs in [`BluestTransport`].
//!
//! [`BluestTransport`]: crate::core::bluetooth::bluest_transport::BluestTransport

use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

use crate::core::bluetooth::error::TransportError;
use crate::core::bluetooth::types::ScanEvent;

/// A characteristic as reported by service discovery
#[derive(Debug, Clone)]
pub struct CharacteristicInfo {
    /// UUID of the characteristic
    pub uuid: String,
    /// Whether the transport flags the characteristic readable
    pub is_readable: bool,
}

/// Operations the session core requires from the BLE stack
#[async_trait]
pub trait BleTransport: Send + Sync {
    /// Starts an indefinite, unfiltered device scan. Sightings and per-result
    /// errors flow over `events`; the call itself returns once the scan is
    /// running.
    async fn start_scan(&self, events: UnboundedSender<ScanEvent>) -> Result<(), TransportError>;

    /// Stops an active scan
    async fn stop_scan(&self) -> Result<(), TransportError>;

    /// Connects to the device with the given identifier
    async fn connect(&self, device_id: &str) -> Result<(), TransportError>;

    /// Single atomic discovery of the full service/characteristic tree
    async fn discover_all(&self, device_id: &str) -> Result<(), TransportError>;

    /// Service UUIDs of a discovered device, in transport-reported order
    async fn services(&self, device_id: &str) -> Result<Vec<String>, TransportError>;

    /// Characteristics of one service, in transport-reported order
    async fn characteristics(
        &self,
        device_id: &str,
        service: &str,
    ) -> Result<Vec<CharacteristicInfo>, TransportError>;

    /// Reads a characteristic. `Ok(None)` means the read succeeded but the
    /// peripheral returned no payload; `Ok(Some(_))` carries the payload in
    /// its wire text form.
    async fn read_characteristic(
        &self,
        device_id: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<Option<String>, TransportError>;

    /// Cancels the connection to the given device
    async fn cancel_connection(&self, device_id: &str) -> Result<(), TransportError>;
}
