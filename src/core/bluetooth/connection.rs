//! Connection session state machine and characteristic reads.
//!
//! At most one session exists at a time. The lifecycle is
//! `Idle -> Connecting -> Connected -> Enumerating -> Ready`, with `Idle`
//! reachable from anywhere via disconnect and from `Connecting` on failure.
//! Every transport call is awaited sequentially; there is no fan-out across
//! services or characteristics.

use std::sync::Arc;

use log::{error, info, warn};

use crate::core::bluetooth::decode::decode_payload;
use crate::core::bluetooth::error::TransportError;
use crate::core::bluetooth::transport::BleTransport;
use crate::core::bluetooth::types::{
    DiscoveredDevice, ReadOutcome, ReadableCharacteristic, SessionState,
};

pub struct ConnectionSession {
    transport: Arc<dyn BleTransport>,
    state: SessionState,
    connected_device: Option<DiscoveredDevice>,
    readable_characteristics: Vec<ReadableCharacteristic>,
}

impl ConnectionSession {
    pub fn new(transport: Arc<dyn BleTransport>) -> Self {
        Self {
            transport,
            state: SessionState::Idle,
            connected_device: None,
            readable_characteristics: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn connected_device(&self) -> Option<&DiscoveredDevice> {
        self.connected_device.as_ref()
    }

    pub fn readable_characteristics(&self) -> &[ReadableCharacteristic] {
        &self.readable_characteristics
    }

    /// Connects to the given device and enumerates its readable
    /// characteristics. Returns `true` once the session reached `Ready`.
    ///
    /// Any transport failure along the way is logged, the session reverts to
    /// `Idle`, and no error is surfaced; the caller re-initiates explicitly
    /// if desired.
    pub async fn connect(&mut self, device: &DiscoveredDevice) -> bool {
        if self.connected_device.is_some() {
            warn!("Connect requested while a session is active; ignoring.");
            return false;
        }

        // Stale catalog entries from a previous session are dropped here, on
        // the Connecting transition, not on disconnect.
        self.readable_characteristics.clear();
        self.state = SessionState::Connecting;
        info!("Connecting to device {} ({})...", device.name, device.id);

        if let Err(e) = self.transport.connect(&device.id).await {
            error!("Failed to connect to device: {e}");
            self.reset();
            return false;
        }
        self.state = SessionState::Connected;
        self.connected_device = Some(device.clone());

        info!("Connection successful, discovering services...");
        if let Err(e) = self.transport.discover_all(&device.id).await {
            error!("Service discovery failed: {e}");
            self.abort(&device.id).await;
            return false;
        }

        self.state = SessionState::Enumerating;
        if let Err(e) = self.enumerate(&device.id).await {
            error!("Characteristic enumeration failed: {e}");
            self.abort(&device.id).await;
            return false;
        }

        self.state = SessionState::Ready;
        info!(
            "Session ready: {} readable characteristic(s) catalogued.",
            self.readable_characteristics.len()
        );
        true
    }

    /// Walks services, then characteristics within each service, in
    /// transport-reported order, one awaited step at a time. Readable
    /// characteristics are appended unconditionally; entries are not
    /// deduplicated.
    async fn enumerate(&mut self, device_id: &str) -> Result<(), TransportError> {
        let services = self.transport.services(device_id).await?;
        info!("Discovered {} service(s).", services.len());

        for service in services {
            let characteristics = self.transport.characteristics(device_id, &service).await?;
            for characteristic in characteristics {
                if characteristic.is_readable {
                    info!(
                        "Readable characteristic {} on service {}",
                        characteristic.uuid, service
                    );
                    self.readable_characteristics.push(ReadableCharacteristic {
                        service: service.clone(),
                        characteristic: characteristic.uuid,
                    });
                }
            }
        }
        Ok(())
    }

    /// Reads one characteristic on the active connection and decodes the
    /// payload. Never returns an error: transport failures come back as
    /// [`ReadOutcome::Failed`], an empty payload as
    /// [`ReadOutcome::ValueAbsent`].
    pub async fn read_characteristic(&self, service: &str, characteristic: &str) -> ReadOutcome {
        let Some(device) = self.connected_device.as_ref() else {
            error!("Read of {characteristic} attempted with no active connection");
            return ReadOutcome::Failed;
        };

        match self
            .transport
            .read_characteristic(&device.id, service, characteristic)
            .await
        {
            Ok(Some(wire)) => match decode_payload(&wire) {
                Ok(text) => {
                    info!("Read value from {characteristic}: {text}");
                    ReadOutcome::Value(text)
                }
                Err(e) => {
                    error!("Failed to decode payload of {characteristic}: {e}");
                    ReadOutcome::Failed
                }
            },
            Ok(None) => {
                error!("Characteristic {characteristic} returned no payload");
                ReadOutcome::ValueAbsent
            }
            Err(e) => {
                error!("Error reading characteristic {characteristic}: {e}");
                ReadOutcome::Failed
            }
        }
    }

    /// Cancels the active connection, if any, and returns to `Idle`.
    /// A disconnect with no active session is a no-op.
    pub async fn disconnect(&mut self) {
        let Some(device) = self.connected_device.take() else {
            info!("Disconnect requested with no active connection; nothing to do.");
            return;
        };

        info!("Disconnecting from device {}", device.id);
        if let Err(e) = self.transport.cancel_connection(&device.id).await {
            error!("Failed to cancel connection: {e}");
        }
        self.state = SessionState::Idle;
    }

    /// Tears down a half-established connection. Discovery and enumeration
    /// fail with the physical link still up; it has to be cancelled before
    /// the session forgets the device, or nothing can ever close it.
    async fn abort(&mut self, device_id: &str) {
        if let Err(e) = self.transport.cancel_connection(device_id).await {
            error!("Failed to cancel connection during teardown: {e}");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.connected_device = None;
        self.readable_characteristics.clear();
        self.state = SessionState::Idle;
    }
}
