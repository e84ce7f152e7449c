//! Bluetooth manager for the watch session core.
//! This module provides the main interface consumed by the UI layer:
//! permissions, scanning, connect/disconnect, reads and the read-only
//! observable state.
//!
//! Per the error contract, nothing here returns transport errors to the
//! caller: failures are logged, and callers observe `false` results, absent
//! state or [`ReadOutcome::Failed`].

use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::error;

use crate::core::bluetooth::bluest_transport::BluestTransport;
use crate::core::bluetooth::connection::ConnectionSession;
use crate::core::bluetooth::constants::WATCH_NAME;
use crate::core::bluetooth::permissions::PermissionGate;
use crate::core::bluetooth::scanner::BluetoothScanner;
use crate::core::bluetooth::transport::BleTransport;
use crate::core::bluetooth::types::{
    DiscoveredDevice, ReadOutcome, ReadableCharacteristic, SessionState,
};

/// Manages the discovery-connect-enumerate-read lifecycle
pub struct BluetoothManager {
    /// Discovered devices, insertion order, shared with the scan task
    devices: Arc<Mutex<Vec<DiscoveredDevice>>>,
    /// Bluetooth scanner
    scanner: BluetoothScanner,
    /// The single connection session
    session: ConnectionSession,
    /// Permission gate consulted before scanning
    permission_gate: PermissionGate,
}

impl BluetoothManager {
    /// Creates a manager on top of an arbitrary transport, filtering scan
    /// results for the watch name.
    pub fn new(transport: Arc<dyn BleTransport>, permission_gate: PermissionGate) -> Self {
        Self::with_name_filter(transport, permission_gate, WATCH_NAME)
    }

    /// Same as [`BluetoothManager::new`] with a custom name filter.
    pub fn with_name_filter(
        transport: Arc<dyn BleTransport>,
        permission_gate: PermissionGate,
        name_filter: &str,
    ) -> Self {
        let devices = Arc::new(Mutex::new(Vec::new()));
        let scanner = BluetoothScanner::new(
            transport.clone(),
            devices.clone(),
            name_filter.to_string(),
        );
        let session = ConnectionSession::new(transport);
        Self {
            devices,
            scanner,
            session,
            permission_gate,
        }
    }

    /// Creates a manager backed by the system Bluetooth adapter.
    pub async fn with_default_adapter() -> Result<Self> {
        let transport = BluestTransport::with_default_adapter().await?;
        Ok(Self::new(
            Arc::new(transport),
            PermissionGate::platform_default(),
        ))
    }

    /// Returns whether the process holds all capabilities needed to scan and
    /// connect, requesting them if missing. A single denial yields `false`.
    pub async fn request_permissions(&self) -> bool {
        self.permission_gate.request_permissions().await
    }

    /// Starts peripheral discovery. Non-blocking; results accumulate in
    /// [`BluetoothManager::discovered_devices`]. Scan-level errors are logged
    /// and not surfaced.
    pub async fn scan_for_peripherals(&mut self) {
        if let Err(e) = self.scanner.start_scan().await {
            error!("Failed to start scan: {e}");
        }
    }

    /// Explicitly stops an active scan.
    pub async fn stop_scan(&mut self) {
        if let Err(e) = self.scanner.stop_scan().await {
            error!("Failed to stop scan: {e}");
        }
    }

    /// Connects to a discovered device and enumerates its readable
    /// characteristics. On success the scan is stopped; on failure the
    /// session reverts to idle and the scan keeps running.
    pub async fn connect_to_device(&mut self, device: &DiscoveredDevice) {
        if self.session.connect(device).await {
            self.stop_scan().await;
        }
    }

    /// Disconnects from the currently connected device; a no-op when idle.
    pub async fn disconnect_from_device(&mut self) {
        self.session.disconnect().await;
    }

    /// Reads one catalogued characteristic on the active connection.
    pub async fn read_characteristic(&self, service: &str, characteristic: &str) -> ReadOutcome {
        self.session.read_characteristic(service, characteristic).await
    }

    /// Snapshot of the discovered device set, in discovery order
    pub fn discovered_devices(&self) -> Vec<DiscoveredDevice> {
        self.devices.lock().unwrap().clone()
    }

    /// The currently connected device, if any
    pub fn connected_device(&self) -> Option<DiscoveredDevice> {
        self.session.connected_device().cloned()
    }

    /// Snapshot of the readable-characteristic catalog, in discovery order
    pub fn readable_characteristics(&self) -> Vec<ReadableCharacteristic> {
        self.session.readable_characteristics().to_vec()
    }

    /// Current session state
    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::core::bluetooth::decode::encode_payload;
    use crate::core::bluetooth::transport::mock::MockTransport;
    use crate::core::bluetooth::transport::CharacteristicInfo;
    use crate::core::bluetooth::types::{Advertisement, ScanEvent};

    fn full_mock() -> MockTransport {
        let mut transport = MockTransport::with_scan_script(vec![ScanEvent::Discovered(
            Advertisement {
                id: "watch-1".into(),
                name: Some("CASIO GM-B2100".into()),
                rssi: Some(-48),
            },
        )]);
        transport.tree = vec![(
            "svc-battery".to_string(),
            vec![CharacteristicInfo {
                uuid: "ch-level".to_string(),
                is_readable: true,
            }],
        )];
        let wire = encode_payload(b"87%");
        transport.add_read("svc-battery", "ch-level", Some(&wire));
        transport
    }

    #[tokio::test]
    async fn full_lifecycle_scan_connect_enumerate_read() {
        let transport = Arc::new(full_mock());
        let mut manager =
            BluetoothManager::new(transport.clone(), PermissionGate::platform_default());

        assert!(manager.request_permissions().await);
        assert_eq!(manager.session_state(), SessionState::Idle);

        manager.scan_for_peripherals().await;
        manager.stop_scan().await;
        let devices = manager.discovered_devices();
        assert_eq!(devices.len(), 1);

        manager.connect_to_device(&devices[0]).await;
        assert_eq!(manager.session_state(), SessionState::Ready);
        assert_eq!(manager.connected_device().unwrap().id, "watch-1");

        let catalog = manager.readable_characteristics();
        assert_eq!(catalog.len(), 1);

        let outcome = manager
            .read_characteristic(&catalog[0].service, &catalog[0].characteristic)
            .await;
        assert_eq!(outcome, ReadOutcome::Value("87%".to_string()));

        manager.disconnect_from_device().await;
        assert!(manager.connected_device().is_none());
        assert_eq!(manager.session_state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn successful_connect_stops_the_scan() {
        let transport = Arc::new(full_mock());
        let mut manager =
            BluetoothManager::new(transport.clone(), PermissionGate::platform_default());

        manager.scan_for_peripherals().await;
        let device = DiscoveredDevice::new("watch-1".into(), "CASIO GM-B2100".into(), None);
        manager.connect_to_device(&device).await;

        assert!(transport.stop_scan_calls.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test]
    async fn failed_connect_leaves_the_scan_running() {
        let transport = Arc::new(MockTransport {
            fail_connect: true,
            ..MockTransport::default()
        });
        let mut manager =
            BluetoothManager::new(transport.clone(), PermissionGate::platform_default());

        manager.scan_for_peripherals().await;
        let device = DiscoveredDevice::new("watch-1".into(), "CASIO GM-B2100".into(), None);
        manager.connect_to_device(&device).await;

        assert_eq!(manager.session_state(), SessionState::Idle);
        assert_eq!(transport.stop_scan_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn read_with_no_session_yields_failed() {
        let manager = BluetoothManager::new(
            Arc::new(MockTransport::default()),
            PermissionGate::platform_default(),
        );
        assert_eq!(
            manager.read_characteristic("svc", "ch").await,
            ReadOutcome::Failed
        );
    }
}
