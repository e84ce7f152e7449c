//! Peripheral discovery for the watch session.
//!
//! Drives an indefinite, unfiltered transport scan and folds the result
//! stream into an ordered, deduplicated set of discovered devices. The scan
//! never times out on its own; it stops when [`BluetoothScanner::stop_scan`]
//! is called, which the manager does once a connection succeeds.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::{debug, error, info};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::transport::BleTransport;
use crate::core::bluetooth::types::{DiscoveredDevice, ScanEvent};

pub struct BluetoothScanner {
    transport: Arc<dyn BleTransport>,
    devices: Arc<Mutex<Vec<DiscoveredDevice>>>,
    name_filter: String,
    cancel_token: CancellationToken,
    scan_task_handle: Option<JoinHandle<()>>,
}

impl BluetoothScanner {
    pub fn new(
        transport: Arc<dyn BleTransport>,
        devices: Arc<Mutex<Vec<DiscoveredDevice>>>,
        name_filter: String,
    ) -> Self {
        Self {
            transport,
            devices,
            name_filter,
            cancel_token: CancellationToken::new(),
            scan_task_handle: None,
        }
    }

    /// Starts a new scan session. The discovered set is reset, a previous
    /// scan task is stopped first, and the call returns once the consumer
    /// task is running.
    pub async fn start_scan(&mut self) -> Result<()> {
        if self.scan_task_handle.is_some() {
            self.stop_scan().await?;
        }
        self.devices.lock().unwrap().clear();

        self.cancel_token = CancellationToken::new();
        let cancel_token_for_task = self.cancel_token.clone();
        let devices_for_task = self.devices.clone();
        let name_filter = self.name_filter.clone();

        let (tx, rx) = mpsc::unbounded_channel();
        self.transport.start_scan(tx).await?;

        let handle = tokio::spawn(async move {
            Self::consume_scan_events(rx, devices_for_task, name_filter, cancel_token_for_task)
                .await;
        });
        self.scan_task_handle = Some(handle);

        info!("Device scan task started.");
        Ok(())
    }

    /// Folds scan events into the discovered set: admit on name match, dedup
    /// by identifier, first sighting wins. Per-result errors are logged and
    /// the scan keeps running.
    async fn consume_scan_events(
        mut events: mpsc::UnboundedReceiver<ScanEvent>,
        devices: Arc<Mutex<Vec<DiscoveredDevice>>>,
        name_filter: String,
        cancel_token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                // Already-delivered sightings are folded in before a stop
                // request is honored.
                biased;
                event = events.recv() => {
                    match event {
                        Some(ScanEvent::Discovered(adv)) => {
                            debug!("Found device - ID: {}, Name: {:?}, RSSI: {:?}", adv.id, adv.name, adv.rssi);
                            let Some(name) = adv.name else { continue };
                            let candidate = DiscoveredDevice::new(adv.id, name, adv.rssi);
                            if !candidate.matches_name(&name_filter) {
                                continue;
                            }
                            let mut devices = devices.lock().unwrap();
                            if devices.iter().any(|known| known.id == candidate.id) {
                                continue;
                            }
                            info!(
                                "Admitting device: ID: {}, Name: {}, RSSI: {:?}",
                                candidate.id, candidate.name, candidate.rssi
                            );
                            devices.push(candidate);
                        }
                        Some(ScanEvent::Error(e)) => {
                            error!("Scan result error (scan continues): {e}");
                        }
                        None => {
                            info!("Scan event stream has ended.");
                            break;
                        }
                    }
                }
                _ = cancel_token.cancelled() => {
                    break;
                }
            }
        }
    }

    /// Stops the scan and waits for the consumer task to finish.
    pub async fn stop_scan(&mut self) -> Result<()> {
        info!("Stopping Bluetooth scan.");
        self.cancel_token.cancel();

        if let Err(e) = self.transport.stop_scan().await {
            error!("Transport failed to stop scan: {e}");
        }

        if let Some(handle) = self.scan_task_handle.take() {
            match handle.await {
                Ok(()) => info!("Scan task finished after cancellation."),
                Err(e) => {
                    if e.is_cancelled() {
                        info!("Scan task was cancelled successfully.");
                    } else {
                        error!("Scan task finished with an unexpected join error: {e:?}");
                    }
                }
            }
        } else {
            info!("No active scan task handle found to wait for.");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::error::TransportError;
    use crate::core::bluetooth::transport::mock::MockTransport;
    use crate::core::bluetooth::types::Advertisement;

    fn sighting(id: &str, name: Option<&str>, rssi: Option<i16>) -> ScanEvent {
        ScanEvent::Discovered(Advertisement {
            id: id.to_string(),
            name: name.map(str::to_string),
            rssi,
        })
    }

    async fn run_scan(events: Vec<ScanEvent>) -> Vec<DiscoveredDevice> {
        let transport = Arc::new(MockTransport::with_scan_script(events));
        let devices = Arc::new(Mutex::new(Vec::new()));
        let mut scanner =
            BluetoothScanner::new(transport, devices.clone(), "CASIO GM-B2100".to_string());

        scanner.start_scan().await.unwrap();
        scanner.stop_scan().await.unwrap();

        let devices = devices.lock().unwrap();
        devices.clone()
    }

    #[tokio::test]
    async fn filters_and_dedups_in_insertion_order() {
        let found = run_scan(vec![
            sighting("aa", Some("CASIO GM-B2100 watch"), Some(-40)),
            sighting("bb", Some("my CASIO GM-B2100"), Some(-60)),
            sighting("aa", Some("CASIO GM-B2100 watch"), Some(-20)),
            sighting("cc", Some("some headphones"), Some(-30)),
        ])
        .await;

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, "aa");
        assert_eq!(found[1].id, "bb");
        // First sighting wins; metadata is not refreshed on re-sighting.
        assert_eq!(found[0].rssi, Some(-40));
    }

    #[tokio::test]
    async fn nameless_advertisements_are_skipped() {
        let found = run_scan(vec![
            sighting("aa", None, None),
            sighting("bb", Some("CASIO GM-B2100"), None),
        ])
        .await;

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "bb");
    }

    #[tokio::test]
    async fn per_result_errors_do_not_stop_the_scan() {
        let found = run_scan(vec![
            sighting("aa", Some("CASIO GM-B2100"), None),
            ScanEvent::Error(TransportError::Scan("transient radio error".into())),
            sighting("bb", Some("CASIO GM-B2100 #2"), None),
        ])
        .await;

        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn restarting_a_scan_resets_the_discovered_set() {
        let transport = Arc::new(MockTransport::with_scan_script(vec![sighting(
            "aa",
            Some("CASIO GM-B2100"),
            None,
        )]));
        let devices = Arc::new(Mutex::new(Vec::new()));
        let mut scanner =
            BluetoothScanner::new(transport, devices.clone(), "CASIO GM-B2100".to_string());

        scanner.start_scan().await.unwrap();
        scanner.stop_scan().await.unwrap();
        assert_eq!(devices.lock().unwrap().len(), 1);

        // Second session: the script is exhausted, so the set stays empty.
        scanner.start_scan().await.unwrap();
        scanner.stop_scan().await.unwrap();
        assert!(devices.lock().unwrap().is_empty());
    }
}
