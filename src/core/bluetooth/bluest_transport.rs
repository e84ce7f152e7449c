//! Production [`BleTransport`] backed by the system Bluetooth adapter via
//! `bluest`. Keeps the raw `Device` and `Service` handles on this side of the
//! seam; the session core only ever sees identifiers and wire-encoded
//! payloads.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bluest::{Adapter, Device, Service};
use futures_util::StreamExt;
use log::{debug, error, info};
use regex::Regex;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::core::bluetooth::decode::encode_payload;
use crate::core::bluetooth::error::TransportError;
use crate::core::bluetooth::transport::{BleTransport, CharacteristicInfo};
use crate::core::bluetooth::types::{Advertisement, ScanEvent};

pub struct BluestTransport {
    adapter: Adapter,
    /// Raw device handles keyed by platform id, populated during scanning
    devices: Arc<Mutex<HashMap<String, Device>>>,
    /// Discovered service handles per connected device
    service_cache: Arc<Mutex<HashMap<String, Vec<Service>>>>,
    /// Token of the currently running advertisement forwarder, if any
    scan_token: Mutex<Option<CancellationToken>>,
}

impl BluestTransport {
    /// Binds to the default system adapter, waiting until it is powered on.
    pub async fn with_default_adapter() -> Result<Self> {
        let adapter = Adapter::default()
            .await
            .ok_or_else(|| anyhow!("No Bluetooth adapter found"))?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");
        Ok(Self {
            adapter,
            devices: Arc::new(Mutex::new(HashMap::new())),
            service_cache: Arc::new(Mutex::new(HashMap::new())),
            scan_token: Mutex::new(None),
        })
    }

    fn device(&self, device_id: &str) -> Result<Device, TransportError> {
        self.devices
            .lock()
            .unwrap()
            .get(device_id)
            .cloned()
            .ok_or_else(|| TransportError::DeviceNotFound(device_id.to_string()))
    }

    fn cached_services(&self, device_id: &str) -> Result<Vec<Service>, TransportError> {
        self.service_cache
            .lock()
            .unwrap()
            .get(device_id)
            .cloned()
            .ok_or_else(|| TransportError::DiscoveryFailed {
                id: device_id.to_string(),
                reason: "services not discovered yet".into(),
            })
    }

    async fn service(&self, device_id: &str, uuid: &str) -> Result<Service, TransportError> {
        self.cached_services(device_id)?
            .into_iter()
            .find(|s| s.uuid().to_string() == uuid)
            .ok_or_else(|| TransportError::DiscoveryFailed {
                id: device_id.to_string(),
                reason: format!("service {uuid} not found"),
            })
    }

    fn extract_mac_address(device_id_str: &str) -> Option<String> {
        let re = Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").unwrap();
        re.find_iter(device_id_str)
            .last()
            .map(|m| m.as_str().to_uppercase())
    }
}

#[async_trait]
impl BleTransport for BluestTransport {
    async fn start_scan(&self, events: UnboundedSender<ScanEvent>) -> Result<(), TransportError> {
        let token = CancellationToken::new();
        {
            let mut guard = self.scan_token.lock().unwrap();
            if let Some(previous) = guard.take() {
                previous.cancel();
            }
            *guard = Some(token.clone());
        }

        let adapter = self.adapter.clone();
        let devices = self.devices.clone();

        tokio::spawn(async move {
            info!("Starting bluetooth scan");
            let mut scan_stream = match adapter.scan(&[]).await {
                Ok(stream) => stream,
                Err(e) => {
                    let _ = events.send(ScanEvent::Error(TransportError::Scan(e.to_string())));
                    return;
                }
            };

            loop {
                tokio::select! {
                    result = scan_stream.next() => {
                        match result {
                            Some(discovered) => {
                                let device = discovered.device;
                                let rssi = discovered.rssi;
                                let id = device.id().to_string();
                                let name = device.name().ok();
                                debug!(
                                    "Found device - ID: {}, Address: {:?}, Name: {:?}, RSSI: {:?}",
                                    id,
                                    BluestTransport::extract_mac_address(&id),
                                    name,
                                    rssi
                                );
                                devices.lock().unwrap().insert(id.clone(), device);
                                if events
                                    .send(ScanEvent::Discovered(Advertisement { id, name, rssi }))
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            None => {
                                info!("Bluetooth scan stream has ended.");
                                break;
                            }
                        }
                    }
                    _ = token.cancelled() => {
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    async fn stop_scan(&self) -> Result<(), TransportError> {
        if let Some(token) = self.scan_token.lock().unwrap().take() {
            token.cancel();
        }
        Ok(())
    }

    async fn connect(&self, device_id: &str) -> Result<(), TransportError> {
        let device = self.device(device_id)?;
        if !device.is_connected().await {
            info!("Initiating connection to {device_id}...");
            self.adapter
                .connect_device(&device)
                .await
                .map_err(|e| TransportError::ConnectFailed {
                    id: device_id.to_string(),
                    reason: e.to_string(),
                })?;
        }
        Ok(())
    }

    async fn discover_all(&self, device_id: &str) -> Result<(), TransportError> {
        let device = self.device(device_id)?;
        let services =
            device
                .services()
                .await
                .map_err(|e| TransportError::DiscoveryFailed {
                    id: device_id.to_string(),
                    reason: e.to_string(),
                })?;
        self.service_cache
            .lock()
            .unwrap()
            .insert(device_id.to_string(), services);
        Ok(())
    }

    async fn services(&self, device_id: &str) -> Result<Vec<String>, TransportError> {
        Ok(self
            .cached_services(device_id)?
            .iter()
            .map(|s| s.uuid().to_string())
            .collect())
    }

    async fn characteristics(
        &self,
        device_id: &str,
        service: &str,
    ) -> Result<Vec<CharacteristicInfo>, TransportError> {
        let service = self.service(device_id, service).await?;
        let characteristics =
            service
                .characteristics()
                .await
                .map_err(|e| TransportError::DiscoveryFailed {
                    id: device_id.to_string(),
                    reason: e.to_string(),
                })?;

        let mut infos = Vec::with_capacity(characteristics.len());
        for characteristic in characteristics {
            let uuid = characteristic.uuid().to_string();
            let is_readable = match characteristic.properties().await {
                Ok(properties) => properties.read,
                Err(e) => {
                    error!("Failed to read properties of {uuid}: {e}");
                    false
                }
            };
            infos.push(CharacteristicInfo { uuid, is_readable });
        }
        Ok(infos)
    }

    async fn read_characteristic(
        &self,
        device_id: &str,
        service: &str,
        characteristic: &str,
    ) -> Result<Option<String>, TransportError> {
        let service = self.service(device_id, service).await?;
        let characteristics =
            service
                .characteristics()
                .await
                .map_err(|e| TransportError::ReadFailed {
                    characteristic: characteristic.to_string(),
                    reason: e.to_string(),
                })?;
        let target = characteristics
            .into_iter()
            .find(|c| c.uuid().to_string() == characteristic)
            .ok_or_else(|| TransportError::ReadFailed {
                characteristic: characteristic.to_string(),
                reason: "characteristic not found".into(),
            })?;

        let payload = target
            .read()
            .await
            .map_err(|e| TransportError::ReadFailed {
                characteristic: characteristic.to_string(),
                reason: e.to_string(),
            })?;

        if payload.is_empty() {
            return Ok(None);
        }
        Ok(Some(encode_payload(&payload)))
    }

    async fn cancel_connection(&self, device_id: &str) -> Result<(), TransportError> {
        let device = self.device(device_id)?;
        self.service_cache.lock().unwrap().remove(device_id);
        if device.is_connected().await {
            info!("Disconnecting from device {device_id}");
            self.adapter
                .disconnect_device(&device)
                .await
                .map_err(|e| TransportError::ConnectFailed {
                    id: device_id.to_string(),
                    reason: e.to_string(),
                })?;
            info!("Successfully disconnected");
        } else {
            info!("Device {device_id} not connected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_last_mac_like_token_uppercased() {
        assert_eq!(
            BluestTransport::extract_mac_address("dev-aa:bb:cc:dd:ee:ff"),
            Some("AA:BB:CC:DD:EE:FF".to_string())
        );
        assert_eq!(BluestTransport::extract_mac_address("no-mac-here"), None);
    }
}
