//! Permission gate consulted before scanning starts.
//!
//! The OS dialog flow itself is a collaborator behind [`PermissionRequester`];
//! this module only decides which capabilities to ask for and how to combine
//! the answers. A single denial yields a single `false`, no retries.

use std::sync::Arc;

use async_trait::async_trait;
use log::info;

use crate::core::bluetooth::constants::{
    PERMISSION_PROMPT_AFFIRM, PERMISSION_PROMPT_MESSAGE, PERMISSION_PROMPT_TITLE,
};

/// A runtime capability the OS may gate BLE behind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    BluetoothScan,
    BluetoothConnect,
    FineLocation,
}

/// Human-readable text for the OS permission prompt, passed through unchanged
#[derive(Debug, Clone)]
pub struct PromptConfig {
    pub title: String,
    pub message: String,
    pub affirm_label: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            title: PERMISSION_PROMPT_TITLE.to_string(),
            message: PERMISSION_PROMPT_MESSAGE.to_string(),
            affirm_label: PERMISSION_PROMPT_AFFIRM.to_string(),
        }
    }
}

/// Which capability model the platform exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionModel {
    /// No runtime BLE permission model; everything is implicitly granted
    Unrestricted,
    /// Older model: a single fine-location grant covers scanning
    Legacy,
    /// Newer model: scan, connect and fine location are granted separately
    Runtime,
}

/// OS permission dialog collaborator
#[async_trait]
pub trait PermissionRequester: Send + Sync {
    /// Requests one capability, returning whether the OS reports it granted
    async fn request(&self, capability: Capability, prompt: &PromptConfig) -> bool;
}

/// Requester for platforms where BLE needs no runtime grants
pub struct AlwaysGranted;

#[async_trait]
impl PermissionRequester for AlwaysGranted {
    async fn request(&self, _capability: Capability, _prompt: &PromptConfig) -> bool {
        true
    }
}

/// Decides whether the process holds everything needed to scan and connect
pub struct PermissionGate {
    requester: Arc<dyn PermissionRequester>,
    model: PermissionModel,
    prompt: PromptConfig,
}

impl PermissionGate {
    pub fn new(requester: Arc<dyn PermissionRequester>, model: PermissionModel) -> Self {
        Self {
            requester,
            model,
            prompt: PromptConfig::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: PromptConfig) -> Self {
        self.prompt = prompt;
        self
    }

    /// Gate for the build targets this crate actually ships on, where the OS
    /// does not gate BLE behind runtime grants.
    pub fn platform_default() -> Self {
        Self::new(Arc::new(AlwaysGranted), PermissionModel::Unrestricted)
    }

    /// Requests every capability the platform's model requires and ANDs the
    /// results. The grant state itself is process-wide and owned by the OS.
    pub async fn request_permissions(&self) -> bool {
        match self.model {
            PermissionModel::Unrestricted => true,
            PermissionModel::Legacy => {
                let granted = self
                    .requester
                    .request(Capability::FineLocation, &self.prompt)
                    .await;
                info!("Legacy location permission granted: {granted}");
                granted
            }
            PermissionModel::Runtime => {
                let scan = self
                    .requester
                    .request(Capability::BluetoothScan, &self.prompt)
                    .await;
                let connect = self
                    .requester
                    .request(Capability::BluetoothConnect, &self.prompt)
                    .await;
                let location = self
                    .requester
                    .request(Capability::FineLocation, &self.prompt)
                    .await;
                info!("Runtime permissions - scan: {scan}, connect: {connect}, location: {location}");
                scan && connect && location
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    struct ScriptedRequester {
        grants: HashMap<Capability, bool>,
        asked: Mutex<Vec<Capability>>,
    }

    impl ScriptedRequester {
        fn new(grants: &[(Capability, bool)]) -> Self {
            Self {
                grants: grants.iter().copied().collect(),
                asked: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PermissionRequester for ScriptedRequester {
        async fn request(&self, capability: Capability, _prompt: &PromptConfig) -> bool {
            self.asked.lock().unwrap().push(capability);
            self.grants.get(&capability).copied().unwrap_or(false)
        }
    }

    #[tokio::test]
    async fn runtime_model_denies_when_any_capability_is_denied() {
        let requester = Arc::new(ScriptedRequester::new(&[
            (Capability::BluetoothScan, true),
            (Capability::BluetoothConnect, true),
            (Capability::FineLocation, false),
        ]));
        let gate = PermissionGate::new(requester.clone(), PermissionModel::Runtime);

        assert!(!gate.request_permissions().await);
        // All three capabilities are still requested before the results are combined.
        assert_eq!(requester.asked.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn runtime_model_grants_when_all_capabilities_are_granted() {
        let requester = Arc::new(ScriptedRequester::new(&[
            (Capability::BluetoothScan, true),
            (Capability::BluetoothConnect, true),
            (Capability::FineLocation, true),
        ]));
        let gate = PermissionGate::new(requester, PermissionModel::Runtime);

        assert!(gate.request_permissions().await);
    }

    #[tokio::test]
    async fn legacy_model_asks_for_location_only() {
        let requester = Arc::new(ScriptedRequester::new(&[(Capability::FineLocation, true)]));
        let gate = PermissionGate::new(requester.clone(), PermissionModel::Legacy);

        assert!(gate.request_permissions().await);
        assert_eq!(
            requester.asked.lock().unwrap().as_slice(),
            &[Capability::FineLocation]
        );
    }

    #[tokio::test]
    async fn unrestricted_model_grants_without_asking() {
        let requester = Arc::new(ScriptedRequester::new(&[]));
        let gate = PermissionGate::new(requester.clone(), PermissionModel::Unrestricted);

        assert!(gate.request_permissions().await);
        assert!(requester.asked.lock().unwrap().is_empty());
    }
}
