//! Transport-level error taxonomy.
//!
//! None of these reach the public API: the manager catches and logs them, and
//! callers observe only absent state, `false` results or [`ReadOutcome::Failed`].
//!
//! [`ReadOutcome::Failed`]: crate::core::bluetooth::types::ReadOutcome::Failed

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no Bluetooth adapter available")]
    AdapterUnavailable,

    #[error("device not found: {0}")]
    DeviceNotFound(String),

    #[error("failed to connect to {id}: {reason}")]
    ConnectFailed { id: String, reason: String },

    #[error("service discovery failed on {id}: {reason}")]
    DiscoveryFailed { id: String, reason: String },

    #[error("read of {characteristic} failed: {reason}")]
    ReadFailed {
        characteristic: String,
        reason: String,
    },

    #[error("scan error: {0}")]
    Scan(String),
}
