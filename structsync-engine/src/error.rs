//! Error types for structsync-engine.

use std::path::PathBuf;

use thiserror::Error;

use structsync_core::StoreError;

/// Failures reported by an [`crate::gateway::EntityGateway`] implementation.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No live entity with this local id.
    #[error("no live entity with id {id}")]
    NotFound { id: u64 },

    /// The backing store rejected the operation.
    #[error("entity store error: {0}")]
    Backend(String),

    /// An I/O error from a file-backed store, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Site database (de)serialization error.
    #[error("site database JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// All errors that can arise from export/import runs.
#[derive(Debug, Error)]
pub enum SyncError {
    /// An error from the snapshot store.
    #[error("snapshot store error: {0}")]
    Store(#[from] StoreError),

    /// A gateway call failed; the failing record's identity is surfaced
    /// and remaining operations for the kind are abandoned (no rollback).
    #[error("gateway failure on \"{label}\": {source}")]
    Gateway {
        label: String,
        #[source]
        source: GatewayError,
    },

    /// A gateway enumeration/lookup failed outside any single record.
    #[error("gateway error: {0}")]
    Lookup(#[from] GatewayError),
}

/// Convenience constructor for [`GatewayError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> GatewayError {
    GatewayError::Io {
        path: path.into(),
        source,
    }
}

/// Wrap a gateway failure with the identity of the record being applied.
pub(crate) fn record_err(label: impl Into<String>, source: GatewayError) -> SyncError {
    SyncError::Gateway {
        label: label.into(),
        source,
    }
}
