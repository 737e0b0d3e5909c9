//! structsync core library — domain types, snapshot store, errors.
//!
//! Public API surface:
//! - [`types`] — record structs, the [`types::SyncRecord`] trait, enums
//! - [`snapshot`] — the persisted snapshot document, load / save
//! - [`error`] — [`StoreError`]

pub mod error;
pub mod snapshot;
pub mod types;

pub use error::StoreError;
pub use snapshot::SnapshotDoc;
pub use types::{
    BlockRecord, EntityKind, ImportStyle, LocalId, MenuLinkRecord, Severity, SyncRecord,
    TermRecord, ROOT_PARENT,
};
