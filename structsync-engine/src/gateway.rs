//! Entity Gateway — the contract between the engine and the live store.
//!
//! One implementation exists per entity kind. Calls are logically atomic
//! per record; the engine provides no cross-record rollback, so a failure
//! mid-run leaves a partially-converged store that a re-run of `safe` or
//! `full` finishes converging.

use std::collections::BTreeSet;

use uuid::Uuid;

use structsync_core::{LocalId, SyncRecord};

use crate::error::GatewayError;

/// One live entity as seen by the reconciler: its portable identity, its
/// store-local id, and its natural key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRef {
    pub external_id: Uuid,
    pub local_id: LocalId,
    pub natural_key: String,
}

/// CRUD and structural queries against the live store for one entity kind.
pub trait EntityGateway {
    type Record: SyncRecord;

    /// Insert a new live entity carrying the record's external id.
    /// Returns the newly assigned live local id.
    fn create(
        &mut self,
        record: &Self::Record,
        parent: Option<LocalId>,
    ) -> Result<LocalId, GatewayError>;

    /// Overwrite all attribute fields of an existing live entity.
    fn update(
        &mut self,
        live_id: LocalId,
        record: &Self::Record,
        parent: Option<LocalId>,
    ) -> Result<(), GatewayError>;

    /// Delete every live entity of this kind. Returns the count deleted.
    fn delete_all(&mut self) -> Result<usize, GatewayError>;

    /// Delete the live entities with these external ids. Returns the count.
    fn delete_by_external_ids(&mut self, ids: &BTreeSet<Uuid>) -> Result<usize, GatewayError>;

    /// Immediate parent of a live entity, if any.
    fn find_parent(&self, live_id: LocalId) -> Result<Option<LocalId>, GatewayError>;

    /// Enumerate all live entities of this kind.
    fn list_live(&self) -> Result<Vec<LiveRef>, GatewayError>;

    /// Look up a live entity by natural key.
    fn find_by_natural_key(&self, key: &str) -> Result<Option<LocalId>, GatewayError>;

    /// Whether a live entity with this local id exists.
    fn exists_local(&self, live_id: LocalId) -> Result<bool, GatewayError>;

    /// Export enumeration: all records of this kind, optionally restricted
    /// to the named collections (vocabularies / menus / block infos).
    /// An empty selector means "all". Parent references come back as
    /// stored; the exporter re-resolves them via [`Self::find_parent`].
    fn list_records(
        &self,
        selectors: &BTreeSet<String>,
    ) -> Result<Vec<Self::Record>, GatewayError>;

    /// Names of the live collections of this kind, sorted.
    fn list_collections(&self) -> Result<Vec<String>, GatewayError>;
}

/// Post-import collaborator: invalidates whatever caches the surrounding
/// platform keeps of structural content. Called exactly once at the end of
/// any import that mutated live state.
pub trait CacheFlush {
    fn flush(&mut self);
}

/// No-op flush for callers without a cache layer.
#[derive(Debug, Default)]
pub struct NoopFlush;

impl CacheFlush for NoopFlush {
    fn flush(&mut self) {}
}
