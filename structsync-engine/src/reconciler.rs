//! Reconciler — computes and applies the operations that bring the live
//! store in line with a snapshot, under one of three policies.
//!
//! - `safe`: additive only; records already live (by external id or natural
//!   key) are skipped, the rest inserted.
//! - `force`: delete every live entity of the kind (once, before any
//!   insert), then insert the whole snapshot.
//! - `full`: true reconcile — update matched records, insert missing ones,
//!   delete live records absent from the snapshot.
//!
//! All parent linkage during a run goes through an explicit remap table
//! (`snapshot local id → live id`) built as records are matched or
//! inserted. Source records are never mutated; a parent outside the
//! snapshot is used as-is only when it verifiably exists live.
//!
//! Insertion order for hierarchical kinds is a worklist topological sort:
//! repeated passes insert every record whose parent is root, already
//! remapped, or already live; a pass that inserts nothing terminates the
//! loop and the remainder (cycles, dangling parents) is reported
//! unresolved rather than failing the run.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use structsync_core::{EntityKind, ImportStyle, LocalId, SyncRecord};

use crate::error::{record_err, SyncError};
use crate::gateway::EntityGateway;
use crate::logger::Logger;

/// Counted outcome of one import run for one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub kind: EntityKind,
    pub style: ImportStyle,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub skipped: usize,
    /// Labels of records left un-inserted (cyclic or dangling parents).
    pub unresolved: Vec<String>,
}

impl ImportReport {
    pub(crate) fn new(kind: EntityKind, style: ImportStyle) -> Self {
        Self {
            kind,
            style,
            created: 0,
            updated: 0,
            deleted: 0,
            skipped: 0,
            unresolved: Vec::new(),
        }
    }

    /// Whether this run changed live state at all.
    pub fn mutated(&self) -> bool {
        self.created + self.updated + self.deleted > 0
    }
}

/// Import a snapshot record list into the live store under `style`.
///
/// An empty record list (kind never exported, or selection filtered
/// everything out) is informational, not an error: the report comes back
/// all-zero and nothing is touched.
pub fn import<G: EntityGateway>(
    gateway: &mut G,
    records: Vec<G::Record>,
    style: ImportStyle,
    logger: &Logger,
) -> Result<ImportReport, SyncError> {
    let kind = G::Record::KIND;
    let mut report = ImportReport::new(kind, style);

    if records.is_empty() {
        logger.info(&format!("No {kind} snapshot to import"));
        return Ok(report);
    }

    logger.info(&format!("Using \"{style}\" style for {kind} import"));

    match style {
        ImportStyle::Safe => safe_import(gateway, records, &mut report, logger)?,
        ImportStyle::Force => force_import(gateway, records, &mut report, logger)?,
        ImportStyle::Full => full_import(gateway, records, &mut report, logger)?,
    }

    logger.info(&format!("Successfully imported {kind}"));
    Ok(report)
}

// ---------------------------------------------------------------------------
// safe — additive only
// ---------------------------------------------------------------------------

fn safe_import<G: EntityGateway>(
    gateway: &mut G,
    records: Vec<G::Record>,
    report: &mut ImportReport,
    logger: &Logger,
) -> Result<(), SyncError> {
    let live_by_external: BTreeMap<Uuid, LocalId> = gateway
        .list_live()?
        .into_iter()
        .map(|l| (l.external_id, l.local_id))
        .collect();

    let mut remap: BTreeMap<LocalId, LocalId> = BTreeMap::new();
    let mut pending = Vec::new();

    for record in records {
        if let Some(&live_id) = live_by_external.get(&record.external_id()) {
            // Already imported in a previous run; never overwrite.
            remap.insert(record.local_id(), live_id);
            report.skipped += 1;
            logger.info(&format!("\"{}\" already imported, skipping", record.label()));
        } else if let Some(live_id) = gateway.find_by_natural_key(&record.natural_key())? {
            // Logically the same record exists under a different identity.
            remap.insert(record.local_id(), live_id);
            report.skipped += 1;
            logger.info(&format!("\"{}\" already exists, skipping", record.label()));
        } else {
            pending.push(record);
        }
    }

    insert_pending(gateway, pending, &mut remap, report, logger)
}

// ---------------------------------------------------------------------------
// force — destructive full replace
// ---------------------------------------------------------------------------

fn force_import<G: EntityGateway>(
    gateway: &mut G,
    records: Vec<G::Record>,
    report: &mut ImportReport,
    logger: &Logger,
) -> Result<(), SyncError> {
    // Runs at most once per import and before any insert. Not safely
    // re-runnable after a partial failure.
    report.deleted = gateway.delete_all()?;
    logger.info(&format!("Deleted all {}", G::Record::KIND));

    let mut remap = BTreeMap::new();
    insert_pending(gateway, records, &mut remap, report, logger)
}

// ---------------------------------------------------------------------------
// full — create + update + delete
// ---------------------------------------------------------------------------

fn full_import<G: EntityGateway>(
    gateway: &mut G,
    records: Vec<G::Record>,
    report: &mut ImportReport,
    logger: &Logger,
) -> Result<(), SyncError> {
    let live = gateway.list_live()?;
    let live_by_external: BTreeMap<Uuid, LocalId> = live
        .iter()
        .map(|l| (l.external_id, l.local_id))
        .collect();
    let snapshot_ids: BTreeSet<Uuid> = records.iter().map(|r| r.external_id()).collect();

    // Remap matched records up front so inserted children can link to them,
    // then insert the missing records so updates can link to those.
    let mut remap: BTreeMap<LocalId, LocalId> = BTreeMap::new();
    let mut matched = Vec::new();
    let mut missing = Vec::new();
    for record in records {
        match live_by_external.get(&record.external_id()) {
            Some(&live_id) => {
                remap.insert(record.local_id(), live_id);
                matched.push((live_id, record));
            }
            None => missing.push(record),
        }
    }

    insert_pending(gateway, missing, &mut remap, report, logger)?;

    for (live_id, record) in matched {
        let parent = match record.parent_ref() {
            None => None,
            Some(p) => match remap.get(&p) {
                Some(&live_parent) => Some(live_parent),
                None if gateway.exists_local(p)? => Some(p),
                None => {
                    logger.warning(&format!(
                        "Parent of \"{}\" could not be resolved; keeping it at root",
                        record.label()
                    ));
                    None
                }
            },
        };
        gateway
            .update(live_id, &record, parent)
            .map_err(|e| record_err(record.label(), e))?;
        report.updated += 1;
        logger.info(&format!(
            "Updated \"{}\" in {}",
            record.label(),
            record.collection()
        ));
    }

    let extras: BTreeSet<Uuid> = live
        .iter()
        .filter(|l| !snapshot_ids.contains(&l.external_id))
        .map(|l| l.external_id)
        .collect();
    if !extras.is_empty() {
        let deleted = gateway.delete_by_external_ids(&extras)?;
        report.deleted += deleted;
        logger.info(&format!(
            "Deleted {deleted} {} not present in the snapshot",
            G::Record::KIND
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Topological insertion worklist
// ---------------------------------------------------------------------------

/// Insert `pending` records parent-before-child.
///
/// Each pass inserts every record whose parent resolves (root, remapped,
/// or already live and not shadowed by a pending record); a pass that
/// inserts nothing ends the loop. Leftovers are logged at warning and
/// recorded in the report — the run does not fail.
fn insert_pending<G: EntityGateway>(
    gateway: &mut G,
    mut pending: Vec<G::Record>,
    remap: &mut BTreeMap<LocalId, LocalId>,
    report: &mut ImportReport,
    logger: &Logger,
) -> Result<(), SyncError> {
    while !pending.is_empty() {
        let pending_ids: BTreeSet<LocalId> = pending.iter().map(|r| r.local_id()).collect();
        let mut next = Vec::new();
        let mut progressed = false;

        for record in pending {
            let parent = match record.parent_ref() {
                None => None,
                Some(p) => {
                    if let Some(&live_parent) = remap.get(&p) {
                        Some(live_parent)
                    } else if pending_ids.contains(&p) {
                        // Parent is later in this snapshot; wait for it.
                        next.push(record);
                        continue;
                    } else if gateway.exists_local(p)? {
                        // Parent is assumed already live.
                        Some(p)
                    } else {
                        next.push(record);
                        continue;
                    }
                }
            };

            let live_id = gateway
                .create(&record, parent)
                .map_err(|e| record_err(record.label(), e))?;
            remap.insert(record.local_id(), live_id);
            report.created += 1;
            progressed = true;
            logger.info(&format!(
                "Imported \"{}\" into {}",
                record.label(),
                record.collection()
            ));
        }

        pending = next;
        if !progressed {
            break;
        }
    }

    for record in &pending {
        logger.warning(&format!(
            "Could not import \"{}\": parent {} is unresolvable (cycle or missing)",
            record.label(),
            record.parent_ref().unwrap_or(0)
        ));
        report.unresolved.push(record.label().to_string());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
