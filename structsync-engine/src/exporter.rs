//! Exporter — walks the live store and produces snapshot records.
//!
//! Selector resolution: an empty selector set means "every collection of
//! the kind"; an explicit set is intersected with what is actually live.
//! A selection that resolves to zero records aborts the export with a
//! warning and `None`, so the caller never clears a good snapshot on an
//! empty selection.

use std::collections::BTreeSet;

use structsync_core::{EntityKind, SyncRecord};

use crate::error::SyncError;
use crate::gateway::EntityGateway;
use crate::logger::Logger;

/// Outcome of exporting one entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub kind: EntityKind,
    pub exported: usize,
}

/// Enumerate the selected live records of one kind, with parent references
/// resolved through the gateway (root sentinel when no parent).
///
/// Returns `None` when the selection resolves to nothing — the prior
/// snapshot for the kind must be left untouched in that case.
pub fn export_kind<G: EntityGateway>(
    gateway: &G,
    selectors: &BTreeSet<String>,
    logger: &Logger,
) -> Result<Option<Vec<G::Record>>, SyncError> {
    let kind = G::Record::KIND;
    logger.info(&format!("{kind} export started"));

    let live_collections: BTreeSet<String> = gateway.list_collections()?.into_iter().collect();
    let resolved: BTreeSet<String> = if selectors.is_empty() {
        live_collections
    } else {
        selectors.intersection(&live_collections).cloned().collect()
    };

    if resolved.is_empty() {
        logger.warning(&format!("No {kind} selected/available"));
        return Ok(None);
    }

    let mut records = gateway.list_records(&resolved)?;
    if records.is_empty() {
        logger.warning(&format!("No {kind} selected/available"));
        return Ok(None);
    }

    // Embed each record's immediate live parent; blocks ignore this.
    for record in &mut records {
        let parent = gateway.find_parent(record.local_id())?;
        record.set_parent_ref(parent);
        logger.info(&format!("Exported \"{}\"", record.label()));
    }

    logger.info(&format!("{kind} exported"));
    Ok(Some(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::site::{SiteDb, TermGateway};
    use structsync_core::TermRecord;
    use uuid::Uuid;

    fn seed(db: &mut SiteDb, vocabulary: &str, name: &str, parent: u64) -> u64 {
        let record = TermRecord {
            uuid: Uuid::new_v4(),
            tid: 0,
            vocabulary: vocabulary.to_string(),
            name: name.to_string(),
            langcode: "en".to_string(),
            description: None,
            format: None,
            weight: 0,
            parent: 0,
        };
        let parent = (parent != 0).then_some(parent);
        TermGateway::new(db).create(&record, parent).unwrap()
    }

    #[test]
    fn exports_all_when_selector_empty() {
        let mut db = SiteDb::new();
        seed(&mut db, "tags", "a", 0);
        seed(&mut db, "genres", "b", 0);

        let gw = TermGateway::new(&mut db);
        let records = export_kind(&gw, &BTreeSet::new(), &Logger::default())
            .unwrap()
            .expect("records");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn selector_restricts_to_named_collections() {
        let mut db = SiteDb::new();
        seed(&mut db, "tags", "a", 0);
        seed(&mut db, "genres", "b", 0);

        let gw = TermGateway::new(&mut db);
        let selectors: BTreeSet<String> = ["genres".to_string()].into_iter().collect();
        let records = export_kind(&gw, &selectors, &Logger::default())
            .unwrap()
            .expect("records");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].vocabulary, "genres");
    }

    #[test]
    fn unmatched_selector_returns_none() {
        let mut db = SiteDb::new();
        seed(&mut db, "tags", "a", 0);

        let gw = TermGateway::new(&mut db);
        let selectors: BTreeSet<String> = ["missing".to_string()].into_iter().collect();
        let result = export_kind(&gw, &selectors, &Logger::default()).unwrap();
        assert!(result.is_none(), "zero-entity selection must not export");
    }

    #[test]
    fn empty_site_returns_none() {
        let mut db = SiteDb::new();
        let gw = TermGateway::new(&mut db);
        let result = export_kind(&gw, &BTreeSet::new(), &Logger::default()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn parent_references_are_embedded() {
        let mut db = SiteDb::new();
        let root = seed(&mut db, "tags", "Root", 0);
        seed(&mut db, "tags", "Child", root);

        let gw = TermGateway::new(&mut db);
        let records = export_kind(&gw, &BTreeSet::new(), &Logger::default())
            .unwrap()
            .expect("records");
        let child = records.iter().find(|r| r.name == "Child").unwrap();
        assert_eq!(child.parent, root);
        let root_record = records.iter().find(|r| r.name == "Root").unwrap();
        assert_eq!(root_record.parent, 0, "roots carry the sentinel");
    }
}
