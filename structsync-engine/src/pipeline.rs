//! Run pipeline — the canonical export/import entrypoints shared by the
//! CLI and tests.
//!
//! A run wires together the snapshot store (rooted at `home`), the site
//! database (the live store stand-in), the per-kind gateway, and the
//! generic exporter/reconciler. The persisted logging flag is read once
//! from the snapshot document at run start and passed down explicitly.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;

use structsync_core::{snapshot, EntityKind, ImportStyle, SnapshotDoc, SyncRecord, TermRecord};

use crate::error::SyncError;
use crate::exporter::{export_kind, ExportReport};
use crate::gateway::{CacheFlush, EntityGateway};
use crate::logger::Logger;
use crate::reconciler::{import, ImportReport};
use crate::site::{self, BlockGateway, MenuGateway, SiteDb, TermGateway};

/// Export one entity kind from the site at `site_path` into the snapshot
/// store rooted at `home`.
///
/// On an empty selection the prior snapshot for the kind is left
/// untouched and a zero-count report is returned.
pub fn run_export(
    home: &Path,
    site_path: &Path,
    kind: EntityKind,
    selectors: &BTreeSet<String>,
) -> Result<ExportReport, SyncError> {
    let mut doc = snapshot::load_at(home)?;
    let logger = Logger::new(doc.log);
    let mut db = site::load_site(site_path)?;

    let exported = match kind {
        EntityKind::Taxonomies => {
            let gw = TermGateway::new(&mut db);
            match export_kind(&gw, selectors, &logger)? {
                None => return Ok(ExportReport { kind, exported: 0 }),
                Some(records) => {
                    let count = records.len();
                    doc.taxonomies = group_by_vocabulary(records);
                    count
                }
            }
        }
        EntityKind::MenuLinks => {
            let gw = MenuGateway::new(&mut db);
            match export_kind(&gw, selectors, &logger)? {
                None => return Ok(ExportReport { kind, exported: 0 }),
                Some(records) => {
                    let count = records.len();
                    doc.menus = records;
                    count
                }
            }
        }
        EntityKind::Blocks => {
            let gw = BlockGateway::new(&mut db);
            match export_kind(&gw, selectors, &logger)? {
                None => return Ok(ExportReport { kind, exported: 0 }),
                Some(records) => {
                    let count = records.len();
                    doc.blocks = records;
                    count
                }
            }
        }
    };

    doc.exported_at = Some(Utc::now());
    snapshot::save_at(home, &doc)?;
    Ok(ExportReport { kind, exported })
}

/// Import one entity kind from the snapshot store into the site at
/// `site_path` under `style`.
///
/// The cache flush collaborator is invoked exactly once, after the site
/// has been persisted, and only when the run mutated live state. A
/// gateway failure aborts the remaining operations for the kind but
/// persists whatever partial convergence was reached (no rollback).
pub fn run_import(
    home: &Path,
    site_path: &Path,
    kind: EntityKind,
    style: ImportStyle,
    selectors: &BTreeSet<String>,
    flush: &mut dyn CacheFlush,
) -> Result<ImportReport, SyncError> {
    let doc = snapshot::load_at(home)?;
    let logger = Logger::new(doc.log);
    logger.info(&format!("{kind} import started"));

    let mut db = site::load_site(site_path)?;
    let result = dispatch_import(&mut db, &doc, kind, style, selectors, &logger);

    match result {
        Ok(report) => {
            if report.mutated() {
                site::save_site(site_path, &db)?;
                logger.info("Flushing all caches");
                flush.flush();
            }
            Ok(report)
        }
        Err(err) => {
            // Keep the partially-converged store; `safe` and `full` can be
            // re-run to finish convergence.
            site::save_site(site_path, &db)?;
            Err(err)
        }
    }
}

fn dispatch_import(
    db: &mut SiteDb,
    doc: &SnapshotDoc,
    kind: EntityKind,
    style: ImportStyle,
    selectors: &BTreeSet<String>,
    logger: &Logger,
) -> Result<ImportReport, SyncError> {
    let has_snapshot = doc.has_kind(kind);
    match kind {
        EntityKind::Taxonomies => {
            let records: Vec<TermRecord> = doc
                .taxonomies
                .iter()
                .filter(|(voc, _)| selectors.is_empty() || selectors.contains(voc.as_str()))
                .flat_map(|(_, terms)| terms.iter().cloned())
                .collect();
            let mut gw = TermGateway::new(db);
            import_selected(&mut gw, records, has_snapshot, style, logger)
        }
        EntityKind::MenuLinks => {
            let records = doc
                .menus
                .iter()
                .filter(|m| selectors.is_empty() || selectors.contains(&m.menu_name))
                .cloned()
                .collect();
            let mut gw = MenuGateway::new(db);
            import_selected(&mut gw, records, has_snapshot, style, logger)
        }
        EntityKind::Blocks => {
            let records = doc
                .blocks
                .iter()
                .filter(|b| selectors.is_empty() || selectors.contains(&b.info))
                .cloned()
                .collect();
            let mut gw = BlockGateway::new(db);
            import_selected(&mut gw, records, has_snapshot, style, logger)
        }
    }
}

/// A snapshot exists for the kind but the selection matched none of its
/// records: that is a warning, not the informational never-exported case
/// the reconciler handles itself.
fn import_selected<G: EntityGateway>(
    gateway: &mut G,
    records: Vec<G::Record>,
    has_snapshot: bool,
    style: ImportStyle,
    logger: &Logger,
) -> Result<ImportReport, SyncError> {
    if records.is_empty() && has_snapshot {
        logger.warning(&format!("No {} selected for import", G::Record::KIND));
        return Ok(ImportReport::new(G::Record::KIND, style));
    }
    import(gateway, records, style, logger)
}

fn group_by_vocabulary(records: Vec<TermRecord>) -> BTreeMap<String, Vec<TermRecord>> {
    let mut grouped: BTreeMap<String, Vec<TermRecord>> = BTreeMap::new();
    for record in records {
        grouped.entry(record.vocabulary.clone()).or_default().push(record);
    }
    grouped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::NoopFlush;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn seed_term(db: &mut SiteDb, vocabulary: &str, name: &str) {
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
        use crate::gateway::EntityGateway;
        TermGateway::new(db).create(&record, None).unwrap();
    }

    struct CountingFlush(usize);

    impl CacheFlush for CountingFlush {
        fn flush(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn export_writes_snapshot_grouped_by_vocabulary() {
        let home = TempDir::new().unwrap();
        let site_dir = TempDir::new().unwrap();
        let site_path = site_dir.path().join("site.json");

        let mut db = SiteDb::new();
        seed_term(&mut db, "tags", "a");
        seed_term(&mut db, "genres", "b");
        site::save_site(&site_path, &db).unwrap();

        let report =
            run_export(home.path(), &site_path, EntityKind::Taxonomies, &BTreeSet::new()).unwrap();
        assert_eq!(report.exported, 2);

        let doc = snapshot::load_at(home.path()).unwrap();
        assert_eq!(doc.taxonomies.len(), 2);
        assert!(doc.taxonomies.contains_key("tags"));
        assert!(doc.taxonomies.contains_key("genres"));
        assert!(doc.exported_at.is_some());
    }

    #[test]
    fn empty_selection_preserves_prior_snapshot() {
        let home = TempDir::new().unwrap();
        let site_dir = TempDir::new().unwrap();
        let site_path = site_dir.path().join("site.json");

        let mut db = SiteDb::new();
        seed_term(&mut db, "tags", "a");
        site::save_site(&site_path, &db).unwrap();

        run_export(home.path(), &site_path, EntityKind::Taxonomies, &BTreeSet::new()).unwrap();

        // A selector matching nothing must not clear the good snapshot.
        let selectors: BTreeSet<String> = ["nope".to_string()].into_iter().collect();
        let report =
            run_export(home.path(), &site_path, EntityKind::Taxonomies, &selectors).unwrap();
        assert_eq!(report.exported, 0);

        let doc = snapshot::load_at(home.path()).unwrap();
        assert_eq!(doc.record_count(EntityKind::Taxonomies), 1);
    }

    #[test]
    fn import_flushes_cache_exactly_once_when_mutated() {
        let home = TempDir::new().unwrap();
        let site_dir = TempDir::new().unwrap();
        let site_path = site_dir.path().join("site.json");

        let mut db = SiteDb::new();
        seed_term(&mut db, "tags", "a");
        site::save_site(&site_path, &db).unwrap();
        run_export(home.path(), &site_path, EntityKind::Taxonomies, &BTreeSet::new()).unwrap();

        // Wipe the site; force import recreates it.
        site::save_site(&site_path, &SiteDb::new()).unwrap();
        let mut flush = CountingFlush(0);
        let report = run_import(
            home.path(),
            &site_path,
            EntityKind::Taxonomies,
            ImportStyle::Force,
            &BTreeSet::new(),
            &mut flush,
        )
        .unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(flush.0, 1, "mutating import flushes once");

        let live = site::load_site(&site_path).unwrap();
        assert_eq!(live.live_count(EntityKind::Taxonomies), 1);
    }

    #[test]
    fn non_mutating_import_skips_cache_flush() {
        let home = TempDir::new().unwrap();
        let site_dir = TempDir::new().unwrap();
        let site_path = site_dir.path().join("site.json");

        // Nothing was ever exported: empty operation set, no flush.
        let mut flush = CountingFlush(0);
        let report = run_import(
            home.path(),
            &site_path,
            EntityKind::MenuLinks,
            ImportStyle::Safe,
            &BTreeSet::new(),
            &mut flush,
        )
        .unwrap();
        assert!(!report.mutated());
        assert_eq!(flush.0, 0);
    }

    #[test]
    fn unmatched_import_selector_touches_nothing() {
        let home = TempDir::new().unwrap();
        let site_dir = TempDir::new().unwrap();
        let site_path = site_dir.path().join("site.json");

        let mut db = SiteDb::new();
        seed_term(&mut db, "tags", "a");
        site::save_site(&site_path, &db).unwrap();
        run_export(home.path(), &site_path, EntityKind::Taxonomies, &BTreeSet::new()).unwrap();

        // Snapshot holds records, but the selector matches none of them.
        let selectors: BTreeSet<String> = ["nope".to_string()].into_iter().collect();
        let mut flush = CountingFlush(0);
        let report = run_import(
            home.path(),
            &site_path,
            EntityKind::Taxonomies,
            ImportStyle::Force,
            &selectors,
            &mut flush,
        )
        .unwrap();

        assert!(!report.mutated(), "nothing may run on an empty selection");
        assert_eq!(flush.0, 0);
        let live = site::load_site(&site_path).unwrap();
        assert_eq!(live.terms.len(), 1, "force must not delete on an empty selection");
    }

    #[test]
    fn import_selector_filters_vocabularies() {
        let home = TempDir::new().unwrap();
        let site_dir = TempDir::new().unwrap();
        let site_path = site_dir.path().join("site.json");

        let mut db = SiteDb::new();
        seed_term(&mut db, "tags", "a");
        seed_term(&mut db, "genres", "b");
        site::save_site(&site_path, &db).unwrap();
        run_export(home.path(), &site_path, EntityKind::Taxonomies, &BTreeSet::new()).unwrap();

        site::save_site(&site_path, &SiteDb::new()).unwrap();
        let selectors: BTreeSet<String> = ["genres".to_string()].into_iter().collect();
        let report = run_import(
            home.path(),
            &site_path,
            EntityKind::Taxonomies,
            ImportStyle::Safe,
            &selectors,
            &mut NoopFlush,
        )
        .unwrap();
        assert_eq!(report.created, 1);

        let live = site::load_site(&site_path).unwrap();
        assert_eq!(live.terms.len(), 1);
        assert_eq!(live.terms[0].vocabulary, "genres");
    }
}
