//! Reference live-store: a JSON-file site database.
//!
//! `SiteDb` stands in for the platform's entity store: one document holding
//! the live structural rows of all three kinds plus per-kind id counters.
//! The per-kind [`EntityGateway`] adapters (`TermGateway`, `MenuGateway`,
//! `BlockGateway`) borrow it mutably for the duration of one run.
//!
//! Persistence uses the same atomic `.tmp` + rename protocol as the
//! snapshot store. Missing file loads as an empty site.

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use structsync_core::{
    BlockRecord, EntityKind, LocalId, MenuLinkRecord, SyncRecord, TermRecord,
};

use crate::error::{io_err, GatewayError};
use crate::gateway::{EntityGateway, LiveRef};

fn default_next_id() -> LocalId {
    1
}

/// The live site database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteDb {
    #[serde(default = "default_next_id")]
    next_tid: LocalId,
    #[serde(default = "default_next_id")]
    next_mlid: LocalId,
    #[serde(default = "default_next_id")]
    next_bid: LocalId,
    #[serde(default)]
    pub terms: Vec<TermRecord>,
    #[serde(default)]
    pub menu_links: Vec<MenuLinkRecord>,
    #[serde(default)]
    pub blocks: Vec<BlockRecord>,
}

impl SiteDb {
    pub fn new() -> Self {
        Self {
            next_tid: 1,
            next_mlid: 1,
            next_bid: 1,
            terms: Vec::new(),
            menu_links: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Number of live entities of one kind.
    pub fn live_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Taxonomies => self.terms.len(),
            EntityKind::MenuLinks => self.menu_links.len(),
            EntityKind::Blocks => self.blocks.len(),
        }
    }
}

// Counters start at 1; the derived Default would alias the root sentinel.
impl Default for SiteDb {
    fn default() -> Self {
        Self::new()
    }
}

/// Load the site database from `path`; an absent file is an empty site.
pub fn load_site(path: &Path) -> Result<SiteDb, GatewayError> {
    if !path.exists() {
        return Ok(SiteDb::new());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    Ok(serde_json::from_str(&contents)?)
}

/// Save the site database to `path` atomically.
pub fn save_site(path: &Path, db: &SiteDb) -> Result<(), GatewayError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;
        }
    }
    let json = serde_json::to_string_pretty(db)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Shared row operations — the three adapters differ only in which table
// and counter they touch
// ---------------------------------------------------------------------------

fn create_row<R: SyncRecord>(
    rows: &mut Vec<R>,
    next_id: &mut LocalId,
    record: &R,
    parent: Option<LocalId>,
) -> Result<LocalId, GatewayError> {
    if rows.iter().any(|r| r.external_id() == record.external_id()) {
        return Err(GatewayError::Backend(format!(
            "external id {} already live",
            record.external_id()
        )));
    }
    let id = *next_id;
    *next_id += 1;
    let mut row = record.clone();
    row.set_local_id(id);
    row.set_parent_ref(parent);
    rows.push(row);
    Ok(id)
}

fn update_row<R: SyncRecord>(
    rows: &mut [R],
    live_id: LocalId,
    record: &R,
    parent: Option<LocalId>,
) -> Result<(), GatewayError> {
    let row = rows
        .iter_mut()
        .find(|r| r.local_id() == live_id)
        .ok_or(GatewayError::NotFound { id: live_id })?;
    let mut replacement = record.clone();
    replacement.set_local_id(live_id);
    replacement.set_parent_ref(parent);
    *row = replacement;
    Ok(())
}

fn delete_all_rows<R>(rows: &mut Vec<R>) -> usize {
    let count = rows.len();
    rows.clear();
    count
}

fn delete_rows_by_external<R: SyncRecord>(rows: &mut Vec<R>, ids: &BTreeSet<Uuid>) -> usize {
    let before = rows.len();
    rows.retain(|r| !ids.contains(&r.external_id()));
    before - rows.len()
}

fn parent_of<R: SyncRecord>(rows: &[R], live_id: LocalId) -> Result<Option<LocalId>, GatewayError> {
    rows.iter()
        .find(|r| r.local_id() == live_id)
        .map(|r| r.parent_ref())
        .ok_or(GatewayError::NotFound { id: live_id })
}

fn live_refs<R: SyncRecord>(rows: &[R]) -> Vec<LiveRef> {
    rows.iter()
        .map(|r| LiveRef {
            external_id: r.external_id(),
            local_id: r.local_id(),
            natural_key: r.natural_key(),
        })
        .collect()
}

fn row_by_natural_key<R: SyncRecord>(rows: &[R], key: &str) -> Option<LocalId> {
    rows.iter()
        .find(|r| r.natural_key() == key)
        .map(|r| r.local_id())
}

fn rows_in_collections<R: SyncRecord>(rows: &[R], selectors: &BTreeSet<String>) -> Vec<R> {
    rows.iter()
        .filter(|r| selectors.is_empty() || selectors.contains(r.collection()))
        .cloned()
        .collect()
}

fn collection_names<R: SyncRecord>(rows: &[R]) -> Vec<String> {
    let names: BTreeSet<String> = rows.iter().map(|r| r.collection().to_string()).collect();
    names.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Per-kind gateway adapters
// ---------------------------------------------------------------------------

macro_rules! site_gateway {
    ($name:ident, $record:ty, $rows:ident, $next:ident) => {
        pub struct $name<'a> {
            pub db: &'a mut SiteDb,
        }

        impl<'a> $name<'a> {
            pub fn new(db: &'a mut SiteDb) -> Self {
                Self { db }
            }
        }

        impl EntityGateway for $name<'_> {
            type Record = $record;

            fn create(
                &mut self,
                record: &Self::Record,
                parent: Option<LocalId>,
            ) -> Result<LocalId, GatewayError> {
                create_row(&mut self.db.$rows, &mut self.db.$next, record, parent)
            }

            fn update(
                &mut self,
                live_id: LocalId,
                record: &Self::Record,
                parent: Option<LocalId>,
            ) -> Result<(), GatewayError> {
                update_row(&mut self.db.$rows, live_id, record, parent)
            }

            fn delete_all(&mut self) -> Result<usize, GatewayError> {
                Ok(delete_all_rows(&mut self.db.$rows))
            }

            fn delete_by_external_ids(
                &mut self,
                ids: &BTreeSet<Uuid>,
            ) -> Result<usize, GatewayError> {
                Ok(delete_rows_by_external(&mut self.db.$rows, ids))
            }

            fn find_parent(&self, live_id: LocalId) -> Result<Option<LocalId>, GatewayError> {
                parent_of(&self.db.$rows, live_id)
            }

            fn list_live(&self) -> Result<Vec<LiveRef>, GatewayError> {
                Ok(live_refs(&self.db.$rows))
            }

            fn find_by_natural_key(&self, key: &str) -> Result<Option<LocalId>, GatewayError> {
                Ok(row_by_natural_key(&self.db.$rows, key))
            }

            fn exists_local(&self, live_id: LocalId) -> Result<bool, GatewayError> {
                Ok(self.db.$rows.iter().any(|r| r.local_id() == live_id))
            }

            fn list_records(
                &self,
                selectors: &BTreeSet<String>,
            ) -> Result<Vec<Self::Record>, GatewayError> {
                Ok(rows_in_collections(&self.db.$rows, selectors))
            }

            fn list_collections(&self) -> Result<Vec<String>, GatewayError> {
                Ok(collection_names(&self.db.$rows))
            }
        }
    };
}

site_gateway!(TermGateway, TermRecord, terms, next_tid);
site_gateway!(MenuGateway, MenuLinkRecord, menu_links, next_mlid);
site_gateway!(BlockGateway, BlockRecord, blocks, next_bid);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn term(name: &str) -> TermRecord {
        TermRecord {
            uuid: Uuid::new_v4(),
            tid: 0,
            vocabulary: "tags".to_string(),
            name: name.to_string(),
            langcode: "en".to_string(),
            description: None,
            format: None,
            weight: 0,
            parent: 0,
        }
    }

    #[test]
    fn create_assigns_sequential_ids() {
        let mut db = SiteDb::new();
        let mut gw = TermGateway::new(&mut db);
        let a = gw.create(&term("a"), None).unwrap();
        let b = gw.create(&term("b"), Some(a)).unwrap();
        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(gw.find_parent(b).unwrap(), Some(a));
    }

    #[test]
    fn create_rejects_duplicate_external_id() {
        let mut db = SiteDb::new();
        let record = term("a");
        let mut gw = TermGateway::new(&mut db);
        gw.create(&record, None).unwrap();
        let err = gw.create(&record, None).unwrap_err();
        assert!(matches!(err, GatewayError::Backend(_)));
    }

    #[test]
    fn ids_are_not_reused_after_delete_all() {
        let mut db = SiteDb::new();
        let mut gw = TermGateway::new(&mut db);
        gw.create(&term("a"), None).unwrap();
        gw.create(&term("b"), None).unwrap();
        assert_eq!(gw.delete_all().unwrap(), 2);
        let next = gw.create(&term("c"), None).unwrap();
        assert_eq!(next, 3, "counters survive delete_all");
    }

    #[test]
    fn update_replaces_attributes_in_place() {
        let mut db = SiteDb::new();
        let mut gw = TermGateway::new(&mut db);
        let record = term("old");
        let id = gw.create(&record, None).unwrap();

        let mut edited = record.clone();
        edited.name = "new".to_string();
        edited.weight = 9;
        gw.update(id, &edited, None).unwrap();

        assert_eq!(db.terms[0].name, "new");
        assert_eq!(db.terms[0].weight, 9);
        assert_eq!(db.terms[0].tid, id, "live id is preserved on update");
    }

    #[test]
    fn update_unknown_id_is_not_found() {
        let mut db = SiteDb::new();
        let mut gw = TermGateway::new(&mut db);
        let err = gw.update(42, &term("x"), None).unwrap_err();
        assert!(matches!(err, GatewayError::NotFound { id: 42 }));
    }

    #[test]
    fn delete_by_external_ids_removes_only_named() {
        let mut db = SiteDb::new();
        let keep = term("keep");
        let drop = term("drop");
        let mut gw = TermGateway::new(&mut db);
        gw.create(&keep, None).unwrap();
        gw.create(&drop, None).unwrap();

        let ids: BTreeSet<Uuid> = [drop.uuid].into_iter().collect();
        assert_eq!(gw.delete_by_external_ids(&ids).unwrap(), 1);
        assert_eq!(db.terms.len(), 1);
        assert_eq!(db.terms[0].name, "keep");
    }

    #[test]
    fn natural_key_lookup_finds_live_id() {
        let mut db = SiteDb::new();
        let mut gw = TermGateway::new(&mut db);
        let id = gw.create(&term("Jazz"), None).unwrap();
        assert_eq!(gw.find_by_natural_key("tags:Jazz").unwrap(), Some(id));
        assert_eq!(gw.find_by_natural_key("tags:Polka").unwrap(), None);
    }

    #[test]
    fn list_records_honours_selectors() {
        let mut db = SiteDb::new();
        let mut other = term("other");
        other.vocabulary = "genres".to_string();
        let mut gw = TermGateway::new(&mut db);
        gw.create(&term("a"), None).unwrap();
        gw.create(&other, None).unwrap();

        let all = gw.list_records(&BTreeSet::new()).unwrap();
        assert_eq!(all.len(), 2);

        let selected: BTreeSet<String> = ["genres".to_string()].into_iter().collect();
        let filtered = gw.list_records(&selected).unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].vocabulary, "genres");

        assert_eq!(gw.list_collections().unwrap(), vec!["genres", "tags"]);
    }

    #[test]
    fn site_persistence_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("site.json");

        let mut db = SiteDb::new();
        TermGateway::new(&mut db).create(&term("a"), None).unwrap();
        save_site(&path, &db).unwrap();

        let loaded = load_site(&path).unwrap();
        assert_eq!(loaded, db);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn missing_site_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let db = load_site(&dir.path().join("absent.json")).unwrap();
        assert_eq!(db.live_count(EntityKind::Taxonomies), 0);
    }
}
