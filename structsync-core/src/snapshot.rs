//! Snapshot store — the persisted export document.
//!
//! One JSON document at `<home>/.structsync/data.json` holds the snapshots
//! of all three entity kinds plus the logging flag:
//!
//! ```text
//! {
//!   "version": 1,
//!   "log": true,
//!   "taxonomies": { "<vocabulary>": [TermRecord, ...], ... },
//!   "menus":      [MenuLinkRecord, ...],
//!   "blocks":     [BlockRecord, ...],
//!   "exported_at": "..."
//! }
//! ```
//!
//! Writes use the atomic `.tmp` + rename pattern. Callers replace one
//! kind in the in-memory document and save the whole document once per
//! export run, so a reader never observes a half-written snapshot and
//! rewriting one kind never disturbs the others.
//!
//! Every mutating function has two forms: `fn_at(home, …)` for tests with
//! a `TempDir`, and a no-home wrapper that derives home from
//! `dirs::home_dir()`. Tests must always use the `_at` form.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, StoreError};
use crate::types::{BlockRecord, EntityKind, MenuLinkRecord, TermRecord};

fn default_log() -> bool {
    true
}

/// The persisted snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotDoc {
    pub version: u32,
    /// Process-wide flag gating all non-error logging.
    #[serde(default = "default_log")]
    pub log: bool,
    /// Vocabulary machine name → ordered term list.
    #[serde(default)]
    pub taxonomies: BTreeMap<String, Vec<TermRecord>>,
    #[serde(default)]
    pub menus: Vec<MenuLinkRecord>,
    #[serde(default)]
    pub blocks: Vec<BlockRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl Default for SnapshotDoc {
    fn default() -> Self {
        Self {
            version: 1,
            log: true,
            taxonomies: BTreeMap::new(),
            menus: Vec::new(),
            blocks: Vec::new(),
            exported_at: None,
        }
    }
}

impl SnapshotDoc {
    /// Drop the snapshot for one kind, leaving the other kinds untouched.
    pub fn clear_kind(&mut self, kind: EntityKind) {
        match kind {
            EntityKind::Taxonomies => self.taxonomies.clear(),
            EntityKind::MenuLinks => self.menus.clear(),
            EntityKind::Blocks => self.blocks.clear(),
        }
    }

    /// Number of snapshot records held for one kind.
    pub fn record_count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Taxonomies => self.taxonomies.values().map(Vec::len).sum(),
            EntityKind::MenuLinks => self.menus.len(),
            EntityKind::Blocks => self.blocks.len(),
        }
    }

    /// Whether a snapshot for this kind has ever been exported.
    pub fn has_kind(&self, kind: EntityKind) -> bool {
        self.record_count(kind) > 0
    }
}

/// Path to the snapshot document, rooted at `home`.
///
/// `~/.structsync/data.json`
pub fn store_path_at(home: &Path) -> PathBuf {
    home.join(".structsync").join("data.json")
}

/// Load the snapshot document.
///
/// Returns the default (empty, logging enabled) document if the file does
/// not yet exist.
pub fn load_at(home: &Path) -> Result<SnapshotDoc, StoreError> {
    let path = store_path_at(home);
    if !path.exists() {
        return Ok(SnapshotDoc::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SnapshotDoc, StoreError> {
    load_at(&home()?)
}

/// Save the snapshot document atomically.
///
/// Writes to `data.json.tmp` then renames to `data.json`. The `.tmp`
/// sibling lives in the same directory as the target (same filesystem).
pub fn save_at(home: &Path, doc: &SnapshotDoc) -> Result<(), StoreError> {
    let path = store_path_at(home);
    let Some(dir) = path.parent() else {
        return Err(io_err(path, std::io::Error::other("invalid snapshot path")));
    };
    std::fs::create_dir_all(dir).map_err(|e| io_err(dir, e))?;

    let json = serde_json::to_string_pretty(doc)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, &path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(&path, e));
    }
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(doc: &SnapshotDoc) -> Result<(), StoreError> {
    save_at(&home()?, doc)
}

fn home() -> Result<PathBuf, StoreError> {
    dirs::home_dir().ok_or(StoreError::HomeNotFound)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
