//! Domain types for structural-content synchronization.
//!
//! Three record kinds travel through the snapshot: taxonomy terms, menu
//! links, and custom blocks. All three carry a stable `uuid` (the portable
//! identity), a store-local numeric id (not portable — must be remapped on
//! import), and for the hierarchical kinds a `parent` reference to another
//! record's local id, with `0` as the root sentinel.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-local numeric identifier. Valid only within one store instance.
pub type LocalId = u64;

/// Root sentinel for `parent` fields on hierarchical records.
pub const ROOT_PARENT: LocalId = 0;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// The three structural entity kinds the tool synchronizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Taxonomies,
    MenuLinks,
    Blocks,
}

impl EntityKind {
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Taxonomies,
            EntityKind::MenuLinks,
            EntityKind::Blocks,
        ]
    }

    /// Key used for this kind inside the snapshot document.
    pub fn key(&self) -> &'static str {
        match self {
            EntityKind::Taxonomies => "taxonomies",
            EntityKind::MenuLinks => "menus",
            EntityKind::Blocks => "blocks",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Taxonomies => write!(f, "taxonomies"),
            EntityKind::MenuLinks => write!(f, "menu links"),
            EntityKind::Blocks => write!(f, "custom blocks"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "taxonomies" | "taxonomy" | "terms" => Ok(EntityKind::Taxonomies),
            "menus" | "menu-links" | "menu_links" => Ok(EntityKind::MenuLinks),
            "blocks" | "block" => Ok(EntityKind::Blocks),
            other => Err(format!(
                "unknown entity kind '{other}'; expected: taxonomies, menus, blocks"
            )),
        }
    }
}

/// Import policy.
///
/// `Safe` only adds, `Force` wipes the kind and replaces it wholesale,
/// `Full` converges live state to exactly match the snapshot
/// (create + update + delete).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStyle {
    Safe,
    Force,
    Full,
}

impl fmt::Display for ImportStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportStyle::Safe => write!(f, "safe"),
            ImportStyle::Force => write!(f, "force"),
            ImportStyle::Full => write!(f, "full"),
        }
    }
}

impl FromStr for ImportStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "safe" => Ok(ImportStyle::Safe),
            "force" => Ok(ImportStyle::Force),
            "full" => Ok(ImportStyle::Full),
            other => Err(format!(
                "unknown import style '{other}'; expected: safe, force, full"
            )),
        }
    }
}

/// Log severity for the logging collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One taxonomy term as captured in a snapshot.
///
/// `tid` is the source store's term id at export time; `parent` refers to
/// another term's `tid` within the same vocabulary (`0` = root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRecord {
    pub uuid: Uuid,
    pub tid: LocalId,
    pub vocabulary: String,
    pub name: String,
    pub langcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    pub weight: i32,
    #[serde(default)]
    pub parent: LocalId,
}

/// One custom menu link as captured in a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuLinkRecord {
    pub uuid: Uuid,
    pub mlid: LocalId,
    pub menu_name: String,
    pub title: String,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub enabled: bool,
    pub expanded: bool,
    pub weight: i32,
    pub langcode: String,
    #[serde(default)]
    pub parent: LocalId,
}

/// One custom block as captured in a snapshot. Blocks form no hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub uuid: Uuid,
    pub bid: LocalId,
    pub info: String,
    pub langcode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body_format: Option<String>,
}

// ---------------------------------------------------------------------------
// SyncRecord — the per-kind adapter surface for the generic engine
// ---------------------------------------------------------------------------

/// Common view over the three record kinds.
///
/// The reconciler and exporter are generic over this trait; each kind
/// contributes its identity fields, its natural key, and its selector
/// grouping (vocabulary / menu name / block info).
pub trait SyncRecord: Clone + fmt::Debug {
    const KIND: EntityKind;

    /// Stable portable identity, preserved across export/import.
    fn external_id(&self) -> Uuid;

    /// Store-local id from the source system at export time.
    fn local_id(&self) -> LocalId;
    fn set_local_id(&mut self, id: LocalId);

    /// Parent reference within the same snapshot; `None` = root.
    fn parent_ref(&self) -> Option<LocalId>;
    fn set_parent_ref(&mut self, parent: Option<LocalId>);

    /// Human-meaningful key used to detect "logically the same record"
    /// when the external id is absent from the live store.
    fn natural_key(&self) -> String;

    /// Selector grouping this record belongs to.
    fn collection(&self) -> &str;

    /// Short label for log lines.
    fn label(&self) -> &str;
}

impl SyncRecord for TermRecord {
    const KIND: EntityKind = EntityKind::Taxonomies;

    fn external_id(&self) -> Uuid {
        self.uuid
    }

    fn local_id(&self) -> LocalId {
        self.tid
    }

    fn set_local_id(&mut self, id: LocalId) {
        self.tid = id;
    }

    fn parent_ref(&self) -> Option<LocalId> {
        (self.parent != ROOT_PARENT).then_some(self.parent)
    }

    fn set_parent_ref(&mut self, parent: Option<LocalId>) {
        self.parent = parent.unwrap_or(ROOT_PARENT);
    }

    fn natural_key(&self) -> String {
        format!("{}:{}", self.vocabulary, self.name)
    }

    fn collection(&self) -> &str {
        &self.vocabulary
    }

    fn label(&self) -> &str {
        &self.name
    }
}

impl SyncRecord for MenuLinkRecord {
    const KIND: EntityKind = EntityKind::MenuLinks;

    fn external_id(&self) -> Uuid {
        self.uuid
    }

    fn local_id(&self) -> LocalId {
        self.mlid
    }

    fn set_local_id(&mut self, id: LocalId) {
        self.mlid = id;
    }

    fn parent_ref(&self) -> Option<LocalId> {
        (self.parent != ROOT_PARENT).then_some(self.parent)
    }

    fn set_parent_ref(&mut self, parent: Option<LocalId>) {
        self.parent = parent.unwrap_or(ROOT_PARENT);
    }

    fn natural_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.menu_name, self.title, self.parent, self.weight
        )
    }

    fn collection(&self) -> &str {
        &self.menu_name
    }

    fn label(&self) -> &str {
        &self.title
    }
}

impl SyncRecord for BlockRecord {
    const KIND: EntityKind = EntityKind::Blocks;

    fn external_id(&self) -> Uuid {
        self.uuid
    }

    fn local_id(&self) -> LocalId {
        self.bid
    }

    fn set_local_id(&mut self, id: LocalId) {
        self.bid = id;
    }

    fn parent_ref(&self) -> Option<LocalId> {
        None
    }

    fn set_parent_ref(&mut self, _parent: Option<LocalId>) {}

    fn natural_key(&self) -> String {
        self.info.clone()
    }

    fn collection(&self) -> &str {
        &self.info
    }

    fn label(&self) -> &str {
        &self.info
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
