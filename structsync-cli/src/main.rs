//! Structsync — structural content snapshot/restore CLI.
//!
//! # Usage
//!
//! ```text
//! structsync export <taxonomies|menus|blocks|all> [--select a,b] [--site PATH]
//! structsync import <taxonomies|menus|blocks|all> --style <safe|force|full> [--select a,b] [--site PATH]
//! structsync status [--json] [--site PATH]
//! structsync settings log <on|off>
//! ```

mod commands;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    export::ExportArgs, import::ImportArgs, settings::SettingsCommand, status::StatusArgs,
};
use structsync_core::{EntityKind, ImportStyle};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "structsync",
    version,
    about = "Export and import taxonomy, menu, and block structure",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Capture live structure of one kind into the snapshot store.
    Export(ExportArgs),

    /// Replay the snapshot against the live store under a policy.
    Import(ImportArgs),

    /// Show per-kind snapshot and live record counts.
    Status(StatusArgs),

    /// Adjust persisted settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

// ---------------------------------------------------------------------------
// Shared argument wrappers — parsed from CLI strings, convert to core types
// ---------------------------------------------------------------------------

/// Entity kind selector for `export`/`import`; `all` expands to every kind.
#[derive(Debug, Clone)]
pub enum KindArg {
    All,
    One(EntityKind),
}

impl KindArg {
    /// The kinds this argument expands to, in fixed order.
    pub fn kinds(&self) -> Vec<EntityKind> {
        match self {
            Self::All => EntityKind::all().to_vec(),
            Self::One(kind) => vec![*kind],
        }
    }
}

impl FromStr for KindArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        EntityKind::from_str(s).map(Self::One)
    }
}

impl fmt::Display for KindArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::One(kind) => kind.fmt(f),
        }
    }
}

/// Thin wrapper so clap can parse `ImportStyle` from CLI args.
#[derive(Debug, Clone)]
pub struct StyleArg(pub ImportStyle);

impl FromStr for StyleArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ImportStyle::from_str(s).map(Self)
    }
}

impl fmt::Display for StyleArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<StyleArg> for ImportStyle {
    fn from(s: StyleArg) -> Self {
        s.0
    }
}

/// Live-store path: explicit `--site` wins, otherwise `<home>/.structsync/site.json`.
pub fn resolve_site_path(home: &Path, site: Option<PathBuf>) -> PathBuf {
    site.unwrap_or_else(|| home.join(".structsync").join("site.json"))
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Export(args) => args.run(),
        Commands::Import(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Settings { command } => commands::settings::run(command),
    }
}
