//! `structsync import` — replay the snapshot against the live store.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use structsync_core::ImportStyle;
use structsync_engine::{pipeline, CacheFlush, ImportReport};

use crate::{resolve_site_path, KindArg, StyleArg};

/// Arguments for `structsync import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Entity kind to import: taxonomies | menus | blocks | all.
    pub kind: KindArg,

    /// Import policy: safe | force | full.
    #[arg(long, value_name = "STYLE")]
    pub style: StyleArg,

    /// Restrict to named collections (vocabularies, menus, or block names).
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub select: Vec<String>,

    /// Path to the live site store.
    #[arg(long, value_name = "PATH")]
    pub site: Option<PathBuf>,
}

/// Announces the flush on the terminal; the engine decides when it runs.
struct StdoutFlush;

impl CacheFlush for StdoutFlush {
    fn flush(&mut self) {
        println!("{} caches flushed", "✓".green().bold());
    }
}

impl ImportArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let site = resolve_site_path(&home, self.site);
        let selectors: BTreeSet<String> = self.select.into_iter().collect();
        let style: ImportStyle = self.style.into();

        if style == ImportStyle::Force {
            println!(
                "{} force import deletes every live record of the kind before re-creating",
                "warning:".yellow().bold()
            );
        }

        let mut flush = StdoutFlush;
        for kind in self.kind.kinds() {
            let report = pipeline::run_import(&home, &site, kind, style, &selectors, &mut flush)
                .with_context(|| format!("import failed for {kind}"))?;
            print_summary(&report);
        }

        Ok(())
    }
}

fn print_summary(report: &ImportReport) {
    println!(
        "{} {} imported ({}): {} created, {} updated, {} deleted, {} skipped",
        "✓".green().bold(),
        report.kind,
        report.style,
        report.created,
        report.updated,
        report.deleted,
        report.skipped,
    );
    for label in &report.unresolved {
        println!(
            "  {} \"{label}\" not inserted (unresolvable parent)",
            "⚠".yellow().bold()
        );
    }
}
