//! `structsync export` — capture live structure into the snapshot store.

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use structsync_engine::pipeline;

use crate::{resolve_site_path, KindArg};

/// Arguments for `structsync export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Entity kind to export: taxonomies | menus | blocks | all.
    pub kind: KindArg,

    /// Restrict to named collections (vocabularies, menus, or block names).
    #[arg(long, value_delimiter = ',', value_name = "NAME")]
    pub select: Vec<String>,

    /// Path to the live site store.
    #[arg(long, value_name = "PATH")]
    pub site: Option<PathBuf>,
}

impl ExportArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let site = resolve_site_path(&home, self.site);
        let selectors: BTreeSet<String> = self.select.into_iter().collect();

        for kind in self.kind.kinds() {
            let report = pipeline::run_export(&home, &site, kind, &selectors)
                .with_context(|| format!("export failed for {kind}"))?;
            if report.exported == 0 {
                println!(
                    "{} no {kind} exported (nothing selected or available)",
                    "⚠".yellow().bold()
                );
            } else {
                println!(
                    "{} exported {} {kind} record(s)",
                    "✓".green().bold(),
                    report.exported
                );
            }
        }

        Ok(())
    }
}
