//! `structsync status` — snapshot vs. live visibility.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use structsync_core::{snapshot, EntityKind};
use structsync_engine::site;

use crate::resolve_site_path;

/// Arguments for `structsync status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,

    /// Path to the live site store.
    #[arg(long, value_name = "PATH")]
    pub site: Option<PathBuf>,
}

#[derive(Debug, Clone)]
struct KindStatus {
    kind: EntityKind,
    snapshot_records: usize,
    live_records: usize,
}

#[derive(Serialize)]
struct StatusJson {
    exported_at: Option<String>,
    export_age: String,
    logging: bool,
    kinds: Vec<KindStatusJson>,
}

#[derive(Serialize)]
struct KindStatusJson {
    kind: String,
    snapshot_records: usize,
    live_records: usize,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "kind")]
    kind: String,
    #[tabled(rename = "snapshot")]
    snapshot: usize,
    #[tabled(rename = "live")]
    live: usize,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home: PathBuf = dirs::home_dir().context("could not determine home directory")?;
        let site_path = resolve_site_path(&home, self.site);

        let doc = snapshot::load_at(&home).context("failed to load snapshot store")?;
        let db = site::load_site(&site_path)
            .with_context(|| format!("failed to load site store at {}", site_path.display()))?;

        let rows: Vec<KindStatus> = EntityKind::all()
            .iter()
            .map(|&kind| KindStatus {
                kind,
                snapshot_records: doc.record_count(kind),
                live_records: db.live_count(kind),
            })
            .collect();

        if self.json {
            let payload = StatusJson {
                exported_at: doc.exported_at.map(|ts| ts.to_rfc3339()),
                export_age: format_export_age(doc.exported_at),
                logging: doc.log,
                kinds: rows
                    .into_iter()
                    .map(|row| KindStatusJson {
                        kind: row.kind.key().to_string(),
                        snapshot_records: row.snapshot_records,
                        live_records: row.live_records,
                    })
                    .collect(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload)
                    .context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&doc.exported_at, doc.log, rows);
        Ok(())
    }
}

fn print_table(exported_at: &Option<DateTime<Utc>>, logging: bool, rows: Vec<KindStatus>) {
    println!(
        "Structsync v{} | last export: {} | logging: {}",
        env!("CARGO_PKG_VERSION"),
        format_export_age(*exported_at),
        if logging {
            "on".green().to_string()
        } else {
            "off".yellow().to_string()
        },
    );

    let table_rows: Vec<StatusTableRow> = rows
        .into_iter()
        .map(|row| StatusTableRow {
            kind: row.kind.to_string(),
            snapshot: row.snapshot_records,
            live: row.live_records,
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn format_export_age(exported_at: Option<DateTime<Utc>>) -> String {
    let Some(ts) = exported_at else {
        return "never".to_string();
    };
    let minutes = (Utc::now() - ts).num_minutes();
    match minutes {
        m if m < 1 => "just now".to_string(),
        m if m < 60 => format!("{m}m ago"),
        m if m < 60 * 24 => format!("{}h ago", m / 60),
        m => format!("{}d ago", m / (60 * 24)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn age_is_never_without_an_export() {
        assert_eq!(format_export_age(None), "never");
    }

    #[test]
    fn age_buckets() {
        let now = Utc::now();
        assert_eq!(format_export_age(Some(now)), "just now");
        assert_eq!(format_export_age(Some(now - Duration::minutes(5))), "5m ago");
        assert_eq!(format_export_age(Some(now - Duration::hours(3))), "3h ago");
        assert_eq!(format_export_age(Some(now - Duration::days(2))), "2d ago");
    }
}
