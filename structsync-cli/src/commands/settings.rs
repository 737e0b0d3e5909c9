//! `structsync settings` — persisted configuration toggles.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::Colorize;

use structsync_core::snapshot;

/// Persisted settings stored alongside the snapshot document.
#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    /// Enable or disable per-record logging during export/import runs.
    Log {
        /// on | off
        state: OnOff,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnOff {
    On,
    Off,
}

impl FromStr for OnOff {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" => Ok(Self::On),
            "off" | "false" | "0" => Ok(Self::Off),
            other => Err(format!("expected 'on' or 'off', got '{other}'")),
        }
    }
}

impl fmt::Display for OnOff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::On => write!(f, "on"),
            Self::Off => write!(f, "off"),
        }
    }
}

pub fn run(cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Log { state } => set_log(state),
    }
}

fn set_log(state: OnOff) -> Result<()> {
    let mut doc = snapshot::load().context("failed to load snapshot store")?;
    doc.log = state == OnOff::On;
    snapshot::save(&doc).context("failed to persist settings")?;

    println!("{} logging turned {state}", "✓".green().bold());
    Ok(())
}
