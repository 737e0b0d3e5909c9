//! # structsync-engine
//!
//! Export, import, and reconciliation engine for structural content.
//!
//! The [`pipeline`] module is the canonical entrypoint: [`pipeline::run_export`]
//! captures live entities of one kind into the snapshot store, and
//! [`pipeline::run_import`] replays a snapshot against the live store under
//! a [`structsync_core::ImportStyle`] policy. The [`reconciler`] underneath
//! is generic over the [`gateway::EntityGateway`] contract, so the same
//! create/update/delete logic serves taxonomies, menu links, and blocks.

pub mod error;
pub mod exporter;
pub mod gateway;
pub mod logger;
pub mod pipeline;
pub mod reconciler;
pub mod site;

pub use error::{GatewayError, SyncError};
pub use exporter::ExportReport;
pub use gateway::{CacheFlush, EntityGateway, LiveRef, NoopFlush};
pub use logger::Logger;
pub use reconciler::ImportReport;
pub use site::SiteDb;
