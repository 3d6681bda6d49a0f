//! Export/preflight/import migration engine.
//!
//! `exporter` reads the source into an [`ExportedData`] graph; `preflight`
//! classifies it against the destination into a [`MigrationPreview`];
//! `importer` replays it onto the destination, idempotently. `api::preview`
//! and `api::run` are the two call-shapes the host application drives.

mod api;
mod cancel;
mod data;
mod error;
mod exporter;
mod id_map;
mod importer;
mod log_lines;
mod preflight;
mod preview_store;

pub use api::{preview, run};
pub use cancel::check_cancelled;
pub use data::{ExportedData, MigrationAction, MigrationPreview, MigrationResource, DISPLAY_ORDER};
pub use error::EngineError;
pub use id_map::IdMap;
pub use importer::ImportOptions;
pub use preview_store::PreviewStore;
