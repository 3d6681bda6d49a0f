use crate::data::{ExportedData, MigrationPreview};
use crate::error::EngineError;
use crate::importer::{self, ImportOptions};
use crate::{exporter, preflight};
use convoy_common::Connection;
use convoy_http::HttpClient;
use convoy_registry::Registry;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Export the source, then classify every exported entity against the
/// destination. The two call-shapes `preview(src, dst, log)` names are
/// fused here because preflight needs the exported graph to classify
/// against — callers that only want the export can ignore the preview half.
pub async fn preview(
    src_client: &HttpClient,
    src_registry: &Registry,
    dst_client: &HttpClient,
    dst_registry: &Registry,
    src_conn: &Connection,
    dst_conn: &Connection,
    log: &dyn Fn(&str),
) -> Result<(MigrationPreview, ExportedData), EngineError> {
    log("=== Exporting source ===");
    let data = exporter::export(src_client, src_registry, log).await?;

    log("=== Classifying against destination ===");
    let migration_preview = preflight::preflight(
        dst_client,
        dst_registry,
        &data,
        src_conn.host.clone(),
        dst_conn.host.clone(),
    )
    .await?;

    for warning in &migration_preview.warnings {
        log(&format!("  WARNING: {warning}"));
    }

    Ok((migration_preview, data))
}

/// Run the import against the destination using a previously computed
/// preview and export graph.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    dst_client: &HttpClient,
    dst_registry: &Registry,
    data: &ExportedData,
    migration_preview: &MigrationPreview,
    exclude: std::collections::HashMap<String, std::collections::HashSet<String>>,
    dst_is_flavor_b: bool,
    sync_poll_interval: Duration,
    sync_deadline: Duration,
    cancel: &AtomicBool,
    log: &dyn Fn(&str),
) -> Result<(), EngineError> {
    let options = ImportOptions {
        exclude,
        wait_for_project_sync: dst_is_flavor_b,
        sync_poll_interval,
        sync_deadline,
    };

    importer::run(dst_client, dst_registry, data, migration_preview, &options, cancel, log).await
}
