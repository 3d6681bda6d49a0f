//! Local driver for the preview/run call-shapes. Reads connection details
//! from the environment, prints the log sink to stdout, and does not
//! persist connections, serve HTTP, or implement the populate/cleanup/
//! export-to-disk paths — those stay with the host application.

mod connection_env;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use connection_env::connection_from_env;
use convoy_common::{Config, Connection, Flavor};
use convoy_engine::PreviewStore;
use convoy_http::HttpClient;
use convoy_jobs::JobStore;
use convoy_registry::Registry;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::AtomicBool;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "convoy", about = "Local driver for the migration preview/run call-shapes")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Export the source and classify it against the destination; print
    /// the counts and warnings.
    Preview,
    /// Preview, then import into the destination.
    Run {
        /// Exclude one named item from migration, e.g. `--exclude job_templates=Deploy`.
        /// May be repeated.
        #[arg(long = "exclude", value_name = "KIND=NAME")]
        exclude: Vec<String>,
    },
}

fn parse_exclude(raw: &[String]) -> Result<HashMap<String, HashSet<String>>> {
    let mut exclude: HashMap<String, HashSet<String>> = HashMap::new();
    for entry in raw {
        let (kind, name) = entry
            .split_once('=')
            .with_context(|| format!("--exclude expects KIND=NAME, got \"{entry}\""))?;
        exclude.entry(kind.to_string()).or_default().insert(name.to_string());
    }
    Ok(exclude)
}

async fn resolve_registry(
    client: &HttpClient,
    connection: &Connection,
) -> Registry {
    let base = convoy_registry::build(connection.flavor);
    let discovery = convoy_discovery::probe(client, connection).await;
    info!(version = %discovery.version, prefix = %discovery.prefix, "discovery complete");
    convoy_discovery::rewrite_if_needed(connection.flavor, &base, &discovery).unwrap_or(base)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("convoy=info".parse()?))
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let src_conn = connection_from_env("SRC")?;
    let dst_conn = connection_from_env("DST")?;

    let src_client = HttpClient::new(&src_conn, config.http_timeout)?;
    let dst_client = HttpClient::new(&dst_conn, config.http_timeout)?;

    let src_registry = resolve_registry(&src_client, &src_conn).await;
    let dst_registry = resolve_registry(&dst_client, &dst_conn).await;

    let jobs = JobStore::new();
    let preview_job = jobs.create("preview", &dst_conn.host);
    let preview_job_for_log = preview_job.clone();
    let log = move |line: &str| {
        println!("{line}");
        preview_job_for_log.append_log(line);
    };

    let (migration_preview, exported) = convoy_engine::preview(
        &src_client,
        &src_registry,
        &dst_client,
        &dst_registry,
        &src_conn,
        &dst_conn,
        &log,
    )
    .await
    .context("preview failed")?;

    for (kind, items) in &migration_preview.resources {
        let to_create = items
            .iter()
            .filter(|r| r.action == convoy_engine::MigrationAction::Create)
            .count();
        println!("{kind}: {} total, {to_create} to create", items.len());
    }
    preview_job.complete(chrono::Utc::now());

    if let Command::Run { exclude } = cli.command {
        let exclude = parse_exclude(&exclude)?;

        let store = PreviewStore::new();
        store.put(preview_job.id, exported, migration_preview);
        let (exported, migration_preview) = store
            .take(preview_job.id)
            .context("preview data missing from the preview store")?;

        let run_job = jobs.create("run", &dst_conn.host);
        let run_job_for_log = run_job.clone();
        let run_log = move |line: &str| {
            println!("{line}");
            run_job_for_log.append_log(line);
        };

        let cancel = AtomicBool::new(false);
        let dst_is_flavor_b = dst_conn.flavor == Flavor::FlavorB;

        let result = convoy_engine::run(
            &dst_client,
            &dst_registry,
            &exported,
            &migration_preview,
            exclude,
            dst_is_flavor_b,
            config.project_sync_poll_interval,
            config.project_sync_deadline,
            &cancel,
            &run_log,
        )
        .await;

        match result {
            Ok(()) => run_job.complete(chrono::Utc::now()),
            Err(e) => run_job.fail(e.to_string(), chrono::Utc::now()),
        }

        result.context("migration run failed")?;
    }

    Ok(())
}
