//! ccrm-tools - maintenance commands for the call-center CRM

use anyhow::{Context, Result};
use ccrm_common::config::{load_toml_config, RootFolderInitializer, RootFolderResolver, TomlConfig};
use ccrm_common::logging::init_tracing;
use ccrm_common::models::NewCallCenter;
use ccrm_common::store::collections;
use ccrm_common::DocumentStore;
use ccrm_tools::push::{chunk_bodies, ImportClient, DEFAULT_CHUNK_SIZE};
use ccrm_tools::staging::{self, ImportBody, CLEANED_FILE, IMPORT_READY_FILE, SINGLE_FILE};
use ccrm_tools::{cleaning, maintenance};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ccrm-tools")]
#[command(about = "Data preparation and maintenance for the call-center CRM")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the TOML config file
    #[arg(short, long, global = true, env = "CCRM_CONFIG")]
    config: Option<PathBuf>,

    /// Folder holding the store files (store commands only)
    #[arg(short, long, global = true, env = "CCRM_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Store instance (store commands only)
    #[arg(long, global = true, env = "CCRM_PROJECT_ID")]
    project_id: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Normalise a raw JSON export into cleaned records
    Clean {
        input: PathBuf,
        #[arg(short, long, default_value = CLEANED_FILE)]
        out: PathBuf,
    },

    /// Wrap cleaned records as an import request body
    PrepareImport {
        #[arg(default_value = CLEANED_FILE)]
        input: PathBuf,
        #[arg(short, long, default_value = IMPORT_READY_FILE)]
        out: PathBuf,
    },

    /// Keep only the first record of an import body
    ExtractSingle {
        #[arg(default_value = IMPORT_READY_FILE)]
        input: PathBuf,
        #[arg(short, long, default_value = SINGLE_FILE)]
        out: PathBuf,
    },

    /// Send an import body to a running server in chunks
    Push {
        input: PathBuf,
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:5780", env = "CCRM_URL")]
        url: String,
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,
        /// Ask the server to skip likely duplicates
        #[arg(long)]
        skip_duplicates: bool,
    },

    /// Delete every document of a collection directly in the store
    DeleteAll {
        #[arg(long, default_value = collections::CALL_CENTERS)]
        collection: String,
    },

    /// Fold legacy phone/email fields into lists and fill missing tags
    Backfill,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_toml_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(project_id) = cli.project_id.clone() {
        config.store.project_id = project_id;
    }
    config.validate().context("Invalid configuration")?;
    let _log_guard = init_tracing(&config.logging).context("Failed to initialize logging")?;

    match cli.command {
        Command::Clean { input, out } => {
            let raw: Vec<Value> = staging::read_json(&input)?;
            let report = cleaning::clean_records(&raw);
            if report.unknown_status > 0 {
                warn!(count = report.unknown_status, "Records with unrecognised status set to New");
            }
            staging::write_json(&out, &report.records)?;
            info!(
                input = raw.len(),
                kept = report.records.len(),
                merged = report.merged,
                dropped = report.dropped,
                "Cleaned {} -> {}",
                input.display(),
                out.display()
            );
        }

        Command::PrepareImport { input, out } => {
            let records: Vec<NewCallCenter> = staging::read_json(&input)?;
            let body = staging::prepare_import(records);
            staging::write_json(&out, &body)?;
            info!(records = body.call_centers.len(), "Import body written to {}", out.display());
        }

        Command::ExtractSingle { input, out } => {
            let body: ImportBody = staging::read_json(&input)?;
            let single = staging::extract_single(&body)?;
            staging::write_json(&out, &single)?;
            info!("Single record written to {}", out.display());
        }

        Command::Push {
            input,
            url,
            chunk_size,
            skip_duplicates,
        } => {
            let body: ImportBody = staging::read_json(&input)?;
            let bodies = chunk_bodies(&body.call_centers, chunk_size, skip_duplicates || body.skip_duplicates)?;
            let client = ImportClient::new(&url)?;
            info!(
                records = body.call_centers.len(),
                chunks = bodies.len(),
                "Pushing to {}",
                client.import_url()
            );
            let summary = client.push(&bodies).await?;
            info!(
                imported = summary.imported,
                skipped = summary.skipped,
                chunks = summary.chunks,
                "Push complete"
            );
        }

        Command::DeleteAll { collection } => {
            let store = open_store(&cli.root_folder, &config).await?;
            let deleted = maintenance::delete_all(&store, &collection).await?;
            info!("Deleted {} documents from {}", deleted, collection);
        }

        Command::Backfill => {
            let store = open_store(&cli.root_folder, &config).await?;
            let report = maintenance::backfill(&store).await?;
            info!("Backfilled {} of {} call centers", report.updated, report.scanned);
        }
    }

    Ok(())
}

/// Open the same store file ccrm-api would use
async fn open_store(root_folder: &Option<PathBuf>, config: &TomlConfig) -> Result<DocumentStore> {
    let root = RootFolderResolver::new("ccrm-tools")
        .with_cli_arg(root_folder.clone())
        .with_config(config)
        .resolve();
    let initializer = RootFolderInitializer::new(root);
    let db_path = initializer.database_path(&config.store.project_id);
    if !db_path.exists() {
        anyhow::bail!("Store not found: {}", db_path.display());
    }
    info!("Store: {}", db_path.display());
    DocumentStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open {}", db_path.display()))
}
