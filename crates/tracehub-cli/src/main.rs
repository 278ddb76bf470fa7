// tracehub-cli/src/main.rs
// ============================================================================
// Module: TraceHub CLI
// Description: Operator binary for the Compliance & Shipment Engine.
// Purpose: Serve the engine, emit artifacts, and run maintenance sweeps.
// Dependencies: clap, tokio, tracehub-api, tracehub-config
// ============================================================================

//! ## Overview
//! `tracehub` wires the configured drivers into the engine: `serve` runs the
//! HTTP surface plus the background workers, `openapi` and `config-example`
//! emit the generated artifacts, `audit-pack` assembles an archive offline,
//! and `sweep` runs one expiry sweep iteration.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use clap::Subcommand;
use tokio::sync::watch;
use tracehub_api::AppState;
use tracehub_api::NotificationBus;
use tracehub_api::RateLimiter;
use tracehub_api::TenantSettingsCache;
use tracehub_api::TokenVerifier;
use tracehub_api::bus::run_email_dispatcher;
use tracehub_api::bus::run_expiry_sweeper;
use tracehub_api::openapi::openapi_document;
use tracehub_api::serve;
use tracehub_config::StorageDriver;
use tracehub_config::TracehubConfig;
use tracehub_config::config_toml_example;
use tracehub_core::ComplianceMatrix;
use tracehub_core::StderrAuditSink;
use tracehub_core::interfaces::BlobStore;
use tracehub_core::interfaces::DocumentClassifier;
use tracehub_core::interfaces::SystemClock;
use tracehub_providers::HttpCarrierClient;
use tracehub_providers::HttpCarrierPolicy;
use tracehub_providers::HttpClassifier;
use tracehub_providers::KeywordClassifier;
use tracehub_providers::LocalBlobStore;
use tracehub_providers::LogMailer;
use tracehub_providers::S3BlobStore;
use tracehub_store_sqlite::SqliteDataStore;
use tracehub_store_sqlite::SqliteStoreConfig;
use tracehub_tracking::Ingestor;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Classifier call deadline.
const CLASSIFIER_DEADLINE: Duration = Duration::from_secs(20);

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// TraceHub Compliance & Shipment Engine.
#[derive(Debug, Parser)]
#[command(name = "tracehub", version, about)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API and background workers.
    Serve {
        /// Path to tracehub.toml.
        #[arg(long, default_value = "tracehub.toml")]
        config: PathBuf,
        /// Listen address.
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: SocketAddr,
    },
    /// Emit the generated OpenAPI document.
    Openapi,
    /// Emit the canonical example configuration.
    ConfigExample,
    /// Assemble a shipment audit pack offline.
    AuditPack {
        /// Path to tracehub.toml.
        #[arg(long, default_value = "tracehub.toml")]
        config: PathBuf,
        /// Shipment identifier.
        #[arg(long)]
        shipment_id: u64,
        /// Output path for the archive.
        #[arg(long)]
        out: PathBuf,
    },
    /// Run one document-expiry and archive-quiescence sweep.
    Sweep {
        /// Path to tracehub.toml.
        #[arg(long, default_value = "tracehub.toml")]
        config: PathBuf,
    },
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Top-level CLI errors.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Configuration loading failed.
    #[error("config error: {0}")]
    Config(String),
    /// Store or driver initialization failed.
    #[error("init error: {0}")]
    Init(String),
    /// Command execution failed.
    #[error("command error: {0}")]
    Run(String),
}

// ============================================================================
// SECTION: Config Loading
// ============================================================================

/// Loads the config file and applies environment overrides.
fn load_config(path: &PathBuf) -> Result<TracehubConfig, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|err| CliError::Config(format!("{}: {err}", path.display())))?;
    TracehubConfig::from_toml_str(&raw)
        .map_err(|err| CliError::Config(err.to_string()))?
        .apply_env(|name| std::env::var(name).ok())
        .map_err(|err| CliError::Config(err.to_string()))
}

/// Builds the shared application state from configuration.
async fn build_state(config: &TracehubConfig) -> Result<Arc<AppState>, CliError> {
    let store = Arc::new(
        SqliteDataStore::open(
            &SqliteStoreConfig::new(&config.database.url)
                .with_statement_deadline_ms(config.database.deadline_ms),
        )
        .map_err(|err| CliError::Init(err.to_string()))?,
    );
    let blob_deadline = Duration::from_millis(config.storage.deadline_ms);
    let blob: Arc<dyn BlobStore> = match config.storage.driver {
        StorageDriver::Local => {
            let root = config.storage.local_root.clone().unwrap_or_else(|| "./blobs".to_string());
            Arc::new(LocalBlobStore::new(root).with_deadline(blob_deadline))
        }
        StorageDriver::S3 => Arc::new(
            S3BlobStore::from_env(&config.storage.bucket_prefix)
                .await
                .with_deadline(blob_deadline),
        ),
    };
    let classifier: Arc<dyn DocumentClassifier> = if config.classifier.base_url.trim().is_empty() {
        Arc::new(KeywordClassifier)
    } else {
        Arc::new(
            HttpClassifier::new(
                &config.classifier.base_url,
                &config.classifier.api_key,
                CLASSIFIER_DEADLINE,
            )
            .map_err(|err| CliError::Init(err.to_string()))?,
        )
    };
    Ok(Arc::new(AppState {
        store,
        blob,
        classifier,
        mailer: Arc::new(LogMailer),
        clock: Arc::new(SystemClock),
        matrix: Arc::new(ComplianceMatrix::builtin()),
        verifier: TokenVerifier::new(&config.auth.verifier_key),
        audit: Arc::new(StderrAuditSink),
        limiter: RateLimiter::new(120, 600),
        bus: Arc::new(NotificationBus::new()),
        settings_cache: Arc::new(TenantSettingsCache::new()),
        bucket_prefix: config.storage.bucket_prefix.clone(),
    }))
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Runs the serve command until interrupted.
async fn run_serve(config: TracehubConfig, listen: SocketAddr) -> Result<(), CliError> {
    let state = build_state(&config).await?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let carrier = HttpCarrierClient::new(
        &config.carrier.base_url,
        &config.carrier.api_key,
        Duration::from_millis(config.carrier.deadline_ms),
        HttpCarrierPolicy::new(),
    )
    .map_err(|err| CliError::Init(err.to_string()))?;
    let ingestor = Arc::new(Ingestor::new(
        Arc::clone(&state.store),
        Arc::new(carrier),
        Arc::clone(&state.bus) as Arc<dyn tracehub_core::interfaces::Notifier>,
        Arc::clone(&state.clock),
        Arc::clone(&state.matrix),
        config.poll_intervals.clone(),
        config.workers.clone(),
    ));

    let mut workers = Vec::new();
    workers.push(tokio::spawn(Arc::clone(&ingestor).run(shutdown_rx.clone())));
    workers.push(tokio::spawn(run_email_dispatcher(
        Arc::clone(&state.store),
        Arc::clone(&state.mailer),
        Arc::clone(&state.clock),
        shutdown_rx.clone(),
    )));
    workers.push(tokio::spawn(run_expiry_sweeper(
        Arc::clone(&state.store),
        Arc::clone(&state.bus),
        Arc::clone(&state.settings_cache),
        Arc::clone(&state.clock),
        shutdown_rx.clone(),
    )));

    let server = tokio::spawn(serve(Arc::clone(&state), listen, shutdown_rx));

    tokio::signal::ctrl_c().await.map_err(|err| CliError::Run(err.to_string()))?;
    let _ = shutdown_tx.send(true);

    for worker in workers {
        let _ = worker.await;
    }
    match server.await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(CliError::Run(err.to_string())),
        Err(err) => Err(CliError::Run(err.to_string())),
    }
}

/// Assembles an audit pack offline and writes it to disk.
async fn run_audit_pack(
    config: TracehubConfig,
    shipment_id: u64,
    out: PathBuf,
) -> Result<(), CliError> {
    use tracehub_core::ShipmentId;
    use tracehub_core::eudr_applicable;
    use tracehub_core::interfaces::BlobKey;
    use tracehub_store_sqlite::SessionScope;

    let state = build_state(&config).await?;
    let shipment_id = ShipmentId::from_raw(shipment_id)
        .ok_or_else(|| CliError::Run("invalid shipment id".to_string()))?;
    let session = state.store.session(SessionScope::worker());

    let shipment = session.get_shipment(shipment_id).map_err(|err| CliError::Run(err.to_string()))?;
    let organization = session
        .get_organization(shipment.organization_id)
        .map_err(|err| CliError::Run(err.to_string()))?;
    let buyer = shipment
        .buyer_organization_id
        .and_then(|buyer_id| session.get_organization(buyer_id).ok());
    let products = session
        .products_for_shipment(shipment_id)
        .map_err(|err| CliError::Run(err.to_string()))?;
    let origins = session
        .origins_for_shipment(shipment_id)
        .map_err(|err| CliError::Run(err.to_string()))?;
    let events = session
        .events_for_shipment(shipment_id)
        .map_err(|err| CliError::Run(err.to_string()))?;
    let primaries = session
        .primary_documents(shipment_id)
        .map_err(|err| CliError::Run(err.to_string()))?;

    let mut documents = Vec::with_capacity(primaries.len());
    for document in primaries {
        let Some(org) = document.organization_id else {
            continue;
        };
        let key = BlobKey {
            bucket: format!("{}-documents", state.bucket_prefix),
            org_id: org,
            resource_id: document.shipment_id.to_string(),
            filename: document.file_name.clone(),
        };
        let bytes = state
            .blob
            .get(org, &key)
            .await
            .map_err(|err| CliError::Run(err.to_string()))?;
        documents.push(tracehub_auditpack::DocumentEntry { document, bytes });
    }

    let eudr = products.iter().any(|product| eudr_applicable(&product.hs_code));
    let input = tracehub_auditpack::AuditPackInput {
        required_documents: state.matrix.required_documents(&shipment.product_type),
        eudr_applicable: eudr,
        decision: None,
        generated_at: state.clock.now(),
        organization,
        buyer,
        products,
        origins,
        documents,
        events,
        shipment,
    };
    let archive =
        tracehub_auditpack::assemble(&input).map_err(|err| CliError::Run(err.to_string()))?;
    std::fs::write(&out, archive).map_err(|err| CliError::Run(err.to_string()))?;
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "wrote {}", out.display());
    Ok(())
}

/// Runs one expiry sweep iteration.
async fn run_sweep(config: TracehubConfig) -> Result<(), CliError> {
    use tracehub_store_sqlite::SessionScope;

    let state = build_state(&config).await?;
    let session = state.store.session(SessionScope::worker());
    let expired = session
        .expire_documents(state.clock.now())
        .map_err(|err| CliError::Run(err.to_string()))?;
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "expired {} document(s)", expired.len());
    Ok(())
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Process entry point.
#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve { config, listen } => match load_config(&config) {
            Ok(config) => run_serve(config, listen).await,
            Err(err) => Err(err),
        },
        Command::Openapi => {
            let document = openapi_document();
            let mut stdout = io::stdout().lock();
            let rendered =
                serde_json::to_string_pretty(&document).unwrap_or_else(|_| "{}".to_string());
            let _ = writeln!(stdout, "{rendered}");
            Ok(())
        }
        Command::ConfigExample => {
            let mut stdout = io::stdout().lock();
            let _ = writeln!(stdout, "{}", config_toml_example());
            Ok(())
        }
        Command::AuditPack {
            config,
            shipment_id,
            out,
        } => match load_config(&config) {
            Ok(config) => run_audit_pack(config, shipment_id, out).await,
            Err(err) => Err(err),
        },
        Command::Sweep { config } => match load_config(&config) {
            Ok(config) => run_sweep(config).await,
            Err(err) => Err(err),
        },
    };
    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            let mut stderr = io::stderr().lock();
            let _ = writeln!(stderr, "tracehub: {err}");
            std::process::ExitCode::FAILURE
        }
    }
}
