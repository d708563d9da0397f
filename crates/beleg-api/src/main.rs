//! beleg-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! receipt store, constructs the OCR and ledger clients, and serves the JSON
//! API over HTTP.

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use beleg_api::{AppState, ServerConfig};
use beleg_clients::{
  DiskUploadStore, HttpLedgerClient, HttpOcrClient, LedgerConfig, OcrConfig,
};
use beleg_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Beleg receipt booking server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("BELEG"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Open the receipt store.
  let store = SqliteStore::open(&server_cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;

  // Construct the external-service clients from immutable config values.
  let ocr = HttpOcrClient::new(OcrConfig {
    api_base: server_cfg.ocr_api_base.clone(),
  })
  .context("failed to build OCR client")?;

  let ledger = HttpLedgerClient::new(LedgerConfig {
    api_base: server_cfg.ledger_api_base.clone(),
    api_key:  server_cfg.ledger_api_key.clone(),
  })
  .context("failed to build ledger client")?;

  let uploads = DiskUploadStore::new(&server_cfg.uploads_path);

  let state = AppState {
    store:   Arc::new(store),
    ocr:     Arc::new(ocr),
    ledger:  Arc::new(ledger),
    uploads: Arc::new(uploads),
  };

  let app = beleg_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
