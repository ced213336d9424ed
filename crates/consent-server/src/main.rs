//! consent-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, optionally seeds the cookie catalog, and serves
//! the consent API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for a `[[credentials]]` entry:
//!
//! ```
//! cargo run -p consent-server -- --hash-password
//! ```

use std::{io::BufRead as _, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use consent_server::{
  AppState, ServerConfig,
  auth::hash_password,
  seed::{self, CatalogSeed},
};
use consent_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cookie consent server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Add the categories and cookies in this TOML file to the catalog before
  /// serving. Categories that already exist by name are skipped.
  #[arg(long)]
  seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = prompt_password()?;
    let hash = hash_password(&password)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("invalid configuration in {:?}", cli.config))?;

  let store_path = with_home(server_cfg.store_path.clone());
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let state = AppState::new(Arc::new(store), &server_cfg);

  if let Some(path) = cli.seed {
    let catalog = CatalogSeed::load(&path)?;
    let added = seed::apply(&*state.api.resolver, catalog)
      .await
      .context("failed to seed catalog")?;
    tracing::info!(added, "seeded catalog from {path:?}");
  }

  if server_cfg.credentials.is_empty() {
    tracing::warn!("no credentials configured; admin routes are unreachable");
  }

  let app = consent_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Prompt on stderr so stdout carries only the hash.
fn prompt_password() -> anyhow::Result<String> {
  eprint!("Password: ");
  let mut line = String::new();
  std::io::stdin()
    .lock()
    .read_line(&mut line)
    .context("failed to read password")?;
  Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// `~/consent.db` → `$HOME/consent.db`.
fn with_home(path: PathBuf) -> PathBuf {
  if let (Ok(rest), Some(home)) =
    (path.strip_prefix("~"), std::env::var_os("HOME"))
  {
    return PathBuf::from(home).join(rest);
  }
  path
}
