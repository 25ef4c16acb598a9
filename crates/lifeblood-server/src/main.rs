//! lifeblood server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and serves the JSON API over HTTP.
//!
//! # First staff account
//!
//! Register through `/addUser`, then promote that email and exit:
//!
//! ```text
//! cargo run -p lifeblood-server --bin server -- --promote-staff admin@example.com
//! ```

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use lifeblood_core::{person::AccountType, store::BloodBankStore};
use lifeblood_server::{ServerConfig, app, expand_tilde};
use lifeblood_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lifeblood blood bank server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Give the account registered under this email staff rights and exit.
  #[arg(long, value_name = "EMAIL")]
  promote_staff: Option<String>,
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

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LIFEBLOOD"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: promote and exit.
  if let Some(email) = cli.promote_staff {
    let found = store
      .set_account_type(&email, AccountType::Staff)
      .await
      .context("failed to update account type")?;
    anyhow::ensure!(found, "no account registered for {email}");
    tracing::info!(%email, "promoted to staff");
    return Ok(());
  }

  let address = server_cfg.address();
  let app = app(store, &server_cfg);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
