//! tally server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `TALLY_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `admin_password_hash`:
//!
//! ```
//! cargo run -p tally-server -- --hash-password
//! ```

mod config;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tally_api::{ApiState, auth::hash_password};
use tally_core::{retirement::RetirementPolicy, store::InitiativeStore, user::NewUser};
use tally_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::config::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "Tally initiatives server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
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
    let password = read_password()?;
    let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = ::config::Config::builder()
    .add_source(::config::File::from(cli.config).required(false))
    .add_source(::config::Environment::with_prefix("TALLY"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  let policy = RetirementPolicy::new(server_cfg.retirement_threshold);
  let store = SqliteStore::open_with_policy(&store_path, policy)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let store = Arc::new(store);

  bootstrap_admin(store.as_ref(), &server_cfg).await?;

  let app = tally_api::api_router(ApiState::new(store, server_cfg.page_size))
    .layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!(
    threshold = server_cfg.retirement_threshold,
    "Listening on http://{address}"
  );
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Create the configured administrator if no account with that name exists.
/// An existing account is left untouched.
async fn bootstrap_admin<S>(store: &S, cfg: &ServerConfig) -> anyhow::Result<()>
where
  S: InitiativeStore,
{
  let Some((username, hash)) = cfg.bootstrap_admin() else {
    return Ok(());
  };

  if store
    .find_user_by_username(username)
    .await
    .context("failed to look up bootstrap admin")?
    .is_some()
  {
    tracing::debug!(%username, "bootstrap admin already present");
    return Ok(());
  }

  let input = NewUser { is_admin: true, ..NewUser::new(username, hash) };
  let user = store
    .register_user(input)
    .await
    .context("failed to create bootstrap admin")?;
  tracing::info!(user_id = %user.user_id, %username, "created bootstrap admin");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
