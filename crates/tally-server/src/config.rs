//! Server configuration, read from TOML and `TALLY_*` environment variables.

use std::path::PathBuf;

use serde::Deserialize;
use tally_core::{retirement::DEFAULT_RETIREMENT_THRESHOLD, store::DEFAULT_PAGE_SIZE};

/// Every field has a default, so an absent config file yields a runnable server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                 String,
  #[serde(default = "default_port")]
  pub port:                 u16,
  #[serde(default = "default_store_path")]
  pub store_path:           PathBuf,
  /// Initiatives whose count drops strictly below this are retired.
  #[serde(default = "default_threshold")]
  pub retirement_threshold: i64,
  #[serde(default = "default_page_size")]
  pub page_size:            u32,
  /// Account created with administrator rights at startup if it does not
  /// exist yet. Both fields must be set for bootstrap to run.
  #[serde(default)]
  pub admin_username:       Option<String>,
  #[serde(default)]
  pub admin_password_hash:  Option<String>,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/tally/tally.db") }

fn default_threshold() -> i64 { DEFAULT_RETIREMENT_THRESHOLD }

fn default_page_size() -> u32 { DEFAULT_PAGE_SIZE }

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// The bootstrap administrator, when fully configured.
  pub fn bootstrap_admin(&self) -> Option<(&str, &str)> {
    match (&self.admin_username, &self.admin_password_hash) {
      (Some(name), Some(hash)) if !name.trim().is_empty() => Some((name.as_str(), hash.as_str())),
      _ => None,
    }
  }
}
