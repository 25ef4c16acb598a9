//! Process wiring for the Lifeblood server: configuration and the top-level
//! router.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use lifeblood_api::{AppState, Argon2Verifier, SessionSettings, api_router};
use lifeblood_core::store::BloodBankStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime configuration, deserialised from `config.toml` and `LIFEBLOOD_*`
/// environment variables. Every key has a default.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                 String,
  pub port:                 u16,
  pub store_path:           PathBuf,
  pub session_idle_minutes: i64,
  pub secure_cookies:       bool,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                 "127.0.0.1".to_string(),
      port:                 6969,
      store_path:           PathBuf::from("lifeblood.db"),
      session_idle_minutes: 60,
      secure_cookies:       false,
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn sessions(&self) -> SessionSettings {
    SessionSettings {
      idle_timeout: time::Duration::minutes(self.session_idle_minutes.max(1)),
      secure:       self.secure_cookies,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Application ──────────────────────────────────────────────────────────────

/// The API router over `store`, with per-request tracing.
pub fn app<S>(store: S, config: &ServerConfig) -> Router
where
  S: BloodBankStore + 'static,
{
  let state = AppState {
    store:    Arc::new(store),
    verifier: Arc::new(Argon2Verifier::default()),
  };
  api_router(state, config.sessions()).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn from_toml(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_gives_defaults() {
    let cfg = from_toml("");
    assert_eq!(cfg, ServerConfig::default());
    assert_eq!(cfg.address(), "127.0.0.1:6969");
    assert_eq!(cfg.sessions().idle_timeout, time::Duration::hours(1));
  }

  #[test]
  fn file_values_override_defaults() {
    let cfg = from_toml(
      "port = 8080\nstore_path = \"/var/lib/lifeblood.db\"\nsecure_cookies = true\n",
    );
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/lifeblood.db"));
    assert!(cfg.sessions().secure);
  }

  #[test]
  fn tilde_is_expanded_only_at_the_start() {
    let plain = Path::new("data/~/x.db");
    assert_eq!(expand_tilde(plain), plain.to_path_buf());

    if let Ok(home) = std::env::var("HOME") {
      assert_eq!(
        expand_tilde(Path::new("~/x.db")),
        PathBuf::from(home).join("x.db")
      );
    }
  }
}
