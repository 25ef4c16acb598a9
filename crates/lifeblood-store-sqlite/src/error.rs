//! Error type for `lifeblood-store-sqlite`.

use lifeblood_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] lifeblood_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored value that does not decode into its domain type.
  #[error("corrupt row: {0}")]
  Decode(String),
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&lifeblood_core::Error> {
    match self {
      Error::Core(e) => Some(e),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
