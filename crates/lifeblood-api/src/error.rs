//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the same shape as a success body:
//! `{"result": "<message>"}`.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use lifeblood_core::store::StoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// Input that failed domain validation; the message is shown as is.
  #[error(transparent)]
  Invalid(lifeblood_core::Error),

  #[error("Invalid username or password")]
  InvalidCredential,

  #[error("not signed in")]
  Unauthenticated,

  #[error("staff only")]
  Forbidden,

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  Conflict(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("session error: {0}")]
  Session(String),

  #[error("credential error: {0}")]
  Credential(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Convert a backend error, surfacing its domain cause when it has one.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.as_core() {
      Some(core) => Self::from(core.clone()),
      None => Self::Store(Box::new(e)),
    }
  }
}

impl From<lifeblood_core::Error> for ApiError {
  fn from(e: lifeblood_core::Error) -> Self {
    use lifeblood_core::Error as Core;

    if e.is_validation() {
      return Self::Invalid(e);
    }
    match &e {
      Core::UsernameTaken(_) => Self::Conflict(e.to_string()),
      _ => Self::NotFound(e.to_string()),
    }
  }
}

impl From<tower_sessions::session::Error> for ApiError {
  fn from(e: tower_sessions::session::Error) -> Self { Self::Session(e.to_string()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Invalid(e) => (StatusCode::BAD_REQUEST, e.to_string()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::InvalidCredential | ApiError::Unauthenticated => {
        (StatusCode::UNAUTHORIZED, self.to_string())
      }
      ApiError::Forbidden => (StatusCode::FORBIDDEN, self.to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Session(_) | ApiError::Credential(_) | ApiError::Store(_) => {
        // Internal detail goes to the log, not to the client.
        tracing::error!(error = %self, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "failure".to_owned())
      }
    };
    (status, Json(json!({ "result": message }))).into_response()
  }
}
