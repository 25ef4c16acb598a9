//! JSON HTTP API for Lifeblood.
//!
//! Exposes an axum [`Router`] backed by any
//! [`lifeblood_core::store::BloodBankStore`]. Every response body is an
//! object with a `result` key. TLS and request tracing are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = lifeblood_api::api_router(state, SessionSettings::default());
//! ```

pub mod auth;
pub mod credential;
pub mod donations;
pub mod drives;
pub mod error;
pub mod payload;
pub mod persons;
pub mod reports;
pub mod session;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use lifeblood_core::store::BloodBankStore;
use serde::Serialize;
use serde_json::{Value, json};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

pub use credential::{Argon2Verifier, CredentialVerifier};
pub use error::ApiError;

// ─── State ────────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub verifier: Arc<dyn CredentialVerifier>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      verifier: Arc::clone(&self.verifier),
    }
  }
}

/// Cookie and expiry settings for the session layer.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
  /// Sessions end after this long without a request.
  pub idle_timeout: time::Duration,
  /// Only send the cookie over HTTPS.
  pub secure:       bool,
}

impl Default for SessionSettings {
  fn default() -> Self {
    Self { idle_timeout: time::Duration::hours(1), secure: false }
  }
}

// ─── Replies ──────────────────────────────────────────────────────────────────

/// `{"result": value}`
pub fn reply<T: Serialize>(value: T) -> Json<Value> { Json(json!({ "result": value })) }

/// `{"result": "success"}`
pub fn success() -> Json<Value> { reply("success") }

/// `{"result": "success", "<key>": id}` for endpoints that allocate an id.
pub fn created(key: &str, id: i64) -> Json<Value> {
  Json(json!({ "result": "success", key: id }))
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full API router for `state`, including its session layer.
///
/// Sessions live in process memory and do not survive a restart.
pub fn api_router<S>(state: AppState<S>, sessions: SessionSettings) -> Router
where
  S: BloodBankStore + 'static,
{
  let session_layer = SessionManagerLayer::new(MemoryStore::default())
    .with_secure(sessions.secure)
    .with_expiry(Expiry::OnInactivity(sessions.idle_timeout));

  Router::new()
    // Identity
    .route("/validate", post(auth::validate::<S>))
    .route("/logout", post(auth::logout))
    // Person registry
    .route("/addUser", post(persons::register::<S>))
    .route("/users", get(persons::list::<S>))
    .route(
      "/users/{id}",
      get(persons::get_one::<S>)
        .put(persons::update_one::<S>)
        .delete(persons::remove_one::<S>),
    )
    .route("/me", get(persons::me::<S>).put(persons::update_me::<S>))
    // Drives, requests, history
    .route("/drives", get(drives::list::<S>).post(drives::create::<S>))
    .route("/requests", post(drives::request_blood::<S>))
    .route("/history", get(drives::history::<S>))
    // Staff bookkeeping
    .route("/donations", post(donations::record::<S>))
    .route("/bags/{id}/allocate", post(donations::allocate::<S>))
    .route("/payments", post(donations::pay::<S>))
    // Reports
    .route("/reports/recent", get(reports::recent::<S>))
    .route("/reports/blood-types", get(reports::by_blood_type::<S>))
    .route("/reports/events", get(reports::by_event::<S>))
    .route("/reports/payments", get(reports::payments::<S>))
    .layer(session_layer)
    .with_state(state)
}
