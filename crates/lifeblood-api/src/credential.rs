//! Password hashing and verification.
//!
//! Handlers only see the [`CredentialVerifier`] trait; the stored form is an
//! argon2 PHC string. Handlers go through [`hash_password`] and
//! [`verify_password`], which keep argon2 off the async worker threads.

use std::sync::Arc;

use argon2::{
  Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier,
  Version, password_hash::SaltString,
};
use rand_core::OsRng;

use crate::error::ApiError;

pub trait CredentialVerifier: Send + Sync {
  /// Hash `password` into a self-describing string suitable for storage.
  fn hash(&self, password: &str) -> Result<String, ApiError>;

  /// `true` if `password` matches `hash`. Unparseable hashes never match.
  fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2id with a fresh random salt per hash.
#[derive(Default, Clone)]
pub struct Argon2Verifier {
  argon2: Argon2<'static>,
}

impl Argon2Verifier {
  /// Use explicit cost parameters for new hashes. Verification always uses
  /// the parameters recorded in the stored hash.
  pub fn with_params(params: Params) -> Self {
    Self { argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params) }
  }
}

impl CredentialVerifier for Argon2Verifier {
  fn hash(&self, password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    self
      .argon2
      .hash_password(password.as_bytes(), &salt)
      .map(|h| h.to_string())
      .map_err(|e| ApiError::Credential(e.to_string()))
  }

  fn verify(&self, password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
      return false;
    };
    self.argon2.verify_password(password.as_bytes(), &parsed).is_ok()
  }
}

/// [`CredentialVerifier::hash`] on the blocking thread pool.
pub async fn hash_password(
  verifier: Arc<dyn CredentialVerifier>,
  password: String,
) -> Result<String, ApiError> {
  tokio::task::spawn_blocking(move || verifier.hash(&password))
    .await
    .map_err(|e| ApiError::Credential(e.to_string()))?
}

/// [`CredentialVerifier::verify`] on the blocking thread pool.
pub async fn verify_password(
  verifier: Arc<dyn CredentialVerifier>,
  password: String,
  hash: String,
) -> Result<bool, ApiError> {
  tokio::task::spawn_blocking(move || verifier.verify(&password, &hash))
    .await
    .map_err(|e| ApiError::Credential(e.to_string()))
}
