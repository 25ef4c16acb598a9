//! Sign-in and sign-out.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/validate` | Body: `{"username","password"}`; result is the account type |
//! | `POST` | `/logout` | Always succeeds |

use std::sync::Arc;

use axum::{Json, extract::State};
use lifeblood_core::{identity::Identity, store::BloodBankStore};
use serde::Deserialize;
use serde_json::Value;
use tower_sessions::Session;

use crate::{
  AppState, credential, error::ApiError, payload::Payload, reply, session,
  success,
};

#[derive(Debug, Deserialize)]
pub struct Login {
  pub username: String,
  pub password: String,
}

/// `POST /validate`: check a username/password pair and start a session.
///
/// An unknown username and a wrong password are indistinguishable to the
/// caller.
pub async fn validate<S>(
  State(state): State<AppState<S>>,
  session: Session,
  Payload(body): Payload<Login>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let found = state
    .store
    .find_credential(&body.username)
    .await
    .map_err(ApiError::store)?;

  let verified = match &found {
    Some(c) => {
      credential::verify_password(
        Arc::clone(&state.verifier),
        body.password,
        c.password_hash.clone(),
      )
      .await?
    }
    None => false,
  };

  let Some(credential) = found.filter(|_| verified) else {
    tracing::warn!(username = %body.username, "rejected sign-in");
    return Err(ApiError::InvalidCredential);
  };

  let identity = Identity::from(credential);
  session::sign_in(&session, identity.person_id).await?;
  tracing::info!(person_id = identity.person_id, "signed in");

  Ok(reply(identity.account_type))
}

/// `POST /logout`
pub async fn logout(session: Session) -> Result<Json<Value>, ApiError> {
  session::sign_out(&session).await?;
  Ok(success())
}
