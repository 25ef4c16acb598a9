//! The signed-in person, kept in a server-side session.
//!
//! The session holds only the person id. Handlers that act on behalf of the
//! caller take [`CurrentIdentity`] (or [`StaffIdentity`]) as an extractor,
//! which reloads the identity from the store on every request: removing a
//! person ends their sessions, and role changes apply to the next request.

use axum::{extract::FromRequestParts, http::request::Parts};
use lifeblood_core::{PersonId, identity::Identity, store::BloodBankStore};
use tower_sessions::Session;

use crate::{AppState, error::ApiError};

const PERSON_KEY: &str = "person_id";

/// Bind `person_id` to a fresh session id.
pub async fn sign_in(session: &Session, person_id: PersonId) -> Result<(), ApiError> {
  session.cycle_id().await?;
  session.insert(PERSON_KEY, person_id).await?;
  Ok(())
}

pub async fn sign_out(session: &Session) -> Result<(), ApiError> {
  session.flush().await?;
  Ok(())
}

async fn identity_from_parts<S>(
  parts: &mut Parts,
  state: &AppState<S>,
) -> Result<Identity, ApiError>
where
  S: BloodBankStore,
{
  let session = Session::from_request_parts(parts, state)
    .await
    .map_err(|(_, msg)| ApiError::Session(msg.to_owned()))?;

  let person_id = session
    .get::<PersonId>(PERSON_KEY)
    .await?
    .ok_or(ApiError::Unauthenticated)?;

  match state.store.identity(person_id).await.map_err(ApiError::store)? {
    Some(identity) => Ok(identity),
    None => {
      tracing::info!(person_id, "ending session of removed person");
      sign_out(&session).await?;
      Err(ApiError::Unauthenticated)
    }
  }
}

/// Any signed-in caller.
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<AppState<S>> for CurrentIdentity
where
  S: BloodBankStore,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    identity_from_parts(parts, state).await.map(Self)
  }
}

/// A signed-in staff member; regular users get `403`.
pub struct StaffIdentity(pub Identity);

impl<S> FromRequestParts<AppState<S>> for StaffIdentity
where
  S: BloodBankStore,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let identity = identity_from_parts(parts, state).await?;
    if !identity.is_staff() {
      return Err(ApiError::Forbidden);
    }
    Ok(Self(identity))
  }
}
