//! Handlers for the person registry.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/addUser` | Body: [`RegisterBody`]; open to anyone |
//! | `GET`    | `/users` | Staff only |
//! | `GET`    | `/users/{id}` | Staff, or the person themselves |
//! | `PUT`    | `/users/{id}` | Body: [`UpdateBody`]; staff only |
//! | `DELETE` | `/users/{id}` | Staff only; unknown ids succeed |
//! | `GET`    | `/me` | The caller's own record |
//! | `PUT`    | `/me` | Body: [`UpdateBody`]; any `id` in the body is ignored |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use lifeblood_core::{
  PersonId, parse_date,
  person::{
    BloodType, Classification, NewPerson, PersonUpdate, Weight, parse_diseases,
  },
  store::BloodBankStore,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
  AppState, created,
  credential::{self, CredentialVerifier},
  error::ApiError,
  payload::{Payload, lenient, non_blank},
  reply,
  session::{CurrentIdentity, StaffIdentity},
  success,
};

// ─── Register ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub name:      String,
  pub address:   String,
  pub phone:     String,
  pub email:     String,
  pub dob:       String,
  pub bloodtype: String,
  #[serde(deserialize_with = "lenient")]
  pub weight:    i64,
  pub password:  String,
  /// `"donor"` or `"recipient"`.
  #[serde(rename = "type")]
  pub kind:      String,
  /// Comma-separated; may be empty.
  #[serde(default)]
  pub disease:   String,
}

impl RegisterBody {
  /// Validate every field, then hash the password. Nothing is hashed for a
  /// body that would be rejected anyway.
  pub async fn into_new_person(
    self,
    verifier: Arc<dyn CredentialVerifier>,
  ) -> Result<NewPerson, ApiError> {
    let blood_type = BloodType::parse(&self.bloodtype)?;
    let classification = Classification::parse(&self.kind)?;
    let weight = Weight::new(self.weight)?;
    let dob = parse_date(&self.dob)?;

    Ok(NewPerson {
      password_hash: credential::hash_password(verifier, self.password).await?,
      name: self.name,
      address: self.address,
      phone: self.phone,
      email: self.email,
      dob,
      blood_type,
      weight,
      classification,
      diseases: parse_diseases(&self.disease),
    })
  }
}

/// `POST /addUser`. Returns `{"result":"success","id":<id>}`.
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Payload(body): Payload<RegisterBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let person = body.into_new_person(Arc::clone(&state.verifier)).await?;
  let id = state.store.register(person).await.map_err(ApiError::store)?;
  tracing::info!(person_id = id, "registered person");
  Ok(created("id", id))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /users`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _staff: StaffIdentity,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let persons = state.store.list_persons().await.map_err(ApiError::store)?;
  Ok(reply(persons))
}

async fn lookup<S>(state: &AppState<S>, id: PersonId) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let record = state
    .store
    .get_person(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(reply(record))
}

/// `GET /users/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  CurrentIdentity(caller): CurrentIdentity,
  Path(id): Path<PersonId>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  if !caller.is_staff() && caller.person_id != id {
    return Err(ApiError::Forbidden);
  }
  lookup(&state, id).await
}

/// `GET /me`
pub async fn me<S>(
  State(state): State<AppState<S>>,
  CurrentIdentity(caller): CurrentIdentity,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  lookup(&state, caller.person_id).await
}

// ─── Update ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateBody {
  pub address:   String,
  pub email:     String,
  #[serde(deserialize_with = "lenient")]
  pub weight:    i64,
  /// Blank or absent keeps the current blood type.
  #[serde(default)]
  pub bloodtype: Option<String>,
  /// Blank or absent keeps the current classification.
  #[serde(default, rename = "type")]
  pub kind:      Option<String>,
  /// Replaces the whole disease history; empty clears it.
  #[serde(default)]
  pub disease:   String,
}

impl TryFrom<UpdateBody> for PersonUpdate {
  type Error = lifeblood_core::Error;

  fn try_from(b: UpdateBody) -> Result<Self, Self::Error> {
    Ok(PersonUpdate {
      blood_type:     non_blank(b.bloodtype)
        .map(|s| BloodType::parse(&s))
        .transpose()?,
      classification: non_blank(b.kind)
        .map(|s| Classification::parse(&s))
        .transpose()?,
      weight:         Weight::new(b.weight)?,
      address:        b.address,
      email:          b.email,
      diseases:       parse_diseases(&b.disease),
    })
  }
}

async fn apply_update<S>(
  state: &AppState<S>,
  id: PersonId,
  update: PersonUpdate,
) -> Result<(), ApiError>
where
  S: BloodBankStore,
{
  let found = state
    .store
    .update_person(id, update)
    .await
    .map_err(ApiError::store)?;
  if !found {
    return Err(ApiError::NotFound(format!("person {id} not found")));
  }
  Ok(())
}

/// `PUT /users/{id}`
pub async fn update_one<S>(
  State(state): State<AppState<S>>,
  StaffIdentity(staff): StaffIdentity,
  Path(id): Path<PersonId>,
  Payload(body): Payload<UpdateBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  apply_update(&state, id, PersonUpdate::try_from(body)?).await?;
  tracing::info!(person_id = id, by = staff.person_id, "updated person");
  Ok(success())
}

/// `PUT /me`. The target is always the signed-in person.
pub async fn update_me<S>(
  State(state): State<AppState<S>>,
  CurrentIdentity(caller): CurrentIdentity,
  Payload(body): Payload<UpdateBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  apply_update(&state, caller.person_id, PersonUpdate::try_from(body)?).await?;
  Ok(success())
}

// ─── Remove ───────────────────────────────────────────────────────────────────

/// `DELETE /users/{id}`
pub async fn remove_one<S>(
  State(state): State<AppState<S>>,
  StaffIdentity(staff): StaffIdentity,
  Path(id): Path<PersonId>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  state.store.remove_person(id).await.map_err(ApiError::store)?;
  tracing::info!(person_id = id, by = staff.person_id, "removed person");
  Ok(success())
}
