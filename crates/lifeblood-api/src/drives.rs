//! Blood drives, blood requests and the caller's own history.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/drives` | Any signed-in caller |
//! | `POST` | `/drives` | Body: `{"stDate","enDate","loc"}`; organiser is the caller |
//! | `POST` | `/requests` | Body: `{"bloodtype","units"}`; requester is the caller |
//! | `GET`  | `/history` | Donations for donors, received bags for recipients |

use axum::{Json, extract::State};
use lifeblood_core::{
  donation::History,
  drive::{NewBloodRequest, NewDrive, Units},
  parse_date,
  person::{BloodType, Classification},
  store::BloodBankStore,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
  AppState, created,
  error::ApiError,
  payload::{Payload, lenient},
  reply,
  session::CurrentIdentity,
};

#[derive(Debug, Deserialize)]
pub struct DriveBody {
  #[serde(rename = "stDate")]
  pub start_date: String,
  #[serde(rename = "enDate")]
  pub end_date:   String,
  #[serde(rename = "loc")]
  pub location:   String,
}

impl TryFrom<DriveBody> for NewDrive {
  type Error = lifeblood_core::Error;

  fn try_from(b: DriveBody) -> Result<Self, Self::Error> {
    NewDrive::new(parse_date(&b.start_date)?, parse_date(&b.end_date)?, b.location)
  }
}

#[derive(Debug, Deserialize)]
pub struct RequestBody {
  pub bloodtype: String,
  #[serde(deserialize_with = "lenient")]
  pub units:     i64,
}

impl TryFrom<RequestBody> for NewBloodRequest {
  type Error = lifeblood_core::Error;

  fn try_from(b: RequestBody) -> Result<Self, Self::Error> {
    Ok(NewBloodRequest {
      blood_type: BloodType::parse(&b.bloodtype)?,
      units:      Units::new(b.units)?,
    })
  }
}

/// `GET /drives`, oldest start date first.
pub async fn list<S>(
  State(state): State<AppState<S>>,
  _caller: CurrentIdentity,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let drives = state.store.list_drives().await.map_err(ApiError::store)?;
  Ok(reply(drives))
}

/// `POST /drives`. Returns `{"result":"success","event_id":<id>}`.
pub async fn create<S>(
  State(state): State<AppState<S>>,
  CurrentIdentity(caller): CurrentIdentity,
  Payload(body): Payload<DriveBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let drive = NewDrive::try_from(body)?;
  let drive = state
    .store
    .create_drive(caller.person_id, drive)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(event_id = drive.event_id, organizer = caller.person_id, "created drive");
  Ok(created("event_id", drive.event_id))
}

/// `POST /requests`. Returns `{"result":"success","request_id":<id>}`.
pub async fn request_blood<S>(
  State(state): State<AppState<S>>,
  CurrentIdentity(caller): CurrentIdentity,
  Payload(body): Payload<RequestBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let request = NewBloodRequest::try_from(body)?;
  let request = state
    .store
    .create_request(caller.person_id, request)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(
    request_id = request.request_id,
    requester = caller.person_id,
    blood_type = %request.blood_type,
    "recorded blood request"
  );
  Ok(created("request_id", request.request_id))
}

/// `GET /history`
///
/// The classification comes from the store-backed identity, so a staff edit
/// takes effect on the person's next request.
pub async fn history<S>(
  State(state): State<AppState<S>>,
  CurrentIdentity(caller): CurrentIdentity,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let id = caller.person_id;
  let history = match caller.classification {
    Classification::Donor => History::Donated(
      state.store.donations_by_donor(id).await.map_err(ApiError::store)?,
    ),
    Classification::Recipient => History::Received(
      state.store.bags_received_by(id).await.map_err(ApiError::store)?,
    ),
  };
  Ok(reply(history))
}
