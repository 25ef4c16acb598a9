//! Read-only reports for staff.
//!
//! | Method | Path | Result |
//! |--------|------|--------|
//! | `GET`  | `/reports/recent` | Bags received in the last 30 days |
//! | `GET`  | `/reports/blood-types` | Donated units per blood type |
//! | `GET`  | `/reports/events` | Donated units per drive |
//! | `GET`  | `/reports/payments` | Every donor payment |
//!
//! An empty table yields `{"result": []}`, never an error.

use axum::{Json, extract::State};
use chrono::{Days, NaiveDate, Utc};
use lifeblood_core::store::BloodBankStore;
use serde_json::Value;

use crate::{AppState, error::ApiError, reply, session::StaffIdentity};

/// Window covered by `/reports/recent`.
pub const RECENT_DAYS: u64 = 30;

fn recent_cutoff(today: NaiveDate) -> NaiveDate {
  today.checked_sub_days(Days::new(RECENT_DAYS)).unwrap_or(NaiveDate::MIN)
}

pub async fn recent<S>(
  State(state): State<AppState<S>>,
  _staff: StaffIdentity,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let since = recent_cutoff(Utc::now().date_naive());
  let bags = state
    .store
    .bags_received_since(since)
    .await
    .map_err(ApiError::store)?;
  Ok(reply(bags))
}

pub async fn by_blood_type<S>(
  State(state): State<AppState<S>>,
  _staff: StaffIdentity,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let totals = state
    .store
    .donations_by_blood_type()
    .await
    .map_err(ApiError::store)?;
  Ok(reply(totals))
}

pub async fn by_event<S>(
  State(state): State<AppState<S>>,
  _staff: StaffIdentity,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let totals = state
    .store
    .donations_by_event()
    .await
    .map_err(ApiError::store)?;
  Ok(reply(totals))
}

pub async fn payments<S>(
  State(state): State<AppState<S>>,
  _staff: StaffIdentity,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let payments = state.store.payments().await.map_err(ApiError::store)?;
  Ok(reply(payments))
}
