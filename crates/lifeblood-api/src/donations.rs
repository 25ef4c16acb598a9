//! Staff bookkeeping: donations, bag allocation and donor payments.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/donations` | Body: `{"donor_id","event_id"?,"units","date"}` |
//! | `POST` | `/bags/{id}/allocate` | Body: `{"recipient_id"}` |
//! | `POST` | `/payments` | Body: `{"donor_id","amount","date"}` |

use axum::{
  Json,
  extract::{Path, State},
};
use lifeblood_core::{
  BagId, EventId, PersonId,
  donation::{NewDonation, NewPayment},
  drive::Units,
  parse_date,
  store::BloodBankStore,
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
  AppState, created,
  error::ApiError,
  payload::{Payload, lenient, lenient_opt},
  session::StaffIdentity,
  success,
};

#[derive(Debug, Deserialize)]
pub struct DonationBody {
  #[serde(deserialize_with = "lenient")]
  pub donor_id: PersonId,
  /// Walk-in donations have no drive.
  #[serde(default, deserialize_with = "lenient_opt")]
  pub event_id: Option<EventId>,
  #[serde(deserialize_with = "lenient")]
  pub units:    i64,
  pub date:     String,
}

impl TryFrom<DonationBody> for NewDonation {
  type Error = lifeblood_core::Error;

  fn try_from(b: DonationBody) -> Result<Self, Self::Error> {
    Ok(NewDonation {
      donor_id: b.donor_id,
      event_id: b.event_id,
      units:    Units::new(b.units)?,
      date:     parse_date(&b.date)?,
    })
  }
}

#[derive(Debug, Deserialize)]
pub struct AllocateBody {
  #[serde(deserialize_with = "lenient")]
  pub recipient_id: PersonId,
}

#[derive(Debug, Deserialize)]
pub struct PaymentBody {
  #[serde(deserialize_with = "lenient")]
  pub donor_id: PersonId,
  #[serde(deserialize_with = "lenient")]
  pub amount:   f64,
  pub date:     String,
}

impl TryFrom<PaymentBody> for NewPayment {
  type Error = lifeblood_core::Error;

  fn try_from(b: PaymentBody) -> Result<Self, Self::Error> {
    NewPayment::new(b.donor_id, b.amount, parse_date(&b.date)?)
  }
}

/// `POST /donations`. Stores the donation and its bag together.
///
/// Returns `{"result":"success","donation_id":<id>,"bag_id":<id>}`.
pub async fn record<S>(
  State(state): State<AppState<S>>,
  StaffIdentity(staff): StaffIdentity,
  Payload(body): Payload<DonationBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let donation = NewDonation::try_from(body)?;
  let donor_id = donation.donor_id;
  let recorded = state
    .store
    .record_donation(donation)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(
    donation_id = recorded.donation_id,
    bag_id = recorded.bag_id,
    donor_id,
    by = staff.person_id,
    "recorded donation"
  );
  Ok(Json(json!({
    "result": "success",
    "donation_id": recorded.donation_id,
    "bag_id": recorded.bag_id,
  })))
}

/// `POST /bags/{id}/allocate`
pub async fn allocate<S>(
  State(state): State<AppState<S>>,
  StaffIdentity(staff): StaffIdentity,
  Path(bag_id): Path<BagId>,
  Payload(body): Payload<AllocateBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let found = state
    .store
    .allocate_bag(bag_id, body.recipient_id)
    .await
    .map_err(ApiError::store)?;
  if !found {
    return Err(ApiError::NotFound(format!("bag {bag_id} not found")));
  }
  tracing::info!(bag_id, recipient_id = body.recipient_id, by = staff.person_id, "allocated bag");
  Ok(success())
}

/// `POST /payments`. Returns `{"result":"success","payment_id":<id>}`.
pub async fn pay<S>(
  State(state): State<AppState<S>>,
  StaffIdentity(staff): StaffIdentity,
  Payload(body): Payload<PaymentBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BloodBankStore,
{
  let payment = NewPayment::try_from(body)?;
  let payment = state
    .store
    .record_payment(payment)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(payment_id = payment.payment_id, by = staff.person_id, "recorded payment");
  Ok(created("payment_id", payment.payment_id))
}
