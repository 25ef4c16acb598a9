//! Donations, the bags drawn from them, and donor payments.
//!
//! Each recorded donation yields exactly one bag. A bag is later allocated to
//! a recipient, which is what shows up in that recipient's history.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  BagId, DonationId, Error, EventId, PaymentId, PersonId, Result,
  drive::Units,
  person::BloodType,
};

#[derive(Debug, Clone)]
pub struct NewDonation {
  pub donor_id: PersonId,
  pub event_id: Option<EventId>,
  pub units:    Units,
  pub date:     NaiveDate,
}

/// Identifiers allocated by [`crate::store::BloodBankStore::record_donation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedDonation {
  pub donation_id: DonationId,
  pub bag_id:      BagId,
}

/// A row of a donor's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRecord {
  pub donation_id:   DonationId,
  pub event_id:      Option<EventId>,
  pub units:         i64,
  pub donation_date: NaiveDate,
}

/// A row of a recipient's history: an allocated bag and the donation it came
/// from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivedBag {
  pub bag_id:        BagId,
  pub donation_id:   DonationId,
  /// The donor's blood type; `None` once the donor has been removed.
  #[serde(rename = "bloodtype")]
  pub blood_type:    Option<BloodType>,
  pub units:         i64,
  pub donation_date: NaiveDate,
  pub received_date: NaiveDate,
}

/// What a signed-in person has given or received, depending on their
/// classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum History {
  Donated(Vec<DonationRecord>),
  Received(Vec<ReceivedBag>),
}

// ─── Payments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewPayment {
  pub donor_id: PersonId,
  pub amount:   f64,
  pub date:     NaiveDate,
}

impl NewPayment {
  pub fn new(donor_id: PersonId, amount: f64, date: NaiveDate) -> Result<Self> {
    if !amount.is_finite() || amount < 0.0 {
      return Err(Error::InvalidAmount);
    }
    Ok(Self { donor_id, amount, date })
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
  pub payment_id: PaymentId,
  pub donor_id:   Option<PersonId>,
  pub amount:     f64,
  pub date:       NaiveDate,
}
