//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` strings, enumerations as their wire
//! spelling (`"AB+"`, `"staff"`). Classification is not a column at all; it
//! is decoded from which marker table holds the person's id.

use chrono::NaiveDate;
use lifeblood_core::{
  DATE_FORMAT, PersonId,
  donation::{DonationRecord, Payment, ReceivedBag},
  drive::{BloodRequest, Drive, Units},
  identity::Credential,
  person::{
    AccountType, BloodType, Classification, PersonRecord, PersonSummary,
    Weight, join_diseases,
  },
  report::{BagRecord, BloodTypeTotal},
};

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

pub fn decode_blood_type(s: &str) -> Result<BloodType> {
  BloodType::parse(s).map_err(|_| Error::Decode(format!("blood type {s:?}")))
}

pub fn decode_account_type(s: &str) -> Result<AccountType> {
  AccountType::parse(s).map_err(|_| Error::Decode(format!("account type {s:?}")))
}

pub fn decode_weight(kg: i64) -> Result<Weight> {
  Weight::new(kg).map_err(|_| Error::Decode(format!("weight {kg}")))
}

pub fn decode_units(n: i64) -> Result<Units> {
  Units::new(n).map_err(|_| Error::Decode(format!("units {n}")))
}

/// A person must sit in exactly one of the `donor` and `recipient` tables.
pub fn decode_classification(
  id: PersonId,
  is_donor: bool,
  is_recipient: bool,
) -> Result<Classification> {
  match (is_donor, is_recipient) {
    (true, false) => Ok(Classification::Donor),
    (false, true) => Ok(Classification::Recipient),
    (true, true) => Err(Error::Decode(format!(
      "person {id} is both donor and recipient"
    ))),
    (false, false) => Err(Error::Decode(format!(
      "person {id} is neither donor nor recipient"
    ))),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values from `person` joined with `user`, `auth` and the marker tables.
pub struct RawPerson {
  pub id:           PersonId,
  pub name:         String,
  pub address:      String,
  pub phone:        String,
  pub email:        String,
  pub dob:          String,
  pub blood_type:   String,
  pub weight:       i64,
  pub role:         String,
  pub is_donor:     bool,
  pub is_recipient: bool,
}

impl RawPerson {
  pub fn into_record(self, diseases: &[String]) -> Result<PersonRecord> {
    Ok(PersonRecord {
      id:             self.id,
      name:           self.name,
      address:        self.address,
      phone:          self.phone,
      email:          self.email,
      dob:            decode_date(&self.dob)?,
      blood_type:     decode_blood_type(&self.blood_type)?,
      weight:         decode_weight(self.weight)?,
      diseases:       join_diseases(diseases),
      classification: decode_classification(
        self.id,
        self.is_donor,
        self.is_recipient,
      )?,
      account_type:   decode_account_type(&self.role)?,
    })
  }
}

/// Raw values for one row of the person listing; diseases arrive already
/// concatenated by `GROUP_CONCAT`.
pub struct RawSummary {
  pub id:           PersonId,
  pub name:         String,
  pub address:      String,
  pub email:        String,
  pub blood_type:   String,
  pub diseases:     Option<String>,
  pub role:         String,
  pub is_donor:     bool,
  pub is_recipient: bool,
}

impl RawSummary {
  pub fn into_summary(self) -> Result<PersonSummary> {
    Ok(PersonSummary {
      id:             self.id,
      name:           self.name,
      address:        self.address,
      email:          self.email,
      blood_type:     decode_blood_type(&self.blood_type)?,
      diseases:       self.diseases.unwrap_or_default(),
      classification: decode_classification(
        self.id,
        self.is_donor,
        self.is_recipient,
      )?,
      account_type:   decode_account_type(&self.role)?,
    })
  }
}

pub struct RawCredential {
  pub person_id:     PersonId,
  pub username:      String,
  pub password_hash: String,
  pub role:          String,
  pub display_name:  String,
  pub is_donor:      bool,
  pub is_recipient:  bool,
}

impl RawCredential {
  pub fn into_credential(self) -> Result<Credential> {
    Ok(Credential {
      classification: decode_classification(
        self.person_id,
        self.is_donor,
        self.is_recipient,
      )?,
      account_type:   decode_account_type(&self.role)?,
      person_id:      self.person_id,
      username:       self.username,
      password_hash:  self.password_hash,
      display_name:   self.display_name,
    })
  }
}

pub struct RawDrive {
  pub event_id:     i64,
  pub start_date:   String,
  pub end_date:     String,
  pub location:     String,
  pub organizer_id: Option<PersonId>,
}

impl RawDrive {
  pub fn into_drive(self) -> Result<Drive> {
    Ok(Drive {
      event_id:     self.event_id,
      start_date:   decode_date(&self.start_date)?,
      end_date:     decode_date(&self.end_date)?,
      location:     self.location,
      organizer_id: self.organizer_id,
    })
  }
}

pub struct RawRequest {
  pub request_id:   i64,
  pub blood_type:   String,
  pub units:        i64,
  pub requester_id: Option<PersonId>,
  pub request_date: String,
}

impl RawRequest {
  pub fn into_request(self) -> Result<BloodRequest> {
    Ok(BloodRequest {
      request_id:   self.request_id,
      blood_type:   decode_blood_type(&self.blood_type)?,
      units:        decode_units(self.units)?,
      requester_id: self.requester_id,
      request_date: decode_date(&self.request_date)?,
    })
  }
}

pub struct RawDonation {
  pub donation_id:   i64,
  pub event_id:      Option<i64>,
  pub units:         i64,
  pub donation_date: String,
}

impl RawDonation {
  pub fn into_record(self) -> Result<DonationRecord> {
    Ok(DonationRecord {
      donation_id:   self.donation_id,
      event_id:      self.event_id,
      units:         self.units,
      donation_date: decode_date(&self.donation_date)?,
    })
  }
}

pub struct RawReceivedBag {
  pub bag_id:        i64,
  pub donation_id:   i64,
  pub blood_type:    Option<String>,
  pub units:         i64,
  pub donation_date: String,
  pub received_date: String,
}

impl RawReceivedBag {
  pub fn into_received(self) -> Result<ReceivedBag> {
    Ok(ReceivedBag {
      bag_id:        self.bag_id,
      donation_id:   self.donation_id,
      blood_type:    self
        .blood_type
        .as_deref()
        .map(decode_blood_type)
        .transpose()?,
      units:         self.units,
      donation_date: decode_date(&self.donation_date)?,
      received_date: decode_date(&self.received_date)?,
    })
  }
}

pub struct RawBag {
  pub bag_id:        i64,
  pub donation_id:   i64,
  pub recipient_id:  Option<PersonId>,
  pub received_date: String,
}

impl RawBag {
  pub fn into_record(self) -> Result<BagRecord> {
    Ok(BagRecord {
      bag_id:        self.bag_id,
      donation_id:   self.donation_id,
      recipient_id:  self.recipient_id,
      received_date: decode_date(&self.received_date)?,
    })
  }
}

pub struct RawBloodTypeTotal {
  pub blood_type:  String,
  pub total_units: i64,
}

impl RawBloodTypeTotal {
  pub fn into_total(self) -> Result<BloodTypeTotal> {
    Ok(BloodTypeTotal {
      blood_type:  decode_blood_type(&self.blood_type)?,
      total_units: self.total_units,
    })
  }
}

pub struct RawPayment {
  pub payment_id: i64,
  pub donor_id:   Option<PersonId>,
  pub amount:     f64,
  pub date:       String,
}

impl RawPayment {
  pub fn into_payment(self) -> Result<Payment> {
    Ok(Payment {
      payment_id: self.payment_id,
      donor_id:   self.donor_id,
      amount:     self.amount,
      date:       decode_date(&self.date)?,
    })
  }
}
