//! The composite person entity: identity row, profile, credential, disease
//! history and donor/recipient classification.
//!
//! A person is never stored as one row. The store splits it across the
//! `person`, `user`, `auth`, `disease_history` and `donor`/`recipient`
//! tables and reassembles it on read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::{Error, PersonId, Result};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// ABO/Rh blood group, spelled the way it is stored (`"AB-"`, `"O+"`, ...).
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
pub enum BloodType {
  #[serde(rename = "A+")]
  #[strum(serialize = "A+")]
  APositive,
  #[serde(rename = "A-")]
  #[strum(serialize = "A-")]
  ANegative,
  #[serde(rename = "B+")]
  #[strum(serialize = "B+")]
  BPositive,
  #[serde(rename = "B-")]
  #[strum(serialize = "B-")]
  BNegative,
  #[serde(rename = "AB+")]
  #[strum(serialize = "AB+")]
  AbPositive,
  #[serde(rename = "AB-")]
  #[strum(serialize = "AB-")]
  AbNegative,
  #[serde(rename = "O+")]
  #[strum(serialize = "O+")]
  OPositive,
  #[serde(rename = "O-")]
  #[strum(serialize = "O-")]
  ONegative,
}

impl BloodType {
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::InvalidBloodType(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

/// Whether a person gives or receives blood. Recorded by the presence of a
/// row in exactly one of the `donor` and `recipient` tables.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Classification {
  Donor,
  Recipient,
}

impl Classification {
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::InvalidClassification(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

/// What the account may do, independent of its classification. Stored in
/// `auth.role`.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AccountType {
  Staff,
  #[default]
  User,
}

impl AccountType {
  pub fn parse(s: &str) -> Result<Self> {
    s.parse()
      .map_err(|_| Error::InvalidAccountType(s.to_owned()))
  }

  pub fn as_str(self) -> &'static str { self.into() }
}

// ─── Weight ──────────────────────────────────────────────────────────────────

/// Body weight in whole kilograms, `0..=200`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Weight(u8);

impl Weight {
  pub const MAX: i64 = 200;

  pub fn new(kg: i64) -> Result<Self> {
    if (0..=Self::MAX).contains(&kg) {
      Ok(Self(kg as u8))
    } else {
      Err(Error::InvalidWeight(kg))
    }
  }

  pub fn get(self) -> i64 { i64::from(self.0) }
}

impl TryFrom<i64> for Weight {
  type Error = Error;

  fn try_from(kg: i64) -> Result<Self> { Self::new(kg) }
}

impl From<Weight> for i64 {
  fn from(w: Weight) -> Self { w.get() }
}

// ─── Disease lists ───────────────────────────────────────────────────────────

/// Split a comma-separated disease list. Items are trimmed and empty items
/// dropped, so `""` yields no diseases. Duplicates are kept.
pub fn parse_diseases(list: &str) -> Vec<String> {
  list
    .split(',')
    .map(str::trim)
    .filter(|d| !d.is_empty())
    .map(str::to_owned)
    .collect()
}

/// Inverse of [`parse_diseases`] for display: items joined with `", "`.
pub fn join_diseases(diseases: &[String]) -> String { diseases.join(", ") }

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// A validated registration. Construct it only after every field has been
/// checked; the store writes it without further validation.
#[derive(Debug, Clone)]
pub struct NewPerson {
  pub name:           String,
  pub address:        String,
  pub phone:          String,
  pub email:          String,
  pub dob:            NaiveDate,
  pub blood_type:     BloodType,
  pub weight:         Weight,
  pub classification: Classification,
  pub diseases:       Vec<String>,
  /// PHC string from the credential verifier; never the plain password.
  pub password_hash:  String,
}

/// A validated profile rewrite. `None` leaves the field as it is; the
/// disease list is always replaced wholesale.
#[derive(Debug, Clone)]
pub struct PersonUpdate {
  pub address:        String,
  pub email:          String,
  pub weight:         Weight,
  pub blood_type:     Option<BloodType>,
  pub classification: Option<Classification>,
  pub diseases:       Vec<String>,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// Everything known about one person, as returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
  pub id:             PersonId,
  pub name:           String,
  pub address:        String,
  pub phone:          String,
  pub email:          String,
  pub dob:            NaiveDate,
  #[serde(rename = "bloodtype")]
  pub blood_type:     BloodType,
  pub weight:         Weight,
  /// Disease history joined with `", "`; empty when there is none.
  #[serde(rename = "disease")]
  pub diseases:       String,
  #[serde(rename = "type")]
  pub classification: Classification,
  #[serde(rename = "role")]
  pub account_type:   AccountType,
}

/// One row of the person listing; a [`PersonRecord`] without weight, phone
/// and date of birth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonSummary {
  pub id:             PersonId,
  pub name:           String,
  pub address:        String,
  pub email:          String,
  #[serde(rename = "bloodtype")]
  pub blood_type:     BloodType,
  #[serde(rename = "disease")]
  pub diseases:       String,
  #[serde(rename = "type")]
  pub classification: Classification,
  #[serde(rename = "role")]
  pub account_type:   AccountType,
}
