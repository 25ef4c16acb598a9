//! Blood drives and blood requests.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Error, EventId, PersonId, RequestId, Result, person::BloodType};

// ─── Units ───────────────────────────────────────────────────────────────────

/// A strictly positive number of blood units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Units(u32);

impl Units {
  pub fn new(n: i64) -> Result<Self> {
    match u32::try_from(n) {
      Ok(n) if n > 0 => Ok(Self(n)),
      _ => Err(Error::InvalidUnits(n)),
    }
  }

  pub fn get(self) -> i64 { i64::from(self.0) }
}

impl TryFrom<i64> for Units {
  type Error = Error;

  fn try_from(n: i64) -> Result<Self> { Self::new(n) }
}

impl From<Units> for i64 {
  fn from(u: Units) -> Self { u.get() }
}

// ─── Drives ──────────────────────────────────────────────────────────────────

/// A drive to be scheduled. The organizer comes from the caller's identity,
/// never from the request body.
#[derive(Debug, Clone)]
pub struct NewDrive {
  pub start_date: NaiveDate,
  pub end_date:   NaiveDate,
  pub location:   String,
}

impl NewDrive {
  pub fn new(
    start_date: NaiveDate,
    end_date: NaiveDate,
    location: String,
  ) -> Result<Self> {
    if end_date < start_date {
      return Err(Error::InvalidDateRange);
    }
    Ok(Self { start_date, end_date, location })
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Drive {
  pub event_id:     EventId,
  pub start_date:   NaiveDate,
  pub end_date:     NaiveDate,
  pub location:     String,
  /// `None` once the organizer's account has been removed.
  pub organizer_id: Option<PersonId>,
}

// ─── Requests ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NewBloodRequest {
  pub blood_type: BloodType,
  pub units:      Units,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodRequest {
  pub request_id:   RequestId,
  #[serde(rename = "bloodtype")]
  pub blood_type:   BloodType,
  pub units:        Units,
  pub requester_id: Option<PersonId>,
  pub request_date: NaiveDate,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn units_must_be_positive() {
    assert_eq!(Units::new(3).unwrap().get(), 3);
    assert_eq!(Units::new(0), Err(Error::InvalidUnits(0)));
    assert_eq!(Units::new(-4), Err(Error::InvalidUnits(-4)));
  }

  #[test]
  fn single_day_drive_is_allowed() {
    let drive = NewDrive::new(d(2026, 5, 1), d(2026, 5, 1), "Hall".into());
    assert!(drive.is_ok());
  }

  #[test]
  fn drive_ending_before_start_is_rejected() {
    let drive = NewDrive::new(d(2026, 5, 2), d(2026, 5, 1), "Hall".into());
    assert!(matches!(drive, Err(Error::InvalidDateRange)));
  }
}
