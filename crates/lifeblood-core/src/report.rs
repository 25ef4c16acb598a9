//! Read-only aggregate rows for the staff reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{BagId, DonationId, EventId, PersonId, person::BloodType};

/// A bag as listed in the recent-donations report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BagRecord {
  pub bag_id:        BagId,
  pub donation_id:   DonationId,
  pub recipient_id:  Option<PersonId>,
  pub received_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BloodTypeTotal {
  #[serde(rename = "bloodtype")]
  pub blood_type:  BloodType,
  pub total_units: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTotal {
  pub event_id:    EventId,
  pub location:    String,
  /// Zero for drives with no donations yet.
  pub total_units: i64,
}
