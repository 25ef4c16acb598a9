//! Error types for `lifeblood-core`.
//!
//! The first three messages match the strings the web client has always
//! received for rejected registrations.

use thiserror::Error;

use crate::{EventId, PersonId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("Invalid bloodtype")]
  InvalidBloodType(String),

  #[error("Invalid type")]
  InvalidClassification(String),

  #[error("Invalid weight")]
  InvalidWeight(i64),

  #[error("invalid account type: {0:?}")]
  InvalidAccountType(String),

  #[error("invalid date {0:?}, expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("drive ends before it starts")]
  InvalidDateRange,

  #[error("units must be greater than zero, got {0}")]
  InvalidUnits(i64),

  #[error("payment amount must not be negative")]
  InvalidAmount,

  #[error("Username already registered")]
  UsernameTaken(String),

  #[error("person not found: {0}")]
  PersonNotFound(PersonId),

  #[error("drive not found: {0}")]
  DriveNotFound(EventId),
}

impl Error {
  /// `true` for errors caused by malformed input rather than by the state
  /// of the store.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidBloodType(_)
        | Self::InvalidClassification(_)
        | Self::InvalidWeight(_)
        | Self::InvalidAccountType(_)
        | Self::InvalidDate(_)
        | Self::InvalidDateRange
        | Self::InvalidUnits(_)
        | Self::InvalidAmount
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
