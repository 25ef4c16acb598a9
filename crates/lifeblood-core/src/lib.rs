//! Core types and trait definitions for the Lifeblood blood bank.
//!
//! This crate is free of HTTP and database dependencies. Every other crate
//! depends on it.

// Native `async fn` in traits; the futures are declared `Send` explicitly.
#![allow(async_fn_in_trait)]

pub mod donation;
pub mod drive;
pub mod error;
pub mod identity;
pub mod person;
pub mod report;
pub mod store;

use chrono::NaiveDate;

pub use error::{Error, Result};

pub type PersonId = i64;
pub type EventId = i64;
pub type RequestId = i64;
pub type DonationId = i64;
pub type BagId = i64;
pub type PaymentId = i64;

/// The only date format accepted on input and produced on output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
    .map_err(|_| Error::InvalidDate(s.to_owned()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_iso_dates_only() {
    assert_eq!(
      parse_date("2001-09-30").unwrap(),
      NaiveDate::from_ymd_opt(2001, 9, 30).unwrap()
    );
    assert!(matches!(parse_date("30/09/2001"), Err(Error::InvalidDate(_))));
    assert!(matches!(parse_date("2001-02-30"), Err(Error::InvalidDate(_))));
  }
}
