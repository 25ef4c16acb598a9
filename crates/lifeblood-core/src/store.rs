//! The `BloodBankStore` trait.
//!
//! Implemented by storage backends (e.g. `lifeblood-store-sqlite`). The HTTP
//! layer depends on this abstraction, not on any concrete backend.
//!
//! Every method that writes more than one row must be atomic: either every
//! statement is applied or none is.

use std::future::Future;

use chrono::NaiveDate;

use crate::{
  BagId, Error, PersonId,
  donation::{
    DonationRecord, NewDonation, NewPayment, Payment, ReceivedBag,
    RecordedDonation,
  },
  drive::{BloodRequest, Drive, NewBloodRequest, NewDrive},
  identity::{Credential, Identity},
  person::{AccountType, NewPerson, PersonRecord, PersonSummary, PersonUpdate},
  report::{BagRecord, BloodTypeTotal, EventTotal},
};

/// Backend errors that may carry a domain-level cause (a rejected write)
/// rather than a storage fault.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&Error>;
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&Error> { Some(self) }
}

/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait BloodBankStore: Send + Sync {
  type Error: StoreError;

  // ── Credentials ───────────────────────────────────────────────────────

  /// Find the credential whose username is `username`.
  fn find_credential<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<Credential>, Self::Error>> + Send + 'a;

  /// Change the account type of the credential registered as `username`.
  /// Returns `false` if there is no such credential.
  fn set_account_type<'a>(
    &'a self,
    username: &'a str,
    account_type: AccountType,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  /// The current identity of person `id`, or `None` once the person has been
  /// removed. Sessions are checked against this on every request.
  fn identity(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Identity>, Self::Error>> + Send + '_;

  // ── Person registry ───────────────────────────────────────────────────

  /// Write every row of a new person and return the allocated id.
  ///
  /// Fails with [`Error::UsernameTaken`] if the email is already in use,
  /// leaving no rows behind.
  fn register(
    &self,
    person: NewPerson,
  ) -> impl Future<Output = Result<PersonId, Self::Error>> + Send + '_;

  /// Returns `None` if no person has this id.
  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<PersonRecord>, Self::Error>> + Send + '_;

  /// Every person, ascending by id.
  fn list_persons(
    &self,
  ) -> impl Future<Output = Result<Vec<PersonSummary>, Self::Error>> + Send + '_;

  /// Rewrite a person's mutable fields. Returns `false` if no person has
  /// this id.
  fn update_person(
    &self,
    id: PersonId,
    update: PersonUpdate,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Delete every row belonging to `id`. Removing an unknown id succeeds.
  fn remove_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Drives and requests ───────────────────────────────────────────────

  fn create_drive(
    &self,
    organizer: PersonId,
    drive: NewDrive,
  ) -> impl Future<Output = Result<Drive, Self::Error>> + Send + '_;

  /// All drives, ascending by start date.
  fn list_drives(
    &self,
  ) -> impl Future<Output = Result<Vec<Drive>, Self::Error>> + Send + '_;

  /// `request_date` is set by the store.
  fn create_request(
    &self,
    requester: PersonId,
    request: NewBloodRequest,
  ) -> impl Future<Output = Result<BloodRequest, Self::Error>> + Send + '_;

  // ── Donations ─────────────────────────────────────────────────────────

  /// Insert a donation and its bag together.
  ///
  /// Fails with [`Error::PersonNotFound`] / [`Error::DriveNotFound`] if the
  /// donor or drive does not exist.
  fn record_donation(
    &self,
    donation: NewDonation,
  ) -> impl Future<Output = Result<RecordedDonation, Self::Error>> + Send + '_;

  /// Assign a bag to a recipient. Returns `false` if the bag does not exist.
  fn allocate_bag(
    &self,
    bag_id: BagId,
    recipient: PersonId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn record_payment(
    &self,
    payment: NewPayment,
  ) -> impl Future<Output = Result<Payment, Self::Error>> + Send + '_;

  fn donations_by_donor(
    &self,
    donor: PersonId,
  ) -> impl Future<Output = Result<Vec<DonationRecord>, Self::Error>> + Send + '_;

  fn bags_received_by(
    &self,
    recipient: PersonId,
  ) -> impl Future<Output = Result<Vec<ReceivedBag>, Self::Error>> + Send + '_;

  // ── Reports ───────────────────────────────────────────────────────────

  /// Bags received on or after `since`, newest first.
  fn bags_received_since(
    &self,
    since: NaiveDate,
  ) -> impl Future<Output = Result<Vec<BagRecord>, Self::Error>> + Send + '_;

  fn donations_by_blood_type(
    &self,
  ) -> impl Future<Output = Result<Vec<BloodTypeTotal>, Self::Error>> + Send + '_;

  fn donations_by_event(
    &self,
  ) -> impl Future<Output = Result<Vec<EventTotal>, Self::Error>> + Send + '_;

  fn payments(
    &self,
  ) -> impl Future<Output = Result<Vec<Payment>, Self::Error>> + Send + '_;
}
