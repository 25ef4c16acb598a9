//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::NaiveDate;
use lifeblood_core::{
  donation::{NewDonation, NewPayment},
  drive::{NewBloodRequest, NewDrive, Units},
  person::{
    AccountType, BloodType, Classification, NewPerson, PersonUpdate, Weight,
    parse_diseases,
  },
  store::BloodBankStore,
};
use strum::IntoEnumIterator as _;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
  NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn person(name: &str, email: &str, classification: Classification) -> NewPerson {
  NewPerson {
    name:           name.into(),
    address:        "12 Harbour Road".into(),
    phone:          "555-0100".into(),
    email:          email.into(),
    dob:            date(1990, 4, 2),
    blood_type:     BloodType::ONegative,
    weight:         Weight::new(60).unwrap(),
    classification,
    diseases:       Vec::new(),
    password_hash:  "$argon2id$v=19$m=8,t=1,p=1$c2FsdHNhbHQ$aGFzaA".into(),
  }
}

fn donor(name: &str, email: &str) -> NewPerson {
  person(name, email, Classification::Donor)
}

const PERSON_TABLES: [&str; 6] =
  ["person", "\"user\"", "auth", "disease_history", "donor", "recipient"];

// ─── Registration ────────────────────────────────────────────────────────────

#[tokio::test]
async fn register_and_lookup_round_trip() {
  let s = store().await;
  let classifications = [Classification::Donor, Classification::Recipient];

  for (i, bt) in BloodType::iter().enumerate() {
    for (j, classification) in classifications.into_iter().enumerate() {
      let email = format!("p{i}-{j}@example.com");
      let mut input = person("Pat", &email, classification);
      input.blood_type = bt;
      input.weight = Weight::new(50 + i as i64).unwrap();
      input.diseases = parse_diseases("asthma, anemia");

      let id = s.register(input).await.unwrap();
      let record = s.get_person(id).await.unwrap().expect("registered person");

      assert_eq!(record.id, id);
      assert_eq!(record.name, "Pat");
      assert_eq!(record.email, email);
      assert_eq!(record.phone, "555-0100");
      assert_eq!(record.dob, date(1990, 4, 2));
      assert_eq!(record.blood_type, bt);
      assert_eq!(record.weight.get(), 50 + i as i64);
      assert_eq!(record.classification, classification);
      assert_eq!(record.account_type, AccountType::User);
      assert_eq!(record.diseases, "asthma, anemia");
    }
  }
}

#[tokio::test]
async fn first_registration_gets_id_one() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();
  assert_eq!(id, 1);
}

#[tokio::test]
async fn registration_writes_exactly_one_marker() {
  let s = store().await;
  let d = s.register(donor("Dee", "dee@example.com")).await.unwrap();
  let r = s
    .register(person("Rae", "rae@example.com", Classification::Recipient))
    .await
    .unwrap();

  assert_eq!(s.count_rows("donor", d).await, 1);
  assert_eq!(s.count_rows("recipient", d).await, 0);
  assert_eq!(s.count_rows("donor", r).await, 0);
  assert_eq!(s.count_rows("recipient", r).await, 1);
}

#[tokio::test]
async fn empty_disease_list_writes_no_history_rows() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();

  assert_eq!(s.count_rows("disease_history", id).await, 0);
  assert_eq!(s.get_person(id).await.unwrap().unwrap().diseases, "");
}

#[tokio::test]
async fn duplicate_diseases_are_kept() {
  let s = store().await;
  let mut input = donor("Alice", "alice@example.com");
  input.diseases = parse_diseases("flu,flu");
  let id = s.register(input).await.unwrap();

  assert_eq!(s.count_rows("disease_history", id).await, 2);
  assert_eq!(s.get_person(id).await.unwrap().unwrap().diseases, "flu, flu");
}

#[tokio::test]
async fn duplicate_username_rolls_back_every_row() {
  let s = store().await;
  s.register(donor("Alice", "alice@example.com")).await.unwrap();

  let mut second = donor("Mallory", "alice@example.com");
  second.diseases = vec!["flu".into()];
  let err = s.register(second).await.unwrap_err();
  assert!(
    matches!(err, Error::Core(lifeblood_core::Error::UsernameTaken(ref u)) if u == "alice@example.com"),
    "unexpected error: {err}"
  );

  // The person and profile rows were written before the credential insert
  // failed; none of them may survive.
  for table in PERSON_TABLES {
    assert_eq!(s.count_rows(table, 2).await, 0, "orphan row in {table}");
  }
  assert_eq!(s.count_all("person").await, 1);
  assert_eq!(s.list_persons().await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_registrations_never_share_an_id() {
  let s = store().await;
  let mut tasks = tokio::task::JoinSet::new();

  for i in 0..32 {
    let s = s.clone();
    tasks.spawn(async move {
      s.register(donor("Pat", &format!("pat{i}@example.com"))).await
    });
  }

  let mut ids = Vec::new();
  while let Some(joined) = tasks.join_next().await {
    ids.push(joined.unwrap().unwrap());
  }
  ids.sort_unstable();
  ids.dedup();

  assert_eq!(ids.len(), 32);
  assert_eq!(s.count_all("person").await, 32);
}

// ─── Lookup and listing ──────────────────────────────────────────────────────

#[tokio::test]
async fn lookup_missing_returns_none() {
  let s = store().await;
  assert!(s.get_person(42).await.unwrap().is_none());
}

#[tokio::test]
async fn list_is_ordered_by_id_and_carries_diseases() {
  let s = store().await;
  let mut a = donor("Alice", "alice@example.com");
  a.diseases = vec!["asthma".into()];
  let b = person("Bob", "bob@example.com", Classification::Recipient);
  let mut c = donor("Carol", "carol@example.com");
  c.diseases = vec!["flu".into(), "gout".into()];

  for p in [a, b, c] {
    s.register(p).await.unwrap();
  }

  let all = s.list_persons().await.unwrap();
  let names: Vec<_> = all.iter().map(|p| p.name.as_str()).collect();
  assert_eq!(names, ["Alice", "Bob", "Carol"]);
  assert!(all.windows(2).all(|w| w[0].id < w[1].id));

  assert_eq!(all[0].diseases, "asthma");
  assert_eq!(all[1].diseases, "");
  assert_eq!(all[1].classification, Classification::Recipient);
  let mut carol: Vec<_> = all[2].diseases.split(", ").collect();
  carol.sort_unstable();
  assert_eq!(carol, ["flu", "gout"]);
}

// ─── Update ──────────────────────────────────────────────────────────────────

fn update(email: &str) -> PersonUpdate {
  PersonUpdate {
    address:        "9 New Street".into(),
    email:          email.into(),
    weight:         Weight::new(72).unwrap(),
    blood_type:     None,
    classification: None,
    diseases:       vec!["gout".into()],
  }
}

#[tokio::test]
async fn update_replaces_fields_and_disease_list() {
  let s = store().await;
  let mut input = donor("Alice", "alice@example.com");
  input.diseases = vec!["asthma".into(), "flu".into()];
  let id = s.register(input).await.unwrap();

  let mut change = update("alice@new.example.com");
  change.blood_type = Some(BloodType::BPositive);
  change.classification = Some(Classification::Recipient);
  assert!(s.update_person(id, change).await.unwrap());

  let record = s.get_person(id).await.unwrap().unwrap();
  assert_eq!(record.address, "9 New Street");
  assert_eq!(record.email, "alice@new.example.com");
  assert_eq!(record.weight.get(), 72);
  assert_eq!(record.blood_type, BloodType::BPositive);
  assert_eq!(record.classification, Classification::Recipient);
  assert_eq!(record.diseases, "gout");
  assert_eq!(s.count_rows("donor", id).await, 0);
  assert_eq!(s.count_rows("recipient", id).await, 1);

  // Name, phone and dob are not part of an update.
  assert_eq!(record.name, "Alice");
  assert_eq!(record.phone, "555-0100");
}

#[tokio::test]
async fn update_keeps_unset_optional_fields() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();

  assert!(s.update_person(id, update("alice@example.com")).await.unwrap());

  let record = s.get_person(id).await.unwrap().unwrap();
  assert_eq!(record.blood_type, BloodType::ONegative);
  assert_eq!(record.classification, Classification::Donor);
}

#[tokio::test]
async fn update_moves_the_username_with_the_email() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();
  s.update_person(id, update("alice@new.example.com")).await.unwrap();

  assert!(s.find_credential("alice@example.com").await.unwrap().is_none());
  let cred = s.find_credential("alice@new.example.com").await.unwrap().unwrap();
  assert_eq!(cred.person_id, id);
}

#[tokio::test]
async fn update_to_taken_email_changes_nothing() {
  let s = store().await;
  let alice = s.register(donor("Alice", "alice@example.com")).await.unwrap();
  s.register(donor("Bob", "bob@example.com")).await.unwrap();

  let err = s.update_person(alice, update("bob@example.com")).await.unwrap_err();
  assert!(matches!(err, Error::Core(lifeblood_core::Error::UsernameTaken(_))));

  let record = s.get_person(alice).await.unwrap().unwrap();
  assert_eq!(record.email, "alice@example.com");
  assert_eq!(record.address, "12 Harbour Road");
  assert_eq!(record.weight.get(), 60);
}

#[tokio::test]
async fn update_missing_person_returns_false() {
  let s = store().await;
  assert!(!s.update_person(7, update("x@example.com")).await.unwrap());
  assert_eq!(s.count_all("disease_history").await, 0);
}

// ─── Removal ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn remove_deletes_every_row_and_is_idempotent() {
  let s = store().await;
  let mut input = donor("Alice", "alice@example.com");
  input.diseases = vec!["asthma".into()];
  let id = s.register(input).await.unwrap();

  s.remove_person(id).await.unwrap();
  for table in PERSON_TABLES {
    assert_eq!(s.count_rows(table, id).await, 0, "row left in {table}");
  }

  s.remove_person(id).await.unwrap();
  s.remove_person(999).await.unwrap();
}

#[tokio::test]
async fn removed_ids_are_not_reused() {
  let s = store().await;
  let first = s.register(donor("Alice", "alice@example.com")).await.unwrap();
  s.remove_person(first).await.unwrap();

  let second = s.register(donor("Bob", "bob@example.com")).await.unwrap();
  assert!(second > first);
}

#[tokio::test]
async fn alice_end_to_end() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();
  assert_eq!(id, 1);

  let record = s.get_person(1).await.unwrap().unwrap();
  assert_eq!(record.blood_type, BloodType::ONegative);
  assert_eq!(record.weight.get(), 60);
  assert_eq!(record.diseases, "");

  s.remove_person(1).await.unwrap();
  assert!(s.get_person(1).await.unwrap().is_none());
}

#[tokio::test]
async fn remove_keeps_donations_with_the_donor_unset() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();
  s.record_donation(NewDonation {
    donor_id: id,
    event_id: None,
    units:    Units::new(1).unwrap(),
    date:     date(2026, 3, 1),
  })
  .await
  .unwrap();

  s.remove_person(id).await.unwrap();

  assert_eq!(s.count_all("donation").await, 1);
  assert!(s.donations_by_donor(id).await.unwrap().is_empty());
}

// ─── Credentials ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_credential_carries_identity_fields() {
  let s = store().await;
  let id = s
    .register(person("Rae", "rae@example.com", Classification::Recipient))
    .await
    .unwrap();

  let cred = s.find_credential("rae@example.com").await.unwrap().unwrap();
  assert_eq!(cred.person_id, id);
  assert_eq!(cred.display_name, "Rae");
  assert_eq!(cred.account_type, AccountType::User);
  assert_eq!(cred.classification, Classification::Recipient);
  assert!(cred.password_hash.starts_with("$argon2id$"));

  assert!(s.find_credential("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn set_account_type_promotes_existing_credential_only() {
  let s = store().await;
  s.register(donor("Alice", "alice@example.com")).await.unwrap();

  assert!(s.set_account_type("alice@example.com", AccountType::Staff).await.unwrap());
  assert!(!s.set_account_type("ghost@example.com", AccountType::Staff).await.unwrap());

  let cred = s.find_credential("alice@example.com").await.unwrap().unwrap();
  assert_eq!(cred.account_type, AccountType::Staff);
  // Promotion does not touch the classification.
  assert_eq!(cred.classification, Classification::Donor);
}

#[tokio::test]
async fn identity_tracks_role_changes_and_removal() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();

  let before = s.identity(id).await.unwrap().unwrap();
  assert_eq!(before.person_id, id);
  assert_eq!(before.display_name, "Alice");
  assert!(!before.is_staff());

  s.set_account_type("alice@example.com", AccountType::Staff).await.unwrap();
  assert!(s.identity(id).await.unwrap().unwrap().is_staff());

  s.remove_person(id).await.unwrap();
  assert!(s.identity(id).await.unwrap().is_none());
  assert!(s.identity(99).await.unwrap().is_none());
}

// ─── Drives and requests ─────────────────────────────────────────────────────

#[tokio::test]
async fn drives_get_sequential_ids_and_list_by_start_date() {
  let s = store().await;
  let organizer = s.register(donor("Alice", "alice@example.com")).await.unwrap();

  let late = NewDrive::new(date(2026, 6, 1), date(2026, 6, 2), "Library".into()).unwrap();
  let early = NewDrive::new(date(2026, 5, 1), date(2026, 5, 1), "Gym".into()).unwrap();

  let first = s.create_drive(organizer, late).await.unwrap();
  let second = s.create_drive(organizer, early).await.unwrap();
  assert_eq!(first.event_id, 1);
  assert_eq!(second.event_id, 2);
  assert_eq!(first.organizer_id, Some(organizer));

  let drives = s.list_drives().await.unwrap();
  let places: Vec<_> = drives.iter().map(|d| d.location.as_str()).collect();
  assert_eq!(places, ["Gym", "Library"]);
}

#[tokio::test]
async fn request_is_stamped_with_requester_and_today() {
  let s = store().await;
  let requester = s
    .register(person("Rae", "rae@example.com", Classification::Recipient))
    .await
    .unwrap();

  let request = s
    .create_request(requester, NewBloodRequest {
      blood_type: BloodType::AbPositive,
      units:      Units::new(3).unwrap(),
    })
    .await
    .unwrap();

  assert_eq!(request.request_id, 1);
  assert_eq!(request.requester_id, Some(requester));
  assert_eq!(request.units.get(), 3);
  assert_eq!(request.request_date, chrono::Utc::now().date_naive());
}

// ─── Donations, history and reports ──────────────────────────────────────────

#[tokio::test]
async fn donation_creates_a_bag_in_the_same_write() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();

  let recorded = s
    .record_donation(NewDonation {
      donor_id: id,
      event_id: None,
      units:    Units::new(2).unwrap(),
      date:     date(2026, 3, 1),
    })
    .await
    .unwrap();
  assert_eq!(recorded.donation_id, 1);
  assert_eq!(recorded.bag_id, 1);

  let history = s.donations_by_donor(id).await.unwrap();
  assert_eq!(history.len(), 1);
  assert_eq!(history[0].units, 2);
  assert_eq!(history[0].donation_date, date(2026, 3, 1));
}

#[tokio::test]
async fn donation_for_unknown_donor_or_drive_writes_nothing() {
  let s = store().await;
  let id = s.register(donor("Alice", "alice@example.com")).await.unwrap();

  let err = s
    .record_donation(NewDonation {
      donor_id: 99,
      event_id: None,
      units:    Units::new(1).unwrap(),
      date:     date(2026, 3, 1),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(lifeblood_core::Error::PersonNotFound(99))));

  let err = s
    .record_donation(NewDonation {
      donor_id: id,
      event_id: Some(5),
      units:    Units::new(1).unwrap(),
      date:     date(2026, 3, 1),
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(lifeblood_core::Error::DriveNotFound(5))));

  assert_eq!(s.count_all("donation").await, 0);
  assert_eq!(s.count_all("bag").await, 0);
}

#[tokio::test]
async fn recipient_history_lists_only_their_bags() {
  let s = store().await;
  let giver = s.register(donor("Alice", "alice@example.com")).await.unwrap();
  let rae = s
    .register(person("Rae", "rae@example.com", Classification::Recipient))
    .await
    .unwrap();
  let sam = s
    .register(person("Sam", "sam@example.com", Classification::Recipient))
    .await
    .unwrap();

  let mut bags = Vec::new();
  for day in [1, 2] {
    let recorded = s
      .record_donation(NewDonation {
        donor_id: giver,
        event_id: None,
        units:    Units::new(1).unwrap(),
        date:     date(2026, 3, day),
      })
      .await
      .unwrap();
    bags.push(recorded.bag_id);
  }

  assert!(s.allocate_bag(bags[0], rae).await.unwrap());
  assert!(s.allocate_bag(bags[1], sam).await.unwrap());
  assert!(!s.allocate_bag(77, rae).await.unwrap());

  let received = s.bags_received_by(rae).await.unwrap();
  assert_eq!(received.len(), 1);
  assert_eq!(received[0].bag_id, bags[0]);
  assert_eq!(received[0].blood_type, Some(BloodType::ONegative));
  assert_eq!(received[0].donation_date, date(2026, 3, 1));
}

#[tokio::test]
async fn allocating_to_unknown_recipient_fails() {
  let s = store().await;
  let giver = s.register(donor("Alice", "alice@example.com")).await.unwrap();
  let recorded = s
    .record_donation(NewDonation {
      donor_id: giver,
      event_id: None,
      units:    Units::new(1).unwrap(),
      date:     date(2026, 3, 1),
    })
    .await
    .unwrap();

  let err = s.allocate_bag(recorded.bag_id, 404).await.unwrap_err();
  assert!(matches!(err, Error::Core(lifeblood_core::Error::PersonNotFound(404))));
}

#[tokio::test]
async fn blood_type_report_is_empty_without_donations() {
  let s = store().await;
  s.register(donor("Alice", "alice@example.com")).await.unwrap();
  assert!(s.donations_by_blood_type().await.unwrap().is_empty());
  assert!(s.donations_by_event().await.unwrap().is_empty());
  assert!(s.payments().await.unwrap().is_empty());
}

#[tokio::test]
async fn reports_aggregate_units() {
  let s = store().await;
  let mut a = donor("Alice", "alice@example.com");
  a.blood_type = BloodType::APositive;
  let alice = s.register(a).await.unwrap();
  let bob = s.register(donor("Bob", "bob@example.com")).await.unwrap();

  let hall = s
    .create_drive(alice, NewDrive::new(date(2026, 3, 1), date(2026, 3, 2), "Hall".into()).unwrap())
    .await
    .unwrap();
  let empty = s
    .create_drive(alice, NewDrive::new(date(2026, 4, 1), date(2026, 4, 1), "Park".into()).unwrap())
    .await
    .unwrap();

  for (donor_id, units, event_id) in [
    (alice, 2, Some(hall.event_id)),
    (alice, 1, None),
    (bob, 3, Some(hall.event_id)),
  ] {
    s.record_donation(NewDonation {
      donor_id,
      event_id,
      units: Units::new(units).unwrap(),
      date: date(2026, 3, 1),
    })
    .await
    .unwrap();
  }

  let by_type = s.donations_by_blood_type().await.unwrap();
  assert_eq!(by_type.len(), 2);
  let a_pos = by_type.iter().find(|t| t.blood_type == BloodType::APositive).unwrap();
  let o_neg = by_type.iter().find(|t| t.blood_type == BloodType::ONegative).unwrap();
  assert_eq!(a_pos.total_units, 3);
  assert_eq!(o_neg.total_units, 3);

  let by_event = s.donations_by_event().await.unwrap();
  assert_eq!(by_event.len(), 2);
  assert_eq!(by_event[0].event_id, hall.event_id);
  assert_eq!(by_event[0].total_units, 5);
  assert_eq!(by_event[1].event_id, empty.event_id);
  assert_eq!(by_event[1].location, "Park");
  assert_eq!(by_event[1].total_units, 0);
}

#[tokio::test]
async fn recent_bags_respect_the_cutoff() {
  let s = store().await;
  let giver = s.register(donor("Alice", "alice@example.com")).await.unwrap();

  for day in [1, 15, 28] {
    s.record_donation(NewDonation {
      donor_id: giver,
      event_id: None,
      units:    Units::new(1).unwrap(),
      date:     date(2026, 2, day),
    })
    .await
    .unwrap();
  }

  let recent = s.bags_received_since(date(2026, 2, 15)).await.unwrap();
  let dates: Vec<_> = recent.iter().map(|b| b.received_date).collect();
  assert_eq!(dates, [date(2026, 2, 28), date(2026, 2, 15)]);
}

#[tokio::test]
async fn payments_round_trip() {
  let s = store().await;
  let giver = s.register(donor("Alice", "alice@example.com")).await.unwrap();

  let payment = s
    .record_payment(NewPayment::new(giver, 25.5, date(2026, 3, 4)).unwrap())
    .await
    .unwrap();
  assert_eq!(payment.payment_id, 1);

  let all = s.payments().await.unwrap();
  assert_eq!(all, vec![payment]);

  let err = s
    .record_payment(NewPayment::new(404, 1.0, date(2026, 3, 4)).unwrap())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(lifeblood_core::Error::PersonNotFound(404))));
}
