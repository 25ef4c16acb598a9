//! [`SqliteStore`]: the SQLite implementation of [`BloodBankStore`].

use std::path::Path;

use chrono::{NaiveDate, Utc};
use rusqlite::OptionalExtension as _;

use lifeblood_core::{
  BagId, PersonId,
  donation::{
    DonationRecord, NewDonation, NewPayment, Payment, ReceivedBag,
    RecordedDonation,
  },
  drive::{BloodRequest, Drive, NewBloodRequest, NewDrive},
  identity::{Credential, Identity},
  person::{
    AccountType, Classification, NewPerson, PersonRecord, PersonSummary,
    PersonUpdate,
  },
  report::{BagRecord, BloodTypeTotal, EventTotal},
  store::BloodBankStore,
};

use crate::{
  Error, Result,
  encode::{
    RawBag, RawBloodTypeTotal, RawCredential, RawDonation, RawDrive,
    RawPayment, RawPerson, RawReceivedBag, RawRequest, RawSummary,
    encode_date,
  },
  schema::SCHEMA,
};

/// Child tables first, `person` last, so foreign keys hold at every step.
/// A fixed list: table names are never built from input.
const REMOVE_PERSON: [&str; 6] = [
  "DELETE FROM auth WHERE id = ?1",
  "DELETE FROM donor WHERE id = ?1",
  "DELETE FROM recipient WHERE id = ?1",
  "DELETE FROM disease_history WHERE id = ?1",
  "DELETE FROM \"user\" WHERE id = ?1",
  "DELETE FROM person WHERE id = ?1",
];

fn marker_insert(classification: Classification) -> &'static str {
  match classification {
    Classification::Donor => "INSERT INTO donor (id) VALUES (?1)",
    Classification::Recipient => "INSERT INTO recipient (id) VALUES (?1)",
  }
}

fn insert_diseases(
  tx: &rusqlite::Transaction<'_>,
  id: PersonId,
  diseases: &[String],
) -> rusqlite::Result<()> {
  let mut stmt =
    tx.prepare("INSERT INTO disease_history (id, disease) VALUES (?1, ?2)")?;
  for disease in diseases {
    stmt.execute(rusqlite::params![id, disease])?;
  }
  Ok(())
}

fn person_exists(conn: &rusqlite::Connection, id: PersonId) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM person WHERE id = ?1",
        rusqlite::params![id],
        |_| Ok(()),
      )
      .optional()?
      .is_some(),
  )
}

/// `true` if a write was refused by a `UNIQUE` constraint; the only one a
/// caller can trip is `auth.username`.
fn is_unique_violation(e: &tokio_rusqlite::Error) -> bool {
  matches!(
    e,
    tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, _))
      if f.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

const CREDENTIAL_SELECT: &str = "SELECT a.id, a.username, a.password, a.role, p.name,
        d.id IS NOT NULL, r.id IS NOT NULL
 FROM auth a
 JOIN person p         ON p.id = a.id
 LEFT JOIN donor d     ON d.id = a.id
 LEFT JOIN recipient r ON r.id = a.id";

fn credential_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawCredential> {
  Ok(RawCredential {
    person_id:     row.get(0)?,
    username:      row.get(1)?,
    password_hash: row.get(2)?,
    role:          row.get(3)?,
    display_name:  row.get(4)?,
    is_donor:      row.get(5)?,
    is_recipient:  row.get(6)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A blood bank store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// are serialised on the connection's thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Count the rows of `table` that belong to person `id`. Test-only view
  /// into the raw tables.
  #[cfg(test)]
  pub(crate) async fn count_rows(&self, table: &'static str, id: PersonId) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?1");
    self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params![id], |r| r.get(0))?)
      })
      .await
      .unwrap()
  }

  /// Total rows in `table`. Test-only.
  #[cfg(test)]
  pub(crate) async fn count_all(&self, table: &'static str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {table}");
    self
      .conn
      .call(move |conn| Ok(conn.query_row(&sql, [], |r| r.get(0))?))
      .await
      .unwrap()
  }
}

// ─── BloodBankStore impl ─────────────────────────────────────────────────────

impl BloodBankStore for SqliteStore {
  type Error = Error;

  // ── Credentials ───────────────────────────────────────────────────────────

  async fn find_credential(&self, username: &str) -> Result<Option<Credential>> {
    let username = username.to_owned();

    let raw: Option<RawCredential> = self
      .conn
      .call(move |conn| {
        let sql = format!("{CREDENTIAL_SELECT} WHERE a.username = ?1");
        Ok(conn
          .query_row(&sql, rusqlite::params![username], credential_row)
          .optional()?)
      })
      .await?;

    raw.map(RawCredential::into_credential).transpose()
  }

  async fn set_account_type(
    &self,
    username: &str,
    account_type: AccountType,
  ) -> Result<bool> {
    let username = username.to_owned();
    let role = account_type.as_str();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE auth SET role = ?1 WHERE username = ?2",
          rusqlite::params![role, username],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn identity(&self, id: PersonId) -> Result<Option<Identity>> {
    let raw: Option<RawCredential> = self
      .conn
      .call(move |conn| {
        let sql = format!("{CREDENTIAL_SELECT} WHERE a.id = ?1");
        Ok(conn
          .query_row(&sql, rusqlite::params![id], credential_row)
          .optional()?)
      })
      .await?;

    Ok(raw.map(RawCredential::into_credential).transpose()?.map(Identity::from))
  }

  // ── Person registry ───────────────────────────────────────────────────────

  async fn register(&self, person: NewPerson) -> Result<PersonId> {
    let email = person.email.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO person (name, address, phone, email, dob)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            person.name,
            person.address,
            person.phone,
            person.email,
            encode_date(person.dob),
          ],
        )?;
        let id = tx.last_insert_rowid();

        tx.execute(
          "INSERT INTO \"user\" (id, bloodtype, weight) VALUES (?1, ?2, ?3)",
          rusqlite::params![id, person.blood_type.as_str(), person.weight.get()],
        )?;

        tx.execute(
          "INSERT INTO auth (id, username, password, role) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            id,
            person.email,
            person.password_hash,
            AccountType::User.as_str(),
          ],
        )?;

        insert_diseases(&tx, id, &person.diseases)?;
        tx.execute(marker_insert(person.classification), rusqlite::params![id])?;

        tx.commit()?;
        Ok(id)
      })
      .await;

    match outcome {
      Ok(id) => {
        tracing::debug!(person_id = id, "person rows committed");
        Ok(id)
      }
      Err(e) if is_unique_violation(&e) => {
        Err(lifeblood_core::Error::UsernameTaken(email).into())
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<PersonRecord>> {
    let found: Option<(RawPerson, Vec<String>)> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            "SELECT p.id, p.name, p.address, p.phone, p.email, p.dob,
                    u.bloodtype, u.weight, a.role,
                    d.id IS NOT NULL, r.id IS NOT NULL
             FROM person p
             JOIN \"user\" u       ON u.id = p.id
             JOIN auth a           ON a.id = p.id
             LEFT JOIN donor d     ON d.id = p.id
             LEFT JOIN recipient r ON r.id = p.id
             WHERE p.id = ?1",
            rusqlite::params![id],
            |row| {
              Ok(RawPerson {
                id:           row.get(0)?,
                name:         row.get(1)?,
                address:      row.get(2)?,
                phone:        row.get(3)?,
                email:        row.get(4)?,
                dob:          row.get(5)?,
                blood_type:   row.get(6)?,
                weight:       row.get(7)?,
                role:         row.get(8)?,
                is_donor:     row.get(9)?,
                is_recipient: row.get(10)?,
              })
            },
          )
          .optional()?;

        let Some(raw) = raw else { return Ok(None) };

        let mut stmt = conn.prepare(
          "SELECT disease FROM disease_history WHERE id = ?1 ORDER BY rowid",
        )?;
        let diseases = stmt
          .query_map(rusqlite::params![id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<String>>>()?;

        Ok(Some((raw, diseases)))
      })
      .await?;

    found
      .map(|(raw, diseases)| raw.into_record(&diseases))
      .transpose()
  }

  async fn list_persons(&self) -> Result<Vec<PersonSummary>> {
    let raws: Vec<RawSummary> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT p.id, p.name, p.address, p.email, u.bloodtype,
                  (SELECT GROUP_CONCAT(h.disease, ', ')
                     FROM disease_history h WHERE h.id = p.id),
                  a.role, d.id IS NOT NULL, r.id IS NOT NULL
           FROM person p
           JOIN \"user\" u       ON u.id = p.id
           JOIN auth a           ON a.id = p.id
           LEFT JOIN donor d     ON d.id = p.id
           LEFT JOIN recipient r ON r.id = p.id
           ORDER BY p.id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawSummary {
              id:           row.get(0)?,
              name:         row.get(1)?,
              address:      row.get(2)?,
              email:        row.get(3)?,
              blood_type:   row.get(4)?,
              diseases:     row.get(5)?,
              role:         row.get(6)?,
              is_donor:     row.get(7)?,
              is_recipient: row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn update_person(&self, id: PersonId, update: PersonUpdate) -> Result<bool> {
    let email = update.email.clone();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if !person_exists(&tx, id)? {
          return Ok(false);
        }

        tx.execute(
          "UPDATE person SET address = ?1, email = ?2 WHERE id = ?3",
          rusqlite::params![update.address, update.email, id],
        )?;
        // The username is the email; keep them in step.
        tx.execute(
          "UPDATE auth SET username = ?1 WHERE id = ?2",
          rusqlite::params![update.email, id],
        )?;
        tx.execute(
          "UPDATE \"user\" SET weight = ?1 WHERE id = ?2",
          rusqlite::params![update.weight.get(), id],
        )?;
        if let Some(blood_type) = update.blood_type {
          tx.execute(
            "UPDATE \"user\" SET bloodtype = ?1 WHERE id = ?2",
            rusqlite::params![blood_type.as_str(), id],
          )?;
        }
        if let Some(classification) = update.classification {
          tx.execute("DELETE FROM donor WHERE id = ?1", rusqlite::params![id])?;
          tx.execute("DELETE FROM recipient WHERE id = ?1", rusqlite::params![id])?;
          tx.execute(marker_insert(classification), rusqlite::params![id])?;
        }

        tx.execute(
          "DELETE FROM disease_history WHERE id = ?1",
          rusqlite::params![id],
        )?;
        insert_diseases(&tx, id, &update.diseases)?;

        tx.commit()?;
        Ok(true)
      })
      .await;

    match outcome {
      Ok(found) => Ok(found),
      Err(e) if is_unique_violation(&e) => {
        Err(lifeblood_core::Error::UsernameTaken(email).into())
      }
      Err(e) => Err(e.into()),
    }
  }

  async fn remove_person(&self, id: PersonId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for sql in REMOVE_PERSON {
          tx.execute(sql, rusqlite::params![id])?;
        }
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Drives and requests ───────────────────────────────────────────────────

  async fn create_drive(&self, organizer: PersonId, drive: NewDrive) -> Result<Drive> {
    let start = encode_date(drive.start_date);
    let end = encode_date(drive.end_date);
    let location = drive.location.clone();

    let event_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO event (start_date, end_date, location, organizer_id)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![start, end, location, organizer],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Drive {
      event_id,
      start_date: drive.start_date,
      end_date: drive.end_date,
      location: drive.location,
      organizer_id: Some(organizer),
    })
  }

  async fn list_drives(&self) -> Result<Vec<Drive>> {
    let raws: Vec<RawDrive> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT event_id, start_date, end_date, location, organizer_id
           FROM event ORDER BY start_date, event_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawDrive {
              event_id:     row.get(0)?,
              start_date:   row.get(1)?,
              end_date:     row.get(2)?,
              location:     row.get(3)?,
              organizer_id: row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDrive::into_drive).collect()
  }

  async fn create_request(
    &self,
    requester: PersonId,
    request: NewBloodRequest,
  ) -> Result<BloodRequest> {
    let today = encode_date(Utc::now().date_naive());
    let blood_type = request.blood_type.as_str();
    let units = request.units.get();

    let raw: RawRequest = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO request (bloodtype, units, requester_id, request_date)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![blood_type, units, requester, today],
        )?;
        Ok(RawRequest {
          request_id:   conn.last_insert_rowid(),
          blood_type:   blood_type.to_owned(),
          units,
          requester_id: Some(requester),
          request_date: today,
        })
      })
      .await?;

    raw.into_request()
  }

  // ── Donations ─────────────────────────────────────────────────────────────

  async fn record_donation(&self, donation: NewDonation) -> Result<RecordedDonation> {
    let date = encode_date(donation.date);
    let units = donation.units.get();

    let recorded = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if !person_exists(&tx, donation.donor_id)? {
          return Ok(Err(lifeblood_core::Error::PersonNotFound(donation.donor_id)));
        }
        if let Some(event_id) = donation.event_id {
          let known = tx
            .query_row(
              "SELECT 1 FROM event WHERE event_id = ?1",
              rusqlite::params![event_id],
              |_| Ok(()),
            )
            .optional()?;
          if known.is_none() {
            return Ok(Err(lifeblood_core::Error::DriveNotFound(event_id)));
          }
        }

        tx.execute(
          "INSERT INTO donation (donor_id, event_id, units, donation_date)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![donation.donor_id, donation.event_id, units, date],
        )?;
        let donation_id = tx.last_insert_rowid();

        tx.execute(
          "INSERT INTO bag (donation_id, received_date) VALUES (?1, ?2)",
          rusqlite::params![donation_id, date],
        )?;
        let bag_id = tx.last_insert_rowid();

        tx.commit()?;
        Ok(Ok(RecordedDonation { donation_id, bag_id }))
      })
      .await??;

    Ok(recorded)
  }

  async fn allocate_bag(&self, bag_id: BagId, recipient: PersonId) -> Result<bool> {
    let allocated = self
      .conn
      .call(move |conn| {
        if !person_exists(conn, recipient)? {
          return Ok(Err(lifeblood_core::Error::PersonNotFound(recipient)));
        }
        let changed = conn.execute(
          "UPDATE bag SET recipient_id = ?1 WHERE bag_id = ?2",
          rusqlite::params![recipient, bag_id],
        )?;
        Ok(Ok(changed > 0))
      })
      .await??;

    Ok(allocated)
  }

  async fn record_payment(&self, payment: NewPayment) -> Result<Payment> {
    let date = encode_date(payment.date);
    let NewPayment { donor_id, amount, .. } = payment;

    let payment_id = self
      .conn
      .call(move |conn| {
        if !person_exists(conn, donor_id)? {
          return Ok(Err(lifeblood_core::Error::PersonNotFound(donor_id)));
        }
        conn.execute(
          "INSERT INTO payments (donor_id, amount, payment_date) VALUES (?1, ?2, ?3)",
          rusqlite::params![donor_id, amount, date],
        )?;
        Ok(Ok(conn.last_insert_rowid()))
      })
      .await??;

    Ok(Payment {
      payment_id,
      donor_id: Some(donor_id),
      amount,
      date: payment.date,
    })
  }

  async fn donations_by_donor(&self, donor: PersonId) -> Result<Vec<DonationRecord>> {
    let raws: Vec<RawDonation> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT donation_id, event_id, units, donation_date
           FROM donation WHERE donor_id = ?1
           ORDER BY donation_date, donation_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![donor], |row| {
            Ok(RawDonation {
              donation_id:   row.get(0)?,
              event_id:      row.get(1)?,
              units:         row.get(2)?,
              donation_date: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDonation::into_record).collect()
  }

  async fn bags_received_by(&self, recipient: PersonId) -> Result<Vec<ReceivedBag>> {
    let raws: Vec<RawReceivedBag> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.bag_id, b.donation_id, u.bloodtype, d.units,
                  d.donation_date, b.received_date
           FROM bag b
           JOIN donation d    ON d.donation_id = b.donation_id
           LEFT JOIN \"user\" u ON u.id = d.donor_id
           WHERE b.recipient_id = ?1
           ORDER BY b.received_date, b.bag_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![recipient], |row| {
            Ok(RawReceivedBag {
              bag_id:        row.get(0)?,
              donation_id:   row.get(1)?,
              blood_type:    row.get(2)?,
              units:         row.get(3)?,
              donation_date: row.get(4)?,
              received_date: row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReceivedBag::into_received).collect()
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn bags_received_since(&self, since: NaiveDate) -> Result<Vec<BagRecord>> {
    let since = encode_date(since);

    let raws: Vec<RawBag> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT bag_id, donation_id, recipient_id, received_date
           FROM bag WHERE received_date >= ?1
           ORDER BY received_date DESC, bag_id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![since], |row| {
            Ok(RawBag {
              bag_id:        row.get(0)?,
              donation_id:   row.get(1)?,
              recipient_id:  row.get(2)?,
              received_date: row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBag::into_record).collect()
  }

  async fn donations_by_blood_type(&self) -> Result<Vec<BloodTypeTotal>> {
    let raws: Vec<RawBloodTypeTotal> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT u.bloodtype, SUM(d.units)
           FROM donation d
           JOIN \"user\" u ON u.id = d.donor_id
           GROUP BY u.bloodtype
           ORDER BY u.bloodtype",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawBloodTypeTotal {
              blood_type:  row.get(0)?,
              total_units: row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBloodTypeTotal::into_total).collect()
  }

  async fn donations_by_event(&self) -> Result<Vec<EventTotal>> {
    let totals = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT e.event_id, e.location, COALESCE(SUM(d.units), 0)
           FROM event e
           LEFT JOIN donation d ON d.event_id = e.event_id
           GROUP BY e.event_id, e.location
           ORDER BY e.event_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(EventTotal {
              event_id:    row.get(0)?,
              location:    row.get(1)?,
              total_units: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(totals)
  }

  async fn payments(&self) -> Result<Vec<Payment>> {
    let raws: Vec<RawPayment> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT payment_id, donor_id, amount, payment_date
           FROM payments ORDER BY payment_date, payment_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawPayment {
              payment_id: row.get(0)?,
              donor_id:   row.get(1)?,
              amount:     row.get(2)?,
              date:       row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPayment::into_payment).collect()
  }
}
