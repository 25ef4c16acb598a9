//! SQL schema for the Lifeblood SQLite store.
//!
//! Executed once at connection startup. Table and column names are shared
//! with the web client's existing database.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- AUTOINCREMENT: ids are never reused, even after the highest row is removed.
CREATE TABLE IF NOT EXISTS person (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL,
    address TEXT NOT NULL,
    phone   TEXT NOT NULL,
    email   TEXT NOT NULL,
    dob     TEXT NOT NULL                -- YYYY-MM-DD
);

CREATE TABLE IF NOT EXISTS \"user\" (
    id        INTEGER PRIMARY KEY REFERENCES person(id),
    bloodtype TEXT NOT NULL,
    weight    INTEGER NOT NULL CHECK (weight BETWEEN 0 AND 200)
);

-- role is the account type only: 'staff' | 'user'.
CREATE TABLE IF NOT EXISTS auth (
    id       INTEGER PRIMARY KEY REFERENCES person(id),
    username TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,              -- argon2 PHC string
    role     TEXT NOT NULL DEFAULT 'user'
);

-- No uniqueness: the same disease may be listed twice.
CREATE TABLE IF NOT EXISTS disease_history (
    id      INTEGER NOT NULL REFERENCES person(id),
    disease TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS donor (
    id INTEGER PRIMARY KEY REFERENCES person(id)
);

CREATE TABLE IF NOT EXISTS recipient (
    id INTEGER PRIMARY KEY REFERENCES person(id)
);

CREATE TABLE IF NOT EXISTS event (
    event_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    start_date   TEXT NOT NULL,
    end_date     TEXT NOT NULL,
    location     TEXT NOT NULL,
    organizer_id INTEGER REFERENCES person(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS request (
    request_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    bloodtype    TEXT NOT NULL,
    units        INTEGER NOT NULL CHECK (units > 0),
    requester_id INTEGER REFERENCES person(id) ON DELETE SET NULL,
    request_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS donation (
    donation_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    donor_id      INTEGER REFERENCES person(id) ON DELETE SET NULL,
    event_id      INTEGER REFERENCES event(event_id) ON DELETE SET NULL,
    units         INTEGER NOT NULL CHECK (units > 0),
    donation_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS bag (
    bag_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    donation_id   INTEGER NOT NULL REFERENCES donation(donation_id),
    recipient_id  INTEGER REFERENCES person(id) ON DELETE SET NULL,
    received_date TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payments (
    payment_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    donor_id     INTEGER REFERENCES person(id) ON DELETE SET NULL,
    amount       REAL NOT NULL CHECK (amount >= 0),
    payment_date TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS disease_history_id_idx ON disease_history(id);
CREATE INDEX IF NOT EXISTS donation_donor_idx     ON donation(donor_id);
CREATE INDEX IF NOT EXISTS bag_recipient_idx      ON bag(recipient_id);
CREATE INDEX IF NOT EXISTS bag_received_idx       ON bag(received_date);

PRAGMA user_version = 1;
";
