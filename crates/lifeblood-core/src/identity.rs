//! Credentials and the signed-in identity derived from them.

use serde::{Deserialize, Serialize};

use crate::{
  PersonId,
  person::{AccountType, Classification},
};

/// A stored credential joined with the bits of the person needed to start
/// a session.
#[derive(Debug, Clone)]
pub struct Credential {
  pub person_id:      PersonId,
  pub username:       String,
  /// Argon2 PHC string, e.g. `$argon2id$v=19$…`
  pub password_hash:  String,
  pub account_type:   AccountType,
  pub display_name:   String,
  pub classification: Classification,
}

/// Who the caller is. Created at sign-in and kept in the server-side
/// session; every self-scoped operation takes it explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub person_id:      PersonId,
  pub display_name:   String,
  pub account_type:   AccountType,
  pub classification: Classification,
}

impl Identity {
  pub fn is_staff(&self) -> bool { self.account_type == AccountType::Staff }
}

impl From<Credential> for Identity {
  fn from(c: Credential) -> Self {
    Self {
      person_id:      c.person_id,
      display_name:   c.display_name,
      account_type:   c.account_type,
      classification: c.classification,
    }
  }
}
