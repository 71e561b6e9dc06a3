// ==========================================
// User records
// ==========================================
// NewUser: the persistable record an accepted import row
//          materializes into
// PersistedUser: a stored row read back from the user table
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A user record ready for insertion.
///
/// Built only from rows that passed the commit-time re-validation, so the
/// required fields are plain strings here. `password` carries the bcrypt
/// hash, never the raw value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub department: Option<String>,
    pub session: Option<String>,
    pub usertype: String,
    pub gender: String,
    pub class_roll: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub current_address: Option<String>,
    pub permanent_address: Option<String>,
    pub blood_group: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub transaction_id: Option<String>,
    pub to_account: Option<String>,
    pub skills: Option<String>,
    pub member_id: Option<String>,
    /// Imported members bypass the approval queue.
    pub is_approved: bool,

    /// Source spreadsheet row, carried for failure reporting. Not persisted.
    #[serde(skip)]
    pub row_number: usize,
}

/// A stored user row, as read back from the user table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub member_id: Option<String>,
    pub department: Option<String>,
    pub session: Option<String>,
    pub is_approved: bool,
}
