// ==========================================
// User repository interface
// ==========================================
// Storage seam for the import pipeline. Email lookups feed
// validation, the form-number counter feeds member ID
// generation, and chunk insertion carries per-row isolation:
// one bad row fails alone, the rest of the chunk lands.
// ==========================================

use crate::domain::{NewUser, PersistedUser};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;

/// One row that could not be stored during a chunk insert.
#[derive(Debug, Clone, Serialize)]
pub struct StorageFailure {
    pub row_number: usize,
    pub message: String,
}

/// Outcome of inserting one chunk of users.
#[derive(Debug, Default)]
pub struct ChunkOutcome {
    pub inserted: Vec<PersistedUser>,
    pub failures: Vec<StorageFailure>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Case-insensitive existence check for a single email.
    async fn email_exists(&self, email: &str) -> RepositoryResult<bool>;

    /// Which of the given emails already exist in the store
    /// (case-insensitive). Returned entries are lowercased.
    async fn filter_existing_emails(
        &self,
        emails: Vec<String>,
    ) -> RepositoryResult<HashSet<String>>;

    /// Current value of the form-number counter, without advancing it.
    async fn last_form_number(&self) -> RepositoryResult<u32>;

    /// Atomically advance the form-number counter by `count` and return
    /// the first reserved number. Two concurrent imports can never be
    /// handed overlapping ranges.
    async fn reserve_form_numbers(&self, count: u32) -> RepositoryResult<u32>;

    /// Insert a chunk of users, one savepoint per row. A constraint hit on
    /// one row rolls back that row only; the chunk transaction commits
    /// whatever succeeded.
    async fn insert_users_chunk(&self, users: Vec<NewUser>) -> RepositoryResult<ChunkOutcome>;

    /// Total stored users.
    async fn count_users(&self) -> RepositoryResult<i64>;

    /// Look up a stored user by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<PersistedUser>>;
}
