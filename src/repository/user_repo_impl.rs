// ==========================================
// User repository SQLite implementation
// ==========================================
// Single shared connection behind a mutex. The form-number
// counter lives in its own single-row table and is only ever
// advanced inside a transaction, so reserved ranges never
// overlap. Chunk insertion wraps each row in a savepoint.
// ==========================================

use crate::db;
use crate::domain::{NewUser, PersistedUser};
use crate::importer::member_id::SEQUENCE_SEED;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::user_repo::{ChunkOutcome, StorageFailure, UserRepository};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

pub struct UserRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepositoryImpl {
    /// Open (or create) the database file and prepare the schema and the
    /// form-number counter.
    pub fn new(db_path: &Path) -> RepositoryResult<Self> {
        let conn = db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        db::init_schema(&conn)?;
        Self::seed_form_counter(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store, for tests.
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        db::configure_sqlite_connection(&conn)?;
        db::init_schema(&conn)?;
        Self::seed_form_counter(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Seed the counter from the most recently stored member ID (its
    /// trailing four digits are the form number), falling back to the
    /// fixed starting point for an empty store. INSERT OR IGNORE keeps
    /// an already-seeded counter untouched.
    fn seed_form_counter(conn: &Connection) -> RepositoryResult<()> {
        let latest: Option<String> = conn
            .query_row(
                "SELECT member_id FROM users
                 WHERE member_id IS NOT NULL
                 ORDER BY id DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;

        let seed = latest
            .as_deref()
            .filter(|id| id.len() >= 4)
            .and_then(|id| id[id.len() - 4..].parse::<u32>().ok())
            .unwrap_or(SEQUENCE_SEED);

        conn.execute(
            "INSERT OR IGNORE INTO member_id_sequence (id, last_form_number) VALUES (1, ?1)",
            params![seed],
        )?;

        Ok(())
    }

    fn row_to_persisted_user(row: &Row<'_>) -> rusqlite::Result<PersistedUser> {
        Ok(PersistedUser {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            member_id: row.get(3)?,
            department: row.get(4)?,
            session: row.get(5)?,
            is_approved: row.get(6)?,
        })
    }

    fn insert_user(conn: &Connection, user: &NewUser) -> rusqlite::Result<i64> {
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO users (
                name, email, password, phone, department, session,
                usertype, gender, class_roll, father_name, mother_name,
                current_address, permanent_address, blood_group,
                date_of_birth, transaction_id, to_account, skills,
                member_id, is_approved, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11,
                ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22
            )",
            params![
                user.name,
                user.email,
                user.password,
                user.phone,
                user.department,
                user.session,
                user.usertype,
                user.gender,
                user.class_roll,
                user.father_name,
                user.mother_name,
                user.current_address,
                user.permanent_address,
                user.blood_group,
                user.date_of_birth,
                user.transaction_id,
                user.to_account,
                user.skills,
                user.member_id,
                user.is_approved,
                now,
                now,
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn email_exists(&self, email: &str) -> RepositoryResult<bool> {
        let conn = self.lock()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
            params![email.trim()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn filter_existing_emails(
        &self,
        emails: Vec<String>,
    ) -> RepositoryResult<HashSet<String>> {
        if emails.is_empty() {
            return Ok(HashSet::new());
        }

        let conn = self.lock()?;
        let normalized: Vec<String> = emails
            .iter()
            .map(|e| e.trim().to_lowercase())
            .collect();

        let placeholders = vec!["?"; normalized.len()].join(", ");
        let sql = format!(
            "SELECT lower(email) FROM users WHERE email IN ({})",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let found = stmt
            .query_map(params_from_iter(normalized.iter()), |row| {
                row.get::<_, String>(0)
            })?
            .collect::<Result<HashSet<String>, _>>()?;

        Ok(found)
    }

    async fn last_form_number(&self) -> RepositoryResult<u32> {
        let conn = self.lock()?;
        let last: u32 = conn.query_row(
            "SELECT last_form_number FROM member_id_sequence WHERE id = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(last)
    }

    #[instrument(skip(self))]
    async fn reserve_form_numbers(&self, count: u32) -> RepositoryResult<u32> {
        if count == 0 {
            return Err(RepositoryError::InternalError(
                "cannot reserve zero form numbers".to_string(),
            ));
        }

        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute(
            "UPDATE member_id_sequence SET last_form_number = last_form_number + ?1 WHERE id = 1",
            params![count],
        )?;

        let new_last: u32 = tx.query_row(
            "SELECT last_form_number FROM member_id_sequence WHERE id = 1",
            [],
            |row| row.get(0),
        )?;

        tx.commit()?;

        let first = new_last - count + 1;
        debug!(count, first, "reserved form numbers");
        Ok(first)
    }

    #[instrument(skip(self, users), fields(chunk_len = users.len()))]
    async fn insert_users_chunk(&self, users: Vec<NewUser>) -> RepositoryResult<ChunkOutcome> {
        let conn = self.lock()?;
        let mut tx = conn.unchecked_transaction()?;
        let mut outcome = ChunkOutcome::default();

        for user in &users {
            let mut sp = tx.savepoint()?;

            match Self::insert_user(&sp, user) {
                Ok(id) => {
                    sp.commit()?;
                    outcome.inserted.push(PersistedUser {
                        id,
                        name: user.name.clone(),
                        email: user.email.clone(),
                        member_id: user.member_id.clone(),
                        department: user.department.clone(),
                        session: user.session.clone(),
                        is_approved: user.is_approved,
                    });
                }
                Err(e) => {
                    sp.rollback()?;
                    outcome.failures.push(StorageFailure {
                        row_number: user.row_number,
                        message: RepositoryError::from(e).to_string(),
                    });
                }
            }
        }

        tx.commit()?;

        debug!(
            inserted = outcome.inserted.len(),
            failed = outcome.failures.len(),
            "chunk stored"
        );
        Ok(outcome)
    }

    async fn count_users(&self) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<PersistedUser>> {
        let conn = self.lock()?;
        let user = conn
            .query_row(
                "SELECT id, name, email, member_id, department, session, is_approved
                 FROM users WHERE email = ?1",
                params![email.trim()],
                Self::row_to_persisted_user,
            )
            .optional()?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(row_number: usize, email: &str, member_id: Option<&str>) -> NewUser {
        NewUser {
            name: format!("User {}", row_number),
            email: email.to_string(),
            password: "$2b$04$hashhashhashhashhashha".to_string(),
            phone: "8801712345678".to_string(),
            department: Some("Statistics".to_string()),
            session: Some("2023-24".to_string()),
            usertype: "user".to_string(),
            gender: "other".to_string(),
            class_roll: None,
            father_name: None,
            mother_name: None,
            current_address: None,
            permanent_address: None,
            blood_group: None,
            date_of_birth: None,
            transaction_id: None,
            to_account: None,
            skills: None,
            member_id: member_id.map(str::to_string),
            is_approved: true,
            row_number,
        }
    }

    #[tokio::test]
    async fn test_counter_seeded_for_empty_store() {
        let repo = UserRepositoryImpl::open_in_memory().unwrap();
        assert_eq!(repo.last_form_number().await.unwrap(), SEQUENCE_SEED);
    }

    #[tokio::test]
    async fn test_reserve_form_numbers_advances_atomically() {
        let repo = UserRepositoryImpl::open_in_memory().unwrap();

        let first = repo.reserve_form_numbers(3).await.unwrap();
        assert_eq!(first, 1130);

        let next = repo.reserve_form_numbers(2).await.unwrap();
        assert_eq!(next, 1133);
        assert_eq!(repo.last_form_number().await.unwrap(), 1134);
    }

    #[tokio::test]
    async fn test_counter_seeded_from_latest_member_id() {
        let repo = UserRepositoryImpl::open_in_memory().unwrap();
        repo.insert_users_chunk(vec![user(2, "a@example.com", Some("24242205"))])
            .await
            .unwrap();

        // Re-run the seeding path as a fresh open would.
        {
            let conn = repo.lock().unwrap();
            conn.execute("DELETE FROM member_id_sequence", []).unwrap();
            UserRepositoryImpl::seed_form_counter(&conn).unwrap();
        }

        assert_eq!(repo.last_form_number().await.unwrap(), 2205);
    }

    #[tokio::test]
    async fn test_email_exists_is_case_insensitive() {
        let repo = UserRepositoryImpl::open_in_memory().unwrap();
        repo.insert_users_chunk(vec![user(2, "Alice@Example.com", None)])
            .await
            .unwrap();

        assert!(repo.email_exists("alice@example.com").await.unwrap());
        assert!(repo.email_exists("ALICE@EXAMPLE.COM").await.unwrap());
        assert!(!repo.email_exists("bob@example.com").await.unwrap());
    }

    #[tokio::test]
    async fn test_filter_existing_emails() {
        let repo = UserRepositoryImpl::open_in_memory().unwrap();
        repo.insert_users_chunk(vec![
            user(2, "alice@example.com", None),
            user(3, "bob@example.com", None),
        ])
        .await
        .unwrap();

        let found = repo
            .filter_existing_emails(vec![
                "ALICE@example.com".to_string(),
                "carol@example.com".to_string(),
            ])
            .await
            .unwrap();

        assert!(found.contains("alice@example.com"));
        assert!(!found.contains("carol@example.com"));
    }

    #[tokio::test]
    async fn test_chunk_insert_isolates_failed_rows() {
        let repo = UserRepositoryImpl::open_in_memory().unwrap();

        let outcome = repo
            .insert_users_chunk(vec![
                user(2, "alice@example.com", Some("24241130")),
                user(3, "alice@example.com", Some("24241131")), // duplicate email
                user(4, "bob@example.com", Some("24241132")),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.inserted.len(), 2);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].row_number, 3);
        assert!(outcome.failures[0].message.contains("users.email"));
        assert_eq!(repo.count_users().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_member_id_reported_per_row() {
        let repo = UserRepositoryImpl::open_in_memory().unwrap();

        let outcome = repo
            .insert_users_chunk(vec![
                user(2, "alice@example.com", Some("24241130")),
                user(3, "bob@example.com", Some("24241130")),
            ])
            .await
            .unwrap();

        assert_eq!(outcome.inserted.len(), 1);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].message.contains("users.member_id"));
    }

    #[tokio::test]
    async fn test_find_by_email_roundtrip() {
        let repo = UserRepositoryImpl::open_in_memory().unwrap();
        repo.insert_users_chunk(vec![user(2, "alice@example.com", Some("24241130"))])
            .await
            .unwrap();

        let stored = repo.find_by_email("alice@example.com").await.unwrap();
        let stored = stored.expect("user should exist");
        assert_eq!(stored.member_id.as_deref(), Some("24241130"));
        assert!(stored.is_approved);

        assert!(repo.find_by_email("nobody@example.com").await.unwrap().is_none());
    }
}
