// ==========================================
// SQLite connection initialization
// ==========================================
// Goals:
// - unify PRAGMA behavior across every Connection::open call
// - unify busy_timeout to reduce spurious busy errors under
//   concurrent imports
// - bootstrap the user store schema
// ==========================================

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

/// Default busy_timeout (milliseconds)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply the unified PRAGMA set to a connection.
///
/// foreign_keys and busy_timeout are per-connection settings and must be
/// applied to every connection the process opens.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a SQLite connection with the unified configuration applied.
pub fn open_sqlite_connection(db_path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create the user store tables when they do not exist yet.
///
/// The `users` table enforces the two storage-layer safety nets the import
/// relies on: a case-insensitive unique email and a unique member_id. The
/// `member_id_sequence` table is the single-row counter backing atomic
/// form-number reservation.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT NOT NULL COLLATE NOCASE UNIQUE,
            password TEXT NOT NULL,
            phone TEXT NOT NULL DEFAULT '',
            department TEXT,
            session TEXT,
            usertype TEXT NOT NULL DEFAULT 'user',
            gender TEXT NOT NULL DEFAULT 'other',
            class_roll TEXT,
            father_name TEXT,
            mother_name TEXT,
            current_address TEXT,
            permanent_address TEXT,
            blood_group TEXT,
            date_of_birth TEXT,
            transaction_id TEXT,
            to_account TEXT,
            skills TEXT,
            member_id TEXT UNIQUE,
            is_approved INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS member_id_sequence (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            last_form_number INTEGER NOT NULL
        );
        "#,
    )
}
