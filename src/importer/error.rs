// ==========================================
// Import layer error types
// ==========================================
// Tool: thiserror derive macros
// Validation findings are values (ValidationError),
// never variants here; this enum covers structural
// and infrastructure failures only.
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

/// Import layer error type
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== File errors =====
    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("unsupported file format: {0} (only .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("the file appears to be empty: {0}")]
    EmptyFile(String),

    #[error("file read failed: {0}")]
    FileReadError(String),

    #[error("Excel parse failed: {0}")]
    ExcelParseError(String),

    #[error("CSV parse failed: {0}")]
    CsvParseError(String),

    // ===== Business errors =====
    #[error("member id generation failed (row {row}): {message}")]
    MemberIdGeneration { row: usize, message: String },

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    // ===== Infrastructure =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<bcrypt::BcryptError> for ImportError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ImportError::PasswordHash(err.to_string())
    }
}

/// Result alias
pub type ImportResult<T> = Result<T, ImportError>;
