// ==========================================
// Membership Import Core
// ==========================================
// Pipeline: parse -> map -> clean -> validate -> duplicate detection
//           -> member-id issuance -> chunked transactional persistence
// Stack: Rust + SQLite
// ==========================================

// ==========================================
// Module declarations
// ==========================================

// Domain layer - records and result types
pub mod domain;

// Repository layer - user store access
pub mod repository;

// Import layer - spreadsheet pipeline
pub mod importer;

// Configuration layer
pub mod config;

// Database infrastructure (connection init / unified PRAGMAs / schema)
pub mod db;

// Logging
pub mod logging;

// ==========================================
// Re-exports
// ==========================================

pub use config::ImportConfig;

pub use domain::{
    BatchReport, FailedRow, ImportPreview, ImportRow, ImportStatistics, NewUser, PersistedUser,
    Severity, ValidationError,
};

pub use importer::{
    CancelFlag, CsvParser, DepartmentCodeRegistry, ExcelParser, FieldMapper, FileParser,
    ImportError, ImportResult, MemberIdGenerator, RowValidator, UniversalFileParser, UserImporter,
    UserImporterImpl,
};

pub use repository::{
    ChunkOutcome, RepositoryError, RepositoryResult, StorageFailure, UserRepository,
    UserRepositoryImpl,
};

// ==========================================
// Constants
// ==========================================

// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Application name
pub const APP_NAME: &str = "Membership Import";
