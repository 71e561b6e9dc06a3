// ==========================================
// Domain layer - records and result types
// ==========================================

pub mod import;
pub mod user;

pub use import::{
    BatchReport, ColumnSpec, FailedRow, ImportPreview, ImportRow, ImportStatistics, Severity,
    ValidationError,
};
pub use user::{NewUser, PersistedUser};
