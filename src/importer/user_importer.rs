// ==========================================
// Import orchestration interface
// ==========================================
// Two-phase flow: parse_preview turns an uploaded file into a
// reviewable preview (nothing stored); import_batch stores the
// rows the caller approved, in chunks, re-validating each row
// against the live store first.
// ==========================================

use crate::domain::{BatchReport, ImportPreview, ImportRow};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Cooperative cancellation handle, checked between chunks. Completed
/// chunks stay committed; a cancelled import is reported, not undone.
pub type CancelFlag = Arc<AtomicBool>;

#[async_trait]
pub trait UserImporter: Send + Sync {
    /// Parse and validate a spreadsheet without storing anything.
    async fn parse_preview(&self, file_path: &Path) -> ImportResult<ImportPreview>;

    /// Store the given rows in chunks of `chunk_size`. Rows failing the
    /// commit-time re-validation are skipped and reported; they never
    /// abort the batch.
    async fn import_batch(
        &self,
        rows: Vec<ImportRow>,
        chunk_size: usize,
        cancel: Option<CancelFlag>,
    ) -> ImportResult<BatchReport>;
}
