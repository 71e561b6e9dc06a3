// ==========================================
// Import orchestration implementation
// ==========================================
// Preview: parse -> map -> clean -> provisional member IDs ->
//          per-row validation -> in-file duplicate detection ->
//          store-level email check
// Commit:  chunked; every row is re-validated against the live
//          store, member IDs come from atomic counter
//          reservations, and a member-ID collision is retried
//          once with a fresh number before the row is reported
//          as failed.
// ==========================================

use crate::config::ImportConfig;
use crate::domain::{BatchReport, FailedRow, ImportPreview, ImportRow, NewUser, ValidationError};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::importer::member_id::MemberIdGenerator;
use crate::importer::row_validator::RowValidator;
use crate::importer::user_importer::{CancelFlag, UserImporter};
use crate::repository::{StorageFailure, UserRepository};
use async_trait::async_trait;
use futures::future;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct UserImporterImpl<R: UserRepository> {
    repo: Arc<R>,
    config: ImportConfig,
    file_parser: Box<dyn FileParser>,
    validator: RowValidator,
}

impl<R: UserRepository> UserImporterImpl<R> {
    pub fn new(repo: Arc<R>, config: ImportConfig) -> Self {
        Self {
            repo,
            config,
            file_parser: Box::new(UniversalFileParser),
            validator: RowValidator::new(),
        }
    }

    /// Swap the file decoder, mainly for tests that feed pre-built files.
    pub fn with_parser(mut self, parser: Box<dyn FileParser>) -> Self {
        self.file_parser = parser;
        self
    }

    /// Normalize cell values that later stages expect in canonical form.
    /// An unparseable date of birth is left as-is so validation can flag it.
    fn clean_row(row: &mut ImportRow) {
        if let Some(raw) = &row.date_of_birth {
            if let Some(date) = DataCleaner::parse_flexible_date(raw) {
                row.date_of_birth = Some(date.format("%Y-%m-%d").to_string());
            }
        }
    }

    /// Materialize an accepted row into a persistable record. The password
    /// falls back to the configured default and is always stored hashed.
    fn prepare_user(&self, row: &ImportRow) -> ImportResult<NewUser> {
        let raw_password = row
            .password
            .as_deref()
            .unwrap_or(&self.config.default_password);
        let password = bcrypt::hash(raw_password, self.config.bcrypt_cost)?;

        Ok(NewUser {
            name: row.name.clone().unwrap_or_default(),
            email: row.email.clone().unwrap_or_default(),
            password,
            phone: DataCleaner::normalize_phone(row.phone.as_deref().unwrap_or_default()),
            department: row.department.clone(),
            session: row.session.clone(),
            usertype: row
                .usertype
                .as_deref()
                .map(|t| t.trim().to_lowercase())
                .unwrap_or_else(|| "user".to_string()),
            gender: row
                .gender
                .as_deref()
                .map(|g| g.trim().to_lowercase())
                .unwrap_or_else(|| "other".to_string()),
            class_roll: row.class_roll.clone(),
            father_name: row.father_name.clone(),
            mother_name: row.mother_name.clone(),
            current_address: row.current_address.clone(),
            permanent_address: row.permanent_address.clone(),
            blood_group: row.blood_group.clone(),
            date_of_birth: row
                .date_of_birth
                .as_deref()
                .and_then(DataCleaner::parse_flexible_date),
            transaction_id: row.transaction_id.clone(),
            to_account: row.to_account.clone(),
            skills: row.skills.clone(),
            member_id: row.member_id.clone(),
            is_approved: true,
            row_number: row.row_number,
        })
    }

    /// Commit-time gate: the preview rules again, plus a live store check.
    /// The store may have changed between preview and commit.
    async fn revalidate_row(&self, row: &ImportRow) -> ImportResult<Vec<ValidationError>> {
        let mut findings = self.validator.validate_row(row);

        if let Some(email) = &row.email {
            if self.repo.email_exists(email).await? {
                findings.push(ValidationError::error(
                    row.row_number,
                    "email",
                    "Email already exists in the system",
                ));
            }
        }

        Ok(findings)
    }

    /// Reserve and assign member IDs for accepted rows that do not already
    /// carry one. Department and session survived validation, so composition
    /// only fails for rows that never had both to begin with; those keep a
    /// null member ID.
    async fn assign_member_ids(&self, rows: &mut [ImportRow]) -> ImportResult<()> {
        let pending: Vec<usize> = rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.member_id.is_none() && row.department.is_some() && row.session.is_some()
            })
            .map(|(idx, _)| idx)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        let first = self.repo.reserve_form_numbers(pending.len() as u32).await?;

        for (offset, idx) in pending.into_iter().enumerate() {
            let row = &mut rows[idx];
            let (department, session) = (
                row.department.as_deref().unwrap_or_default(),
                row.session.as_deref().unwrap_or_default(),
            );
            row.member_id =
                MemberIdGenerator::compose(department, session, first + offset as u32);
        }

        Ok(())
    }

    /// One attempt to recover from member-ID collisions: fresh numbers,
    /// recompose, reinsert. Rows that still fail are final failures.
    async fn retry_member_id_collisions(
        &self,
        rows: Vec<ImportRow>,
        report: &mut BatchReport,
    ) -> ImportResult<()> {
        warn!(count = rows.len(), "member ID collision, retrying with fresh numbers");

        let first = self.repo.reserve_form_numbers(rows.len() as u32).await?;
        let mut retry_users = Vec::new();

        for (offset, mut row) in rows.into_iter().enumerate() {
            let recomposed = match (&row.department, &row.session) {
                (Some(d), Some(s)) => MemberIdGenerator::compose(d, s, first + offset as u32),
                _ => None,
            };

            match recomposed {
                Some(id) => {
                    row.member_id = Some(id);
                    retry_users.push(self.prepare_user(&row)?);
                }
                None => {
                    report.failed_rows.push(FailedRow {
                        row: row.row_number,
                        errors: vec![ValidationError::error(
                            row.row_number,
                            "member_id",
                            "Member ID already exists and could not be regenerated",
                        )],
                    });
                }
            }
        }

        let outcome = self.repo.insert_users_chunk(retry_users).await?;
        report.imported += outcome.inserted.len();

        for failure in outcome.failures {
            Self::record_storage_failure(report, failure);
        }

        Ok(())
    }

    fn record_storage_failure(report: &mut BatchReport, failure: StorageFailure) {
        report.failed_rows.push(FailedRow {
            row: failure.row_number,
            errors: vec![ValidationError::error(
                failure.row_number,
                "database",
                failure.message,
            )],
        });
    }

    async fn commit_chunk(
        &self,
        chunk: &[ImportRow],
        report: &mut BatchReport,
    ) -> ImportResult<()> {
        // Re-validate every row against the live store.
        let findings_per_row =
            future::try_join_all(chunk.iter().map(|row| self.revalidate_row(row))).await?;

        let mut accepted: Vec<ImportRow> = Vec::with_capacity(chunk.len());
        for (row, findings) in chunk.iter().zip(findings_per_row) {
            if findings.iter().any(ValidationError::is_error) {
                report.failed_rows.push(FailedRow {
                    row: row.row_number,
                    errors: findings,
                });
            } else {
                accepted.push(row.clone());
            }
        }

        if accepted.is_empty() {
            return Ok(());
        }

        self.assign_member_ids(&mut accepted).await?;

        let mut users = Vec::with_capacity(accepted.len());
        for row in &accepted {
            users.push(self.prepare_user(row)?);
        }

        let outcome = self.repo.insert_users_chunk(users).await?;
        report.imported += outcome.inserted.len();

        // Member-ID collisions get one retry with fresh numbers; anything
        // else is a final per-row failure.
        let mut collisions = Vec::new();
        for failure in outcome.failures {
            if failure.message.contains("users.member_id") {
                if let Some(row) = accepted.iter().find(|r| r.row_number == failure.row_number) {
                    collisions.push(row.clone());
                    continue;
                }
            }
            Self::record_storage_failure(report, failure);
        }

        if !collisions.is_empty() {
            self.retry_member_id_collisions(collisions, report).await?;
        }

        Ok(())
    }
}

#[async_trait]
impl<R: UserRepository> UserImporter for UserImporterImpl<R> {
    #[instrument(skip(self), fields(file = %file_path.display()))]
    async fn parse_preview(&self, file_path: &Path) -> ImportResult<ImportPreview> {
        info!("parsing import file");
        let records = self.file_parser.parse_to_raw_records(file_path)?;

        if records.is_empty() {
            return Err(ImportError::EmptyFile(file_path.display().to_string()));
        }

        // Header is row 1; data rows start at 2.
        let mut rows: Vec<ImportRow> = records
            .into_iter()
            .enumerate()
            .map(|(idx, record)| FieldMapper::map_row(record, idx + 2))
            .collect();

        for row in &mut rows {
            Self::clean_row(row);
        }

        // Provisional member IDs: positional offsets above the current
        // counter. The authoritative numbers are reserved at commit time.
        let last_form_number = self.repo.last_form_number().await?;
        let provisional = MemberIdGenerator::generate_batch(&rows, last_form_number);
        for row in &mut rows {
            if row.member_id.is_none() {
                if let Some(id) = provisional.get(&row.row_id) {
                    row.member_id = Some(id.clone());
                }
            }
        }

        let mut errors = Vec::new();
        for row in &rows {
            errors.extend(self.validator.validate_row(row));
        }
        errors.extend(self.validator.check_duplicate_emails(&rows));

        // Store-level duplicates.
        let emails: Vec<String> = rows.iter().filter_map(|r| r.email.clone()).collect();
        let existing = self.repo.filter_existing_emails(emails).await?;
        for row in &rows {
            if let Some(email) = &row.email {
                if existing.contains(&email.trim().to_lowercase()) {
                    errors.push(ValidationError::error(
                        row.row_number,
                        "email",
                        "Email already exists in the system",
                    ));
                }
            }
        }

        let preview = ImportPreview::new(rows, errors);
        info!(
            total = preview.statistics.total_rows,
            valid = preview.statistics.valid_rows,
            errors = preview.statistics.total_errors,
            "preview ready"
        );
        Ok(preview)
    }

    #[instrument(skip(self, rows, cancel), fields(total = rows.len(), chunk_size))]
    async fn import_batch(
        &self,
        rows: Vec<ImportRow>,
        chunk_size: usize,
        cancel: Option<CancelFlag>,
    ) -> ImportResult<BatchReport> {
        let chunk_size = if chunk_size == 0 {
            self.config.chunk_size
        } else {
            chunk_size
        };

        let mut report = BatchReport {
            imported: 0,
            failed: 0,
            failed_rows: Vec::new(),
            total: rows.len(),
            cancelled: false,
        };

        info!(total = rows.len(), chunk_size, "starting import");

        for (chunk_index, chunk) in rows.chunks(chunk_size).enumerate() {
            if let Some(flag) = &cancel {
                if flag.load(Ordering::SeqCst) {
                    // Committed chunks stay committed.
                    report.cancelled = true;
                    warn!(chunk_index, "import cancelled between chunks");
                    break;
                }
            }

            debug!(chunk_index, rows = chunk.len(), "committing chunk");
            self.commit_chunk(chunk, &mut report).await?;
        }

        report.failed = report.failed_rows.len();
        info!(
            imported = report.imported,
            failed = report.failed,
            cancelled = report.cancelled,
            "import finished"
        );
        Ok(report)
    }
}
