// ==========================================
// Import domain types
// ==========================================
// ImportRow: one spreadsheet line mapped to typed fields
// ValidationError: one finding per failed rule
// ImportPreview: parse+validate result handed to the confirmation step
// BatchReport: commit result
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Spreadsheet header tokens the field mapper recognizes, in display order.
/// Header normalization lowercases and replaces spaces with underscores
/// before matching against this list.
pub const RECOGNIZED_FIELDS: &[&str] = &[
    "name",
    "email",
    "phone",
    "department",
    "session",
    "gender",
    "class_roll",
    "blood_group",
    "father_name",
    "mother_name",
    "current_address",
    "permanent_address",
    "transaction_id",
    "to_account",
    "skills",
    "date_of_birth",
    "password",
    "usertype",
    "member_id",
];

/// One parsed spreadsheet row.
///
/// `row_number` is 1-based counting the header as row 1, so data rows start
/// at 2. Blank rows are skipped during parsing and do not consume numbers.
/// Headers outside RECOGNIZED_FIELDS land in `extra` untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ImportRow {
    pub row_id: usize,
    pub row_number: usize,

    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub session: Option<String>,
    pub gender: Option<String>,
    pub class_roll: Option<String>,
    pub blood_group: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub current_address: Option<String>,
    pub permanent_address: Option<String>,
    pub transaction_id: Option<String>,
    pub to_account: Option<String>,
    pub skills: Option<String>,
    pub date_of_birth: Option<String>,
    pub password: Option<String>,
    pub usertype: Option<String>,

    /// Pre-generated during preview when department and session resolve,
    /// or supplied by the file as an operator override.
    pub member_id: Option<String>,

    /// Unrecognized columns, preserved verbatim.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

/// Finding severity. Errors block the row from import; warnings do not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One validation finding attached to a row/column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationError {
    pub row: usize,
    pub column: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationError {
    pub fn error(row: usize, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn warning(row: usize, column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            column: column.into(),
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }

    pub fn formatted_message(&self) -> String {
        format!(
            "Row {}, Column '{}': {}",
            self.row, self.column, self.message
        )
    }
}

/// Preview statistics.
///
/// Invariant: valid_rows + error_rows == total_rows. Only error-severity
/// findings count toward error_rows; a row carrying warnings alone is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatistics {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub error_rows: usize,
    pub total_errors: usize,
}

/// Display metadata for one preview column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub key: String,
    pub label: String,
}

/// Aggregate result of one parse+validate pass over an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub rows: Vec<ImportRow>,
    pub errors: Vec<ValidationError>,
    pub statistics: ImportStatistics,
}

impl ImportPreview {
    pub fn new(rows: Vec<ImportRow>, errors: Vec<ValidationError>) -> Self {
        let statistics = Self::compute_statistics(&rows, &errors);
        Self {
            rows,
            errors,
            statistics,
        }
    }

    fn compute_statistics(rows: &[ImportRow], errors: &[ValidationError]) -> ImportStatistics {
        let error_row_numbers: std::collections::HashSet<usize> = errors
            .iter()
            .filter(|e| e.is_error())
            .map(|e| e.row)
            .collect();

        ImportStatistics {
            total_rows: rows.len(),
            valid_rows: rows.len() - error_row_numbers.len(),
            error_rows: error_row_numbers.len(),
            total_errors: errors.len(),
        }
    }

    /// Display columns: recognized fields in canonical order, then any extra
    /// columns seen in the data. Labels are title-cased with underscores
    /// replaced by spaces.
    pub fn columns(&self) -> Vec<ColumnSpec> {
        let mut keys: Vec<String> = RECOGNIZED_FIELDS.iter().map(|f| f.to_string()).collect();
        for row in &self.rows {
            for key in row.extra.keys() {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }

        keys.into_iter()
            .map(|key| ColumnSpec {
                label: title_case(&key),
                key,
            })
            .collect()
    }

    /// Rows with no error-severity finding.
    pub fn valid_rows(&self) -> Vec<&ImportRow> {
        let error_rows = self.error_row_numbers();
        self.rows
            .iter()
            .filter(|r| !error_rows.contains(&r.row_number))
            .collect()
    }

    /// Rows carrying at least one error-severity finding.
    pub fn error_rows(&self) -> Vec<&ImportRow> {
        let error_rows = self.error_row_numbers();
        self.rows
            .iter()
            .filter(|r| error_rows.contains(&r.row_number))
            .collect()
    }

    /// Findings grouped by row number, warnings included.
    pub fn errors_by_row(&self) -> BTreeMap<usize, Vec<&ValidationError>> {
        let mut grouped: BTreeMap<usize, Vec<&ValidationError>> = BTreeMap::new();
        for error in &self.errors {
            grouped.entry(error.row).or_default().push(error);
        }
        grouped
    }

    pub fn is_valid(&self) -> bool {
        self.errors.iter().all(|e| !e.is_error())
    }

    pub fn summary_message(&self) -> String {
        if self.errors.is_empty() {
            return format!(
                "All {} rows are valid and ready for import.",
                self.statistics.total_rows
            );
        }
        format!(
            "Found {} error(s) in {} row(s). {} row(s) are valid.",
            self.statistics.total_errors, self.statistics.error_rows, self.statistics.valid_rows
        )
    }

    fn error_row_numbers(&self) -> std::collections::HashSet<usize> {
        self.errors
            .iter()
            .filter(|e| e.is_error())
            .map(|e| e.row)
            .collect()
    }
}

/// Commit outcome for one failed row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedRow {
    pub row: usize,
    pub errors: Vec<ValidationError>,
}

/// Aggregate commit result across all chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub imported: usize,
    pub failed: usize,
    pub failed_rows: Vec<FailedRow>,
    pub total: usize,
    /// True when a cancellation request stopped scheduling further chunks.
    /// Chunks committed before the cancellation remain committed.
    pub cancelled: bool,
}

fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(row_number: usize) -> ImportRow {
        ImportRow {
            row_id: row_number,
            row_number,
            ..Default::default()
        }
    }

    #[test]
    fn test_statistics_invariant() {
        let rows = vec![row(2), row(3), row(4)];
        let errors = vec![
            ValidationError::error(3, "email", "Email is required"),
            ValidationError::error(4, "email", "Duplicate email"),
            ValidationError::error(4, "phone", "Phone is required"),
        ];

        let preview = ImportPreview::new(rows, errors);

        assert_eq!(preview.statistics.total_rows, 3);
        assert_eq!(preview.statistics.error_rows, 2);
        assert_eq!(preview.statistics.valid_rows, 1);
        assert_eq!(preview.statistics.total_errors, 3);
        assert_eq!(
            preview.statistics.valid_rows + preview.statistics.error_rows,
            preview.statistics.total_rows
        );
    }

    #[test]
    fn test_warnings_do_not_count_as_error_rows() {
        let rows = vec![row(2), row(3)];
        let errors = vec![ValidationError::warning(
            2,
            "blood_group",
            "Invalid blood group",
        )];

        let preview = ImportPreview::new(rows, errors);

        assert_eq!(preview.statistics.error_rows, 0);
        assert_eq!(preview.statistics.valid_rows, 2);
        assert_eq!(preview.statistics.total_errors, 1);
        assert!(preview.is_valid());
    }

    #[test]
    fn test_valid_and_error_row_partition() {
        let rows = vec![row(2), row(3)];
        let errors = vec![ValidationError::error(3, "email", "Email is required")];

        let preview = ImportPreview::new(rows, errors);

        assert_eq!(preview.valid_rows().len(), 1);
        assert_eq!(preview.valid_rows()[0].row_number, 2);
        assert_eq!(preview.error_rows().len(), 1);
        assert_eq!(preview.error_rows()[0].row_number, 3);
    }

    #[test]
    fn test_column_labels() {
        let preview = ImportPreview::new(vec![row(2)], vec![]);
        let columns = preview.columns();

        let blood = columns.iter().find(|c| c.key == "blood_group").unwrap();
        assert_eq!(blood.label, "Blood Group");

        let dob = columns.iter().find(|c| c.key == "date_of_birth").unwrap();
        assert_eq!(dob.label, "Date Of Birth");
    }

    #[test]
    fn test_errors_by_row_groups_all_severities() {
        let errors = vec![
            ValidationError::error(3, "email", "Invalid email format"),
            ValidationError::warning(3, "blood_group", "Invalid blood group"),
        ];
        let preview = ImportPreview::new(vec![row(2), row(3)], errors);

        let grouped = preview.errors_by_row();
        assert_eq!(grouped.get(&3).map(|e| e.len()), Some(2));
        assert!(!grouped.contains_key(&2));
    }

    #[test]
    fn test_severity_serialization() {
        let error = ValidationError::warning(2, "usertype", "unknown type");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["row"], 2);
    }
}
