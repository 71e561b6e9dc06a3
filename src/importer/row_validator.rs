// ==========================================
// Row validator
// ==========================================
// Per-field and cross-field rules. Pure and synchronous:
// everything here is a function of the row and the static
// department registry. Store-facing checks (email already
// persisted) belong to the orchestrator, which reaches the
// repository.
//
// Every rule runs; none short-circuits another field's checks.
// Findings are values, never Err.
// ==========================================

use crate::domain::{ImportRow, ValidationError};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::department_registry::DepartmentCodeRegistry;
use chrono::{Datelike, NaiveDate, Utc};
use std::collections::HashMap;

/// Similarity floor for department suggestions.
const SUGGESTION_THRESHOLD: f64 = 0.70;

const VALID_BLOOD_GROUPS: &[&str] = &["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];
const VALID_GENDERS: &[&str] = &["male", "female", "other"];
const VALID_USER_TYPES: &[&str] = &["user", "admin", "moderator"];

pub struct RowValidator;

impl RowValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate one row. Optional fields are only checked when present.
    pub fn validate_row(&self, row: &ImportRow) -> Vec<ValidationError> {
        let n = row.row_number;
        let mut errors = self.validate_required_fields(row);

        if let Some(email) = non_blank(&row.email) {
            errors.extend(self.validate_email(email, n));
        }
        if let Some(department) = non_blank(&row.department) {
            errors.extend(self.validate_department(department, n));
        }
        if let Some(session) = non_blank(&row.session) {
            errors.extend(self.validate_session(session, n));
        }
        if let Some(gender) = non_blank(&row.gender) {
            errors.extend(self.validate_gender(gender, n));
        }
        if let Some(phone) = non_blank(&row.phone) {
            errors.extend(self.validate_phone(phone, n));
        }
        if let Some(dob) = non_blank(&row.date_of_birth) {
            errors.extend(self.validate_date_of_birth(dob, n));
        }
        if let Some(blood_group) = non_blank(&row.blood_group) {
            errors.extend(self.validate_blood_group(blood_group, n));
        }
        if let Some(password) = non_blank(&row.password) {
            errors.extend(self.validate_password(password, n));
        }
        if let Some(usertype) = non_blank(&row.usertype) {
            errors.extend(self.validate_user_type(usertype, n));
        }
        if let Some(member_id) = non_blank(&row.member_id) {
            errors.extend(self.validate_member_id(member_id, n));
        }

        errors
    }

    /// Cross-row pass: duplicate emails within one upload, compared
    /// case-insensitively. The first occurrence stays unflagged; every later
    /// occurrence is an error referencing the first row.
    pub fn check_duplicate_emails(&self, rows: &[ImportRow]) -> Vec<ValidationError> {
        let mut first_occurrence: HashMap<String, usize> = HashMap::new();
        let mut errors = Vec::new();

        for row in rows {
            let Some(email) = non_blank(&row.email) else {
                continue;
            };
            let key = email.trim().to_lowercase();

            match first_occurrence.get(&key) {
                Some(first_row) => {
                    errors.push(ValidationError::error(
                        row.row_number,
                        "email",
                        format!(
                            "Duplicate email within the import file (first occurrence at row {})",
                            first_row
                        ),
                    ));
                }
                None => {
                    first_occurrence.insert(key, row.row_number);
                }
            }
        }

        errors
    }

    fn validate_required_fields(&self, row: &ImportRow) -> Vec<ValidationError> {
        let required: [(&Option<String>, &str, &str); 6] = [
            (&row.name, "name", "Name"),
            (&row.email, "email", "Email"),
            (&row.phone, "phone", "Phone"),
            (&row.department, "department", "Department"),
            (&row.session, "session", "Session"),
            (&row.gender, "gender", "Gender"),
        ];

        required
            .iter()
            .filter(|(value, _, _)| non_blank(value).is_none())
            .map(|(_, field, label)| {
                ValidationError::error(row.row_number, *field, format!("{} is required", label))
            })
            .collect()
    }

    pub fn validate_email(&self, email: &str, row: usize) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !is_valid_email_syntax(email.trim()) {
            errors.push(ValidationError::error(row, "email", "Invalid email format"));
        }

        if email.len() > 255 {
            errors.push(ValidationError::error(
                row,
                "email",
                "Email must not exceed 255 characters",
            ));
        }

        errors
    }

    /// Department must match the canonical list (allowing `&` <-> `and`).
    /// On failure a fuzzy best-guess is included in the message when one
    /// clears the similarity floor; the stored value is never rewritten.
    pub fn validate_department(&self, department: &str, row: usize) -> Vec<ValidationError> {
        if DepartmentCodeRegistry::lookup(department).is_some() {
            return Vec::new();
        }

        let message = match self.best_department_match(department) {
            Some(best) => format!(
                "Invalid department '{}'. Did you mean '{}'? Please select from dropdown.",
                department.trim(),
                best
            ),
            None => {
                let sample: Vec<&str> = DepartmentCodeRegistry::canonical_names().take(3).collect();
                format!(
                    "Invalid department '{}'. Must be exactly one of: {}...",
                    department.trim(),
                    sample.join(", ")
                )
            }
        };

        vec![ValidationError::error(row, "department", message)]
    }

    /// Suggestion only; never feeds back into the row.
    fn best_department_match(&self, department: &str) -> Option<&'static str> {
        let needle = department.trim().to_lowercase();
        let mut best: Option<&'static str> = None;
        let mut highest = SUGGESTION_THRESHOLD;

        for canonical in DepartmentCodeRegistry::canonical_names() {
            let variants = [
                canonical.to_lowercase(),
                canonical.to_lowercase().replace('&', "and"),
            ];
            for variant in &variants {
                let similarity = strsim::normalized_levenshtein(variant, &needle);
                if similarity > highest {
                    highest = similarity;
                    best = Some(canonical);
                }
            }
        }

        best
    }

    pub fn validate_session(&self, session: &str, row: usize) -> Vec<ValidationError> {
        let session = session.trim();

        let Some((start_year, end_year)) = parse_session(session) else {
            return vec![ValidationError::error(
                row,
                "session",
                "Session must be in format YYYY-YY or YYYY-YYYY (e.g., 2023-24 or 2023-2024)",
            )];
        };

        let mut errors = Vec::new();
        let current_year = Utc::now().year();

        if start_year < 1990 || start_year > current_year + 1 {
            errors.push(ValidationError::error(
                row,
                "session",
                format!(
                    "Session start year must be between 1990 and {}",
                    current_year + 1
                ),
            ));
        }

        if end_year <= start_year {
            errors.push(ValidationError::error(
                row,
                "session",
                "Session end year must be after start year",
            ));
        }

        if end_year - start_year > 5 {
            errors.push(ValidationError::warning(
                row,
                "session",
                "Session span cannot exceed 5 years",
            ));
        }

        errors
    }

    fn validate_gender(&self, gender: &str, row: usize) -> Vec<ValidationError> {
        if VALID_GENDERS.contains(&gender.trim().to_lowercase().as_str()) {
            return Vec::new();
        }
        vec![ValidationError::error(
            row,
            "gender",
            "Gender must be one of: male, female, other",
        )]
    }

    pub fn validate_phone(&self, phone: &str, row: usize) -> Vec<ValidationError> {
        let normalized = DataCleaner::normalize_phone(phone);
        if is_valid_bd_mobile(&normalized) {
            return Vec::new();
        }
        vec![ValidationError::error(
            row,
            "phone",
            "Invalid phone number format. Use format: 01XXXXXXXXX (11 digits starting with 013-019)",
        )]
    }

    pub fn validate_date_of_birth(&self, value: &str, row: usize) -> Vec<ValidationError> {
        let Some(date) = DataCleaner::parse_flexible_date(value) else {
            return vec![ValidationError::error(
                row,
                "date_of_birth",
                "Invalid date format. Use format: YYYY-MM-DD",
            )];
        };

        let mut errors = Vec::new();
        let today = Utc::now().date_naive();

        if date > today {
            errors.push(ValidationError::error(
                row,
                "date_of_birth",
                "Date of birth cannot be in the future",
            ));
            return errors;
        }

        let age = age_in_years(date, today);
        if age < 15 {
            errors.push(ValidationError::warning(
                row,
                "date_of_birth",
                "Age must be at least 15 years",
            ));
        }
        if age > 100 {
            errors.push(ValidationError::warning(
                row,
                "date_of_birth",
                "Age cannot exceed 100 years",
            ));
        }

        errors
    }

    fn validate_blood_group(&self, blood_group: &str, row: usize) -> Vec<ValidationError> {
        let candidate = blood_group.trim().to_uppercase();
        if VALID_BLOOD_GROUPS.contains(&candidate.as_str()) {
            return Vec::new();
        }
        vec![ValidationError::warning(
            row,
            "blood_group",
            format!(
                "Invalid blood group. Must be one of: {}",
                VALID_BLOOD_GROUPS.join(", ")
            ),
        )]
    }

    fn validate_password(&self, password: &str, row: usize) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if password.len() < 8 {
            errors.push(ValidationError::error(
                row,
                "password",
                "Password must be at least 8 characters long",
            ));
        }
        if password.len() > 255 {
            errors.push(ValidationError::error(
                row,
                "password",
                "Password must not exceed 255 characters",
            ));
        }

        errors
    }

    /// Member IDs (on override/edit) must be exactly 8 digits and carry a
    /// known department code prefix.
    pub fn validate_member_id(&self, member_id: &str, row: usize) -> Vec<ValidationError> {
        let member_id = member_id.trim();

        if member_id.len() != 8 || !member_id.chars().all(|c| c.is_ascii_digit()) {
            return vec![ValidationError::error(
                row,
                "member_id",
                "Member ID must be 8 digits (Department Code + Year + Form Number)",
            )];
        }

        if !DepartmentCodeRegistry::is_valid_code(&member_id[..2]) {
            return vec![ValidationError::error(
                row,
                "member_id",
                "Invalid department code in Member ID. Must use predefined department codes only.",
            )];
        }

        Vec::new()
    }

    /// Unrecognized user types are tolerated with a warning; downstream
    /// defaults them.
    fn validate_user_type(&self, usertype: &str, row: usize) -> Vec<ValidationError> {
        if VALID_USER_TYPES.contains(&usertype.trim().to_lowercase().as_str()) {
            return Vec::new();
        }
        vec![ValidationError::warning(
            row,
            "usertype",
            format!("User type must be one of: {}", VALID_USER_TYPES.join(", ")),
        )]
    }
}

impl Default for RowValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Minimal email syntax check: one `@`, non-empty local part, domain with a
/// dot and no leading/trailing dot, no whitespace anywhere.
fn is_valid_email_syntax(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.len() < 3 {
        return false;
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return false;
    }
    !domain.contains("..")
}

/// Parse `YYYY-YY`/`YYYY-YYYY` (end part 2-4 digits); a 2-digit end year
/// expands to 2000+YY.
fn parse_session(session: &str) -> Option<(i32, i32)> {
    let (start, end) = session.split_once('-')?;

    if start.len() != 4 || !start.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if !(2..=4).contains(&end.len()) || !end.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let start_year: i32 = start.parse().ok()?;
    let end_value: i32 = end.parse().ok()?;
    let end_year = if end.len() == 2 {
        2000 + end_value
    } else {
        end_value
    };

    Some((start_year, end_year))
}

fn age_in_years(dob: NaiveDate, today: NaiveDate) -> u32 {
    today.years_since(dob).unwrap_or(0)
}

fn is_valid_bd_mobile(digits: &str) -> bool {
    let bytes = digits.as_bytes();
    bytes.len() == 10
        && bytes[0] == b'1'
        && (b'3'..=b'9').contains(&bytes[1])
        && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Severity;

    fn valid_row(row_number: usize) -> ImportRow {
        ImportRow {
            row_id: row_number,
            row_number,
            name: Some("Alice Rahman".to_string()),
            email: Some("alice@example.com".to_string()),
            phone: Some("01712345678".to_string()),
            department: Some("Statistics".to_string()),
            session: Some("2023-24".to_string()),
            gender: Some("female".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_row_has_no_findings() {
        let validator = RowValidator::new();
        assert!(validator.validate_row(&valid_row(2)).is_empty());
    }

    #[test]
    fn test_revalidation_is_idempotent() {
        let validator = RowValidator::new();
        let row = valid_row(2);
        assert!(validator.validate_row(&row).is_empty());
        assert!(validator.validate_row(&row).is_empty());
    }

    #[test]
    fn test_required_fields() {
        let validator = RowValidator::new();
        let row = ImportRow {
            row_id: 3,
            row_number: 3,
            ..Default::default()
        };

        let errors = validator.validate_row(&row);
        let columns: Vec<&str> = errors.iter().map(|e| e.column.as_str()).collect();

        assert_eq!(errors.len(), 6);
        assert!(columns.contains(&"name"));
        assert!(columns.contains(&"email"));
        assert!(columns.contains(&"phone"));
        assert!(columns.contains(&"department"));
        assert!(columns.contains(&"session"));
        assert!(columns.contains(&"gender"));
        assert!(errors.iter().all(|e| e.is_error()));
        assert!(errors.iter().any(|e| e.message == "Name is required"));
    }

    #[test]
    fn test_invalid_email_format() {
        let validator = RowValidator::new();
        assert!(!validator.validate_email("not-an-email", 2).is_empty());
        assert!(!validator.validate_email("a b@example.com", 2).is_empty());
        assert!(!validator.validate_email("a@nodot", 2).is_empty());
        assert!(validator.validate_email("alice@example.com", 2).is_empty());
    }

    #[test]
    fn test_email_length_limit() {
        let validator = RowValidator::new();
        let long = format!("{}@example.com", "a".repeat(250));
        let errors = validator.validate_email(&long, 2);
        assert!(errors
            .iter()
            .any(|e| e.message == "Email must not exceed 255 characters"));
    }

    #[test]
    fn test_department_suggestion() {
        let validator = RowValidator::new();
        let errors = validator.validate_department("Statstics", 2);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_error());
        assert!(errors[0].message.contains("Did you mean 'Statistics'"));
    }

    #[test]
    fn test_department_no_suggestion_below_threshold() {
        let validator = RowValidator::new();
        let errors = validator.validate_department("Zzzz", 2);

        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("Must be exactly one of"));
    }

    #[test]
    fn test_department_and_variant_is_accepted() {
        let validator = RowValidator::new();
        assert!(validator
            .validate_department("History and Civilization", 2)
            .is_empty());
    }

    #[test]
    fn test_session_boundaries() {
        let validator = RowValidator::new();

        // start year < 1990
        let errors = validator.validate_session("1989-95", 2);
        assert!(errors.iter().any(|e| e.is_error()));

        // span > 5 years is a warning, not an error
        let errors = validator.validate_session("2023-2029", 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Warning);

        // end before start
        let errors = validator.validate_session("2024-2023", 2);
        assert!(errors
            .iter()
            .any(|e| e.message == "Session end year must be after start year"));

        assert!(validator.validate_session("2024-25", 2).is_empty());
        assert!(validator.validate_session("2023-2024", 2).is_empty());
    }

    #[test]
    fn test_session_format() {
        let validator = RowValidator::new();
        assert!(!validator.validate_session("23-24", 2).is_empty());
        assert!(!validator.validate_session("2023/24", 2).is_empty());
        assert!(!validator.validate_session("session", 2).is_empty());
    }

    #[test]
    fn test_phone_normalization_paths() {
        let validator = RowValidator::new();

        assert!(validator.validate_phone("+8801712345678", 2).is_empty());
        assert!(validator.validate_phone("8801912345678", 2).is_empty());
        assert!(validator.validate_phone("01312345678", 2).is_empty());
        assert!(validator.validate_phone("0171-234 5678", 2).is_empty());

        // prefix "12" is outside 13-19
        assert!(!validator.validate_phone("01212345678", 2).is_empty());
        // too short
        assert!(!validator.validate_phone("017123", 2).is_empty());
        // letters
        assert!(!validator.validate_phone("01712345abc", 2).is_empty());
    }

    #[test]
    fn test_date_of_birth_future_is_error() {
        let validator = RowValidator::new();
        let future = (Utc::now().date_naive() + chrono::Duration::days(30))
            .format("%Y-%m-%d")
            .to_string();

        let errors = validator.validate_date_of_birth(&future, 2);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].is_error());
        assert_eq!(errors[0].message, "Date of birth cannot be in the future");
    }

    #[test]
    fn test_date_of_birth_age_bounds_are_warnings() {
        let validator = RowValidator::new();

        let too_young = (Utc::now().date_naive() - chrono::Duration::days(365 * 10))
            .format("%Y-%m-%d")
            .to_string();
        let errors = validator.validate_date_of_birth(&too_young, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Warning);

        let too_old = "1900-01-15";
        let errors = validator.validate_date_of_birth(too_old, 2);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].severity, Severity::Warning);
    }

    #[test]
    fn test_date_of_birth_unparseable_is_error() {
        let validator = RowValidator::new();
        let errors = validator.validate_date_of_birth("sometime in May", 2);
        assert!(errors[0].is_error());
        assert!(errors[0].message.contains("Invalid date format"));
    }

    #[test]
    fn test_blood_group_warning() {
        let validator = RowValidator::new();
        let mut row = valid_row(2);
        row.blood_group = Some("C+".to_string());

        let findings = validator.validate_row(&row);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);

        row.blood_group = Some("ab+".to_string());
        assert!(validator.validate_row(&row).is_empty());
    }

    #[test]
    fn test_password_length() {
        let validator = RowValidator::new();
        let mut row = valid_row(2);

        row.password = Some("short".to_string());
        assert!(validator.validate_row(&row)[0].is_error());

        row.password = Some("x".repeat(256));
        assert!(validator.validate_row(&row)[0].is_error());

        row.password = Some("long enough".to_string());
        assert!(validator.validate_row(&row).is_empty());
    }

    #[test]
    fn test_member_id_format_and_prefix() {
        let validator = RowValidator::new();

        assert!(!validator.validate_member_id("1234", 2).is_empty());
        assert!(!validator.validate_member_id("1234567a", 2).is_empty());
        // prefix 00 is not a known department code
        assert!(!validator.validate_member_id("00241130", 2).is_empty());
        assert!(validator.validate_member_id("24241130", 2).is_empty());
    }

    #[test]
    fn test_user_type_warning() {
        let validator = RowValidator::new();
        let mut row = valid_row(2);
        row.usertype = Some("superuser".to_string());

        let findings = validator.validate_row(&row);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, Severity::Warning);

        row.usertype = Some("Admin".to_string());
        assert!(validator.validate_row(&row).is_empty());
    }

    #[test]
    fn test_duplicate_emails_first_unflagged() {
        let validator = RowValidator::new();
        let mut rows = vec![valid_row(2), valid_row(3), valid_row(4)];
        rows[1].email = Some("other@example.com".to_string());
        rows[2].email = Some("ALICE@example.com".to_string()); // dup of row 2, case-insensitive

        let errors = validator.check_duplicate_emails(&rows);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].row, 4);
        assert!(errors[0].message.contains("first occurrence at row 2"));
    }

    #[test]
    fn test_duplicate_emails_every_later_occurrence_flagged() {
        let validator = RowValidator::new();
        let rows = vec![valid_row(2), valid_row(3), valid_row(4)];

        let errors = validator.check_duplicate_emails(&rows);

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].row, 3);
        assert_eq!(errors[1].row, 4);
        assert!(errors[1].message.contains("row 2"));
    }
}
