// ==========================================
// Member ID generation
// ==========================================
// Member ID layout: 2-digit department code + 2-digit session
// end year + 4-digit zero-padded form number (8 chars total).
//
// The functions here are pure: the caller supplies the form
// number. During preview that number is a provisional positional
// offset from one repository read; at commit time it comes from
// the repository's atomic counter reservation, so concurrent
// imports never hand out the same number.
// ==========================================

use crate::domain::ImportRow;
use crate::importer::department_registry::DepartmentCodeRegistry;
use std::collections::HashMap;

/// Form numbering starts at SEQUENCE_SEED + 1 when the store is empty.
pub const SEQUENCE_SEED: u32 = 1129;

pub struct MemberIdGenerator;

impl MemberIdGenerator {
    /// Last two digits of the session's end year: "2023-2024" -> "24",
    /// "2023-24" -> "24".
    pub fn session_end_year(session: &str) -> Option<String> {
        let last_segment = session.trim().rsplit('-').next()?;
        if last_segment.len() < 2 {
            return None;
        }
        let year: String = last_segment.chars().skip(last_segment.len() - 2).collect();
        if year.chars().all(|c| c.is_ascii_digit()) {
            Some(year)
        } else {
            None
        }
    }

    /// Compose an 8-digit member ID, or None when the department does not
    /// resolve or the session yields no end year. Unresolved departments
    /// never receive a placeholder code.
    pub fn compose(department: &str, session: &str, form_number: u32) -> Option<String> {
        let code = DepartmentCodeRegistry::lookup(department)?;
        let year = Self::session_end_year(session)?;
        Some(format!("{}{}{:04}", code, year, form_number))
    }

    /// Provisional IDs for a parsed file: row index offsets above
    /// `last_form_number`. Rows whose department or session is blank or
    /// whose department does not resolve are skipped; they surface as
    /// validation errors instead.
    pub fn generate_batch(rows: &[ImportRow], last_form_number: u32) -> HashMap<usize, String> {
        let mut ids = HashMap::new();

        for (index, row) in rows.iter().enumerate() {
            let (department, session) = match (&row.department, &row.session) {
                (Some(d), Some(s)) if !d.trim().is_empty() && !s.trim().is_empty() => (d, s),
                _ => continue,
            };

            let form_number = last_form_number + index as u32 + 1;
            if let Some(member_id) = Self::compose(department, session, form_number) {
                ids.insert(row.row_id, member_id);
            }
        }

        ids
    }
}
