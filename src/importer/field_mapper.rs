// ==========================================
// Field mapper
// ==========================================
// Stage 1: one raw record (normalized header -> cell text)
// becomes a typed ImportRow. Recognized headers fill the
// explicit optional fields; anything else is preserved in
// the `extra` bucket instead of being silently dropped.
// ==========================================

use crate::domain::ImportRow;
use std::collections::HashMap;

pub struct FieldMapper;

impl FieldMapper {
    /// Map a raw record to an ImportRow. `row_number` counts the header as
    /// row 1, so the first data row is 2.
    pub fn map_row(mut raw: HashMap<String, String>, row_number: usize) -> ImportRow {
        let mut row = ImportRow {
            row_id: row_number,
            row_number,
            name: Self::take(&mut raw, "name"),
            email: Self::take(&mut raw, "email"),
            phone: Self::take(&mut raw, "phone"),
            department: Self::take(&mut raw, "department"),
            session: Self::take(&mut raw, "session"),
            gender: Self::take(&mut raw, "gender"),
            class_roll: Self::take(&mut raw, "class_roll"),
            blood_group: Self::take(&mut raw, "blood_group"),
            father_name: Self::take(&mut raw, "father_name"),
            mother_name: Self::take(&mut raw, "mother_name"),
            current_address: Self::take(&mut raw, "current_address"),
            permanent_address: Self::take(&mut raw, "permanent_address"),
            transaction_id: Self::take(&mut raw, "transaction_id"),
            to_account: Self::take(&mut raw, "to_account"),
            skills: Self::take(&mut raw, "skills"),
            date_of_birth: Self::take(&mut raw, "date_of_birth"),
            password: Self::take(&mut raw, "password"),
            usertype: Self::take(&mut raw, "usertype"),
            member_id: Self::take(&mut raw, "member_id"),
            extra: Default::default(),
        };

        // Whatever remains is an unrecognized column.
        for (key, value) in raw {
            let value = value.trim();
            if !value.is_empty() {
                row.extra.insert(key, value.to_string());
            }
        }

        row
    }

    /// Remove a recognized field; empty cells become None.
    fn take(raw: &mut HashMap<String, String>, key: &str) -> Option<String> {
        raw.remove(key).and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }
}
