// ==========================================
// Data cleaner
// ==========================================
// TRIM / NULL normalization, flexible date parsing
// (including the spreadsheet 1900-epoch serial form),
// and phone-number normalization.
// ==========================================

use chrono::{Duration, NaiveDate};

pub struct DataCleaner;

impl DataCleaner {
    /// Trim a text value.
    pub fn clean_text(value: &str) -> String {
        value.trim().to_string()
    }

    /// Empty or whitespace-only values become None.
    pub fn normalize_null(value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// Parse a date-of-birth cell.
    ///
    /// Accepts common textual formats, and numeric spreadsheet serials
    /// counted from the 1900 epoch. The serial conversion subtracts 2 days,
    /// reproducing the host format's leap-year-bug offset so dates round-trip
    /// with files produced by spreadsheet software.
    pub fn parse_flexible_date(value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }

        // Numeric cell: 1900-epoch serial.
        if let Ok(serial) = value.parse::<f64>() {
            if serial > 0.0 {
                let epoch = NaiveDate::from_ymd_opt(1900, 1, 1)?;
                return epoch.checked_add_signed(Duration::days(serial.trunc() as i64 - 2));
            }
            return None;
        }

        const FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
        FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    }

    /// Normalize a phone value toward the 10-digit Bangladeshi mobile form.
    ///
    /// Strips spaces, dashes and parentheses, then an optional +880/880
    /// country code, then a single leading zero. Validation of the remaining
    /// digits happens in the row validator.
    pub fn normalize_phone(value: &str) -> String {
        let cleaned: String = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '(' && *c != ')')
            .collect();

        let without_country = if let Some(rest) = cleaned.strip_prefix("+880") {
            rest
        } else if let Some(rest) = cleaned.strip_prefix("880") {
            rest
        } else {
            &cleaned
        };

        without_country
            .strip_prefix('0')
            .unwrap_or(without_country)
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_null() {
        assert_eq!(DataCleaner::normalize_null(Some("  ".to_string())), None);
        assert_eq!(DataCleaner::normalize_null(Some("".to_string())), None);
        assert_eq!(
            DataCleaner::normalize_null(Some("  value  ".to_string())),
            Some("value".to_string())
        );
        assert_eq!(DataCleaner::normalize_null(None), None);
    }

    #[test]
    fn test_parse_textual_dates() {
        let expected = NaiveDate::from_ymd_opt(2001, 5, 20).unwrap();
        assert_eq!(DataCleaner::parse_flexible_date("2001-05-20"), Some(expected));
        assert_eq!(DataCleaner::parse_flexible_date("2001/05/20"), Some(expected));
        assert_eq!(DataCleaner::parse_flexible_date("20/05/2001"), Some(expected));
        assert_eq!(DataCleaner::parse_flexible_date("20-05-2001"), Some(expected));
    }

    #[test]
    fn test_parse_spreadsheet_serial() {
        // Serial 61 is 1900-03-01 under the epoch-minus-2 rule.
        assert_eq!(
            DataCleaner::parse_flexible_date("61"),
            NaiveDate::from_ymd_opt(1900, 3, 1)
        );
        // 2000-01-01 has serial 36526.
        assert_eq!(
            DataCleaner::parse_flexible_date("36526"),
            NaiveDate::from_ymd_opt(2000, 1, 1)
        );
    }

    #[test]
    fn test_parse_invalid_date() {
        assert_eq!(DataCleaner::parse_flexible_date("not a date"), None);
        assert_eq!(DataCleaner::parse_flexible_date(""), None);
        assert_eq!(DataCleaner::parse_flexible_date("-5"), None);
    }

    #[test]
    fn test_normalize_phone_country_code() {
        assert_eq!(DataCleaner::normalize_phone("+8801712345678"), "1712345678");
        assert_eq!(DataCleaner::normalize_phone("8801712345678"), "1712345678");
        assert_eq!(DataCleaner::normalize_phone("01712345678"), "1712345678");
        assert_eq!(DataCleaner::normalize_phone("1712345678"), "1712345678");
    }

    #[test]
    fn test_normalize_phone_punctuation() {
        assert_eq!(
            DataCleaner::normalize_phone("0171-234 5678"),
            "1712345678"
        );
        assert_eq!(
            DataCleaner::normalize_phone("(0171) 234-5678"),
            "1712345678"
        );
    }
}
