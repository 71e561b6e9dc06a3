// ==========================================
// Department code registry
// ==========================================
// Fixed mapping: canonical department name -> 2-digit code.
// Lookup is case-insensitive with `&` <-> `and` normalization.
// An unresolved department is always a hard validation error
// upstream; no placeholder code exists anywhere.
// ==========================================

/// Canonical department names and their 2-digit codes.
pub const DEPARTMENT_CODES: &[(&str, &str)] = &[
    ("Marketing", "04"),
    ("Law", "15"),
    ("Mathematics", "05"),
    ("Physics", "18"),
    ("History & Civilization", "23"),
    ("Soil & Environmental Sciences", "10"),
    ("Economics", "01"),
    ("Geology & Mining", "17"),
    ("Management Studies", "03"),
    ("Statistics", "24"),
    ("Chemistry", "12"),
    ("Coastal Studies and Disaster Management", "19"),
    ("Accounting & Information Systems", "07"),
    ("Computer Science and Engineering", "13"),
    ("Sociology", "06"),
    ("Botany", "11"),
    ("Public Administration", "09"),
    ("Philosophy", "20"),
    ("Political Science", "16"),
    ("Biochemistry and Biotechnology", "21"),
    ("Finance and Banking", "14"),
    ("Mass Communication and Journalism", "22"),
    ("English", "02"),
    ("Bangla", "08"),
];

pub struct DepartmentCodeRegistry;

impl DepartmentCodeRegistry {
    /// Resolve a department name to its 2-digit code.
    ///
    /// Resolution order, case-insensitive:
    /// 1. exact match against the canonical name
    /// 2. match after normalizing `&` <-> `and` on both sides
    ///
    /// No fuzzy matching here; suggestions live in the row validator.
    pub fn lookup(name: &str) -> Option<&'static str> {
        let needle = normalize(name);
        DEPARTMENT_CODES
            .iter()
            .find(|(canonical, _)| normalize(canonical) == needle)
            .map(|(_, code)| *code)
    }

    /// Whether a 2-digit code belongs to the canonical list. Used for
    /// member-id prefix validation.
    pub fn is_valid_code(code: &str) -> bool {
        DEPARTMENT_CODES.iter().any(|(_, c)| *c == code)
    }

    /// Canonical names, in registry order.
    pub fn canonical_names() -> impl Iterator<Item = &'static str> {
        DEPARTMENT_CODES.iter().map(|(name, _)| *name)
    }
}

/// Lowercase, trim, and unify `&` to `and` so either spelling matches.
fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('&', "and")
}
