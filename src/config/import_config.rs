// ==========================================
// Import configuration
// ==========================================
// Tunables for the spreadsheet import pipeline.
// All fields have working defaults; a JSON file can
// override any subset of them.
// ==========================================

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default number of rows committed per transaction.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Password assigned to imported accounts that supply none.
pub const DEFAULT_IMPORT_PASSWORD: &str = "password123";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Rows per commit chunk.
    pub chunk_size: usize,

    /// Fallback password for rows without one. Imported members are expected
    /// to reset it on first login.
    pub default_password: String,

    /// bcrypt cost factor for hashing imported passwords.
    pub bcrypt_cost: u32,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            default_password: DEFAULT_IMPORT_PASSWORD.to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl ImportConfig {
    /// Load configuration from a JSON file, falling back to defaults for
    /// any field the file omits.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }
}
