// ==========================================
// Configuration layer
// ==========================================

pub mod import_config;

pub use import_config::ImportConfig;
