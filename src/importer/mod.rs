// ==========================================
// Import layer
// ==========================================
// Pipeline stages, in call order:
//   file_parser      - file -> raw records
//   field_mapper     - raw record -> typed row
//   data_cleaner     - value normalization helpers
//   row_validator    - per-row and cross-row rules
//   member_id        - member ID composition
//   user_importer    - orchestration (preview + chunked commit)
// ==========================================

pub mod data_cleaner;
pub mod department_registry;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod member_id;
pub mod row_validator;
pub mod user_importer;
pub mod user_importer_impl;

pub use data_cleaner::DataCleaner;
pub use department_registry::DepartmentCodeRegistry;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use member_id::MemberIdGenerator;
pub use row_validator::RowValidator;
pub use user_importer::{CancelFlag, UserImporter};
pub use user_importer_impl::UserImporterImpl;
