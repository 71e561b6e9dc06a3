// ==========================================
// Repository layer
// ==========================================

pub mod error;
pub mod user_repo;
pub mod user_repo_impl;

pub use error::{RepositoryError, RepositoryResult};
pub use user_repo::{ChunkOutcome, StorageFailure, UserRepository};
pub use user_repo_impl::UserRepositoryImpl;
