pub mod micropost_repository;
pub mod subscription_repository;
pub mod user_repository;

pub use micropost_repository::{MicropostRepository, SqliteMicropostRepository};
pub use subscription_repository::{SqliteSubscriptionRepository, SubscriptionRepository};
pub use user_repository::{SqliteUserRepository, UserRepository};

use sqlx::{QueryBuilder, Sqlite};

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Record not found")]
    NotFound,
    #[error("Record already exists")]
    AlreadyExists,
    #[error("Referenced record does not exist")]
    MissingReference,
}

impl RepositoryError {
    /// Classify a failed INSERT/UPDATE by the constraint it tripped.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            let message = db_err.message();
            if db_err.is_unique_violation() || message.contains("UNIQUE") {
                return RepositoryError::AlreadyExists;
            }
            if db_err.is_foreign_key_violation() || message.contains("FOREIGN KEY") {
                return RepositoryError::MissingReference;
            }
        }
        RepositoryError::Database(err)
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Append LIMIT/OFFSET. SQLite needs a LIMIT before an OFFSET; -1 is unbounded.
pub(crate) fn push_page(qb: &mut QueryBuilder<'_, Sqlite>, limit: Option<i64>, offset: Option<i64>) {
    if limit.is_none() && offset.is_none() {
        return;
    }
    qb.push(" LIMIT ").push_bind(limit.unwrap_or(-1));
    if let Some(offset) = offset {
        qb.push(" OFFSET ").push_bind(offset);
    }
}
