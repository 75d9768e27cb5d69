pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use std::sync::Arc;

use repositories::{SqliteMicropostRepository, SqliteSubscriptionRepository, SqliteUserRepository};
use services::{MicropostService, TokenDigest, UserService};

/// Services wired to one SQLite pool.
#[derive(Clone)]
pub struct AppState {
    pub user_service: Arc<UserService>,
    pub micropost_service: Arc<MicropostService>,
    pub pool: sqlx::SqlitePool,
}

impl AppState {
    pub fn new(pool: sqlx::SqlitePool, token_digest: TokenDigest) -> Self {
        let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
        let subscription_repository = Arc::new(SqliteSubscriptionRepository::new(pool.clone()));
        let micropost_repository = Arc::new(SqliteMicropostRepository::new(pool.clone()));

        let user_service = Arc::new(
            UserService::new(
                user_repository,
                subscription_repository,
                micropost_repository.clone(),
            )
            .with_token_digest(token_digest),
        );
        let micropost_service = Arc::new(MicropostService::new(micropost_repository));

        Self {
            user_service,
            micropost_service,
            pool,
        }
    }
}
