use crate::models::subscription::Subscription;
use crate::repositories::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use sqlx::SqlitePool;

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts a new edge. Existing edges for the same pair are not checked.
    async fn create(&self, follower_id: i64, author_id: i64) -> RepositoryResult<Subscription>;
    /// The oldest edge for the pair, if any.
    async fn find(&self, follower_id: i64, author_id: i64)
        -> RepositoryResult<Option<Subscription>>;
    /// Deletes the oldest edge for the pair. `NotFound` when there is none.
    async fn delete_one(&self, follower_id: i64, author_id: i64) -> RepositoryResult<()>;
}

pub struct SqliteSubscriptionRepository {
    pool: SqlitePool,
}

impl SqliteSubscriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for SqliteSubscriptionRepository {
    async fn create(&self, follower_id: i64, author_id: i64) -> RepositoryResult<Subscription> {
        let id = sqlx::query("INSERT INTO subscriptions (follower_id, author_id) VALUES (?, ?)")
            .bind(follower_id)
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from_write)?
            .last_insert_rowid();

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, follower_id, author_id, created_at, updated_at
            FROM subscriptions
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn find(
        &self,
        follower_id: i64,
        author_id: i64,
    ) -> RepositoryResult<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            SELECT id, follower_id, author_id, created_at, updated_at
            FROM subscriptions
            WHERE follower_id = ? AND author_id = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(follower_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(subscription)
    }

    async fn delete_one(&self, follower_id: i64, author_id: i64) -> RepositoryResult<()> {
        let result = sqlx::query(
            r#"
            DELETE FROM subscriptions
            WHERE id = (
                SELECT id FROM subscriptions
                WHERE follower_id = ? AND author_id = ?
                ORDER BY id ASC
                LIMIT 1
            )
            "#,
        )
        .bind(follower_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
