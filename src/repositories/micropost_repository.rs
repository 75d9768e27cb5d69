use crate::models::micropost::{Micropost, MicropostScope, MicropostSource};
use crate::models::user::search_key;
use crate::repositories::{push_page, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait MicropostRepository: Send + Sync {
    async fn create(&self, user_id: i64, content: &str) -> RepositoryResult<Micropost>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Micropost>>;
    async fn delete(&self, id: i64) -> RepositoryResult<()>;
    /// Newest first.
    async fn fetch(
        &self,
        scope: &MicropostScope,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<Micropost>>;
    async fn count(&self, scope: &MicropostScope) -> RepositoryResult<i64>;
}

pub struct SqliteMicropostRepository {
    pool: SqlitePool,
}

impl SqliteMicropostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, scope: &MicropostScope) {
    match scope.source {
        MicropostSource::AuthoredBy(user_id) => {
            qb.push(" FROM microposts WHERE microposts.user_id = ")
                .push_bind(user_id);
        }
        MicropostSource::FeedFor(user_id) => {
            qb.push(
                " FROM microposts WHERE (microposts.user_id IN \
                 (SELECT author_id FROM subscriptions WHERE follower_id = ",
            )
            .push_bind(user_id)
            .push(") OR microposts.user_id = ")
            .push_bind(user_id)
            .push(")");
        }
    }

    if let Some(needle) = &scope.content_contains {
        qb.push(" AND instr(microposts.content_key, ")
            .push_bind(needle.clone())
            .push(") > 0");
    }
}

#[async_trait]
impl MicropostRepository for SqliteMicropostRepository {
    async fn create(&self, user_id: i64, content: &str) -> RepositoryResult<Micropost> {
        let id = sqlx::query(
            "INSERT INTO microposts (user_id, content, content_key) VALUES (?, ?, ?)",
        )
        .bind(user_id)
        .bind(content)
        .bind(search_key(content))
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_write)?
        .last_insert_rowid();

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<Micropost>> {
        let micropost = sqlx::query_as::<_, Micropost>(
            r#"
            SELECT id, user_id, content, created_at, updated_at
            FROM microposts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(micropost)
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM microposts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn fetch(
        &self,
        scope: &MicropostScope,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<Micropost>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT microposts.id, microposts.user_id, microposts.content, \
             microposts.created_at, microposts.updated_at",
        );
        push_scope(&mut qb, scope);
        qb.push(" ORDER BY microposts.created_at DESC, microposts.id DESC");
        push_page(&mut qb, limit, offset);

        let microposts = qb
            .build_query_as::<Micropost>()
            .fetch_all(&self.pool)
            .await?;

        Ok(microposts)
    }

    async fn count(&self, scope: &MicropostScope) -> RepositoryResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        push_scope(&mut qb, scope);

        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(count)
    }
}
