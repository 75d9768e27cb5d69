use crate::models::user::{search_key, NewUser, User, UserChanges, UserScope};
use crate::repositories::{push_page, RepositoryError, RepositoryResult};
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

const USER_COLUMNS: &str = "users.id, users.name, users.email, users.password_digest, \
     users.remember_token, users.created_at, users.updated_at";

#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User>;
    async fn update_user(&self, id: i64, changes: UserChanges) -> RepositoryResult<User>;
    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;
    /// Case-insensitive lookup.
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    /// Whether another user (other than `except_id`) already holds `email`,
    /// compared case-insensitively.
    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> RepositoryResult<bool>;
    /// Removes the user together with its microposts and every subscription
    /// it takes part in, atomically.
    async fn delete_user(&self, id: i64) -> RepositoryResult<()>;
    async fn fetch(
        &self,
        scope: &UserScope,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>>;
    async fn count(&self, scope: &UserScope) -> RepositoryResult<i64>;
}

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// FROM/JOIN/WHERE for a scope, appended after the select list.
fn push_scope(qb: &mut QueryBuilder<'_, Sqlite>, scope: &UserScope) {
    match scope {
        UserScope::All => {
            qb.push(" FROM users");
        }
        UserScope::NameContains(needle) => {
            qb.push(" FROM users WHERE instr(users.name_key, ")
                .push_bind(needle.clone())
                .push(") > 0");
        }
        UserScope::FollowedBy(follower_id) => {
            qb.push(
                " FROM users INNER JOIN subscriptions ON subscriptions.author_id = users.id \
                 WHERE subscriptions.follower_id = ",
            )
            .push_bind(*follower_id);
        }
        UserScope::FollowersOf(author_id) => {
            qb.push(
                " FROM users INNER JOIN subscriptions ON subscriptions.follower_id = users.id \
                 WHERE subscriptions.author_id = ",
            )
            .push_bind(*author_id);
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: NewUser) -> RepositoryResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (name, name_key, email, password_digest, remember_token)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.name)
        .bind(search_key(&user.name))
        .bind(&user.email)
        .bind(&user.password_digest)
        .bind(&user.remember_token)
        .execute(&self.pool)
        .await;

        match result {
            Ok(res) => {
                let id = res.last_insert_rowid();
                self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
            }
            Err(e) => Err(RepositoryError::from_write(e)),
        }
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> RepositoryResult<User> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = ?, name_key = ?, email = ?, password_digest = ?,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = ?
            "#,
        )
        .bind(&changes.name)
        .bind(search_key(&changes.name))
        .bind(&changes.email)
        .bind(&changes.password_digest)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_write)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.find_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    async fn find_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE users.id = ?",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE users.email = ? COLLATE NOCASE",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn email_taken(&self, email: &str, except_id: Option<i64>) -> RepositoryResult<bool> {
        let taken: i64 = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE email = ? COLLATE NOCASE AND (? IS NULL OR id != ?)
            )
            "#,
        )
        .bind(email)
        .bind(except_id)
        .bind(except_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(taken != 0)
    }

    async fn delete_user(&self, id: i64) -> RepositoryResult<()> {
        let mut tx = self.pool.begin().await?;

        let microposts = sqlx::query("DELETE FROM microposts WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let subscriptions =
            sqlx::query("DELETE FROM subscriptions WHERE follower_id = ? OR author_id = ?")
                .bind(id)
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            // Dropping the transaction rolls it back
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;

        tracing::debug!(
            user_id = id,
            microposts,
            subscriptions,
            "Deleted user and dependent records"
        );

        Ok(())
    }

    async fn fetch(
        &self,
        scope: &UserScope,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> RepositoryResult<Vec<User>> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT ");
        qb.push(USER_COLUMNS);
        push_scope(&mut qb, scope);
        qb.push(" ORDER BY users.id ASC");
        push_page(&mut qb, limit, offset);

        let users = qb.build_query_as::<User>().fetch_all(&self.pool).await?;

        Ok(users)
    }

    async fn count(&self, scope: &UserScope) -> RepositoryResult<i64> {
        let mut qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*)");
        push_scope(&mut qb, scope);

        let count = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        Ok(count)
    }
}
