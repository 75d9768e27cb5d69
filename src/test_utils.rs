pub mod test_helpers {
    use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
    use tempfile::NamedTempFile;

    use crate::models::user::search_key;
    use crate::services::{password, token};
    use crate::services::TokenDigest;
    use crate::AppState;

    /// Create a new in-memory SQLite database for testing
    pub async fn create_test_db() -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(pool)
    }

    /// Create a temporary file-based SQLite database for testing
    /// Useful when you need a database that outlives a single connection
    pub async fn create_test_db_file() -> Result<(SqlitePool, NamedTempFile), sqlx::Error> {
        let temp_file = NamedTempFile::new().map_err(sqlx::Error::Io)?;
        let db_path = temp_file
            .path()
            .to_str()
            .ok_or_else(|| sqlx::Error::Configuration("Invalid database path".into()))?;
        let database_url = format!("sqlite://{}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&database_url)
            .await?;

        // Run migrations
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok((pool, temp_file))
    }

    /// In-memory database plus services wired to it
    pub async fn create_test_state() -> Result<AppState, sqlx::Error> {
        let pool = create_test_db().await?;
        Ok(AppState::new(pool, TokenDigest::default()))
    }

    /// Insert a user row directly, bypassing validation and hooks
    pub async fn insert_test_user(
        pool: &SqlitePool,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64, sqlx::Error> {
        let password_digest = password::hash_password(password).map_err(|e| {
            sqlx::Error::Configuration(format!("Password hashing failed: {}", e).into())
        })?;
        let remember_token = token::digest(token::new_remember_token());

        let result = sqlx::query(
            r#"
            INSERT INTO users (name, name_key, email, password_digest, remember_token)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(search_key(name))
        .bind(email)
        .bind(password_digest)
        .bind(remember_token)
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Create a test micropost for testing
    pub async fn insert_test_micropost(
        pool: &SqlitePool,
        user_id: i64,
        content: &str,
    ) -> Result<i64, sqlx::Error> {
        let result =
            sqlx::query("INSERT INTO microposts (user_id, content, content_key) VALUES (?, ?, ?)")
                .bind(user_id)
                .bind(content)
                .bind(search_key(content))
                .execute(pool)
                .await?;

        Ok(result.last_insert_rowid())
    }

    /// Create a follow edge for testing
    pub async fn insert_test_subscription(
        pool: &SqlitePool,
        follower_id: i64,
        author_id: i64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO subscriptions (follower_id, author_id) VALUES (?, ?)")
            .bind(follower_id)
            .bind(author_id)
            .execute(pool)
            .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
    }
}

// Re-export commonly used test functions at module level for convenience
// Note: This is test-only code. Panic on error is acceptable in tests.
#[cfg(test)]
pub async fn create_test_pool() -> sqlx::SqlitePool {
    match test_helpers::create_test_db().await {
        Ok(pool) => pool,
        Err(e) => panic!("Failed to create test pool: {}", e),
    }
}
