use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ValidationErrors;
use crate::models::user::{normalize_phrase, User};

pub const CONTENT_MAX_LENGTH: usize = 140;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Micropost {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct CreateMicropostRequest {
    pub user_id: i64,
    pub content: String,
}

pub fn validate_content(content: &str) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    if content.trim().is_empty() {
        errors.add("content", "can't be blank");
    } else if content.chars().count() > CONTENT_MAX_LENGTH {
        errors.add(
            "content",
            format!("is too long (maximum is {} characters)", CONTENT_MAX_LENGTH),
        );
    }
    errors
}

/// Which users' posts a [`MicropostScope`] draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicropostSource {
    /// Posts written by one user.
    AuthoredBy(i64),
    /// Posts by everyone the user follows, plus the user's own.
    FeedFor(i64),
}

/// A deferred micropost query, newest first. Run it through
/// `MicropostRepository::fetch`/`count` as often as needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicropostScope {
    pub source: MicropostSource,
    /// Lower-cased substring the content must contain.
    pub content_contains: Option<String>,
}

impl MicropostScope {
    pub fn authored_by(user: &User) -> Self {
        Self {
            source: MicropostSource::AuthoredBy(user.id),
            content_contains: None,
        }
    }

    pub fn from_users_followed_by(user: &User) -> Self {
        Self {
            source: MicropostSource::FeedFor(user.id),
            content_contains: None,
        }
    }

    /// Narrow to content containing `phrase`, ignoring case. A missing or
    /// blank phrase leaves the scope unchanged.
    pub fn containing(mut self, phrase: Option<&str>) -> Self {
        self.content_contains = normalize_phrase(phrase);
        self
    }
}
