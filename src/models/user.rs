use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ValidationErrors;
use crate::models::micropost::MicropostScope;
use crate::services::{password, token};

pub const NAME_MAX_LENGTH: usize = 50;
pub const PASSWORD_MIN_LENGTH: usize = 6;

// Hardcoded regex pattern - guaranteed to be valid at compile time
#[allow(clippy::unwrap_used)]
static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[a-z0-9_+\-.]+@[a-z0-9\-]+(?:\.[a-z0-9\-]+)*\.[a-z]+$").unwrap()
});

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    #[serde(skip_serializing)]
    pub remember_token: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    /// True when `candidate` is this user's password.
    pub fn authenticate(&self, candidate: &str) -> bool {
        password::verify_password(candidate, &self.password_digest)
    }

    /// Posts by the users this user follows and by the user itself.
    pub fn feed(&self) -> MicropostScope {
        MicropostScope::from_users_followed_by(self)
    }

    /// This user's posts, narrowed to those containing `phrase` when one is given.
    pub fn filtered_microposts(&self, phrase: Option<&str>) -> MicropostScope {
        MicropostScope::authored_by(self).containing(phrase)
    }

    pub fn followed_users(&self) -> UserScope {
        UserScope::followed_by(self)
    }

    pub fn followers(&self) -> UserScope {
        UserScope::followers_of(self)
    }

    pub fn search(phrase: Option<&str>) -> UserScope {
        UserScope::search(phrase)
    }

    pub fn new_remember_token() -> String {
        token::new_remember_token()
    }

    pub fn digest(value: impl AsRef<[u8]>) -> String {
        token::digest(value)
    }
}

#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: Option<String>,
}

#[derive(Debug, Clone)]
pub struct UpdateUserRequest {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: Option<String>,
}

/// Row values handed to the repository once validation and hooks have run.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_digest: String,
    pub remember_token: String,
}

#[derive(Debug, Clone)]
pub struct UserChanges {
    pub name: String,
    pub email: String,
    pub password_digest: String,
}

/// Attribute-level rules. Email uniqueness needs storage and is checked by
/// the service on top of these.
pub fn validate_attributes(
    name: &str,
    email: &str,
    password: &str,
    password_confirm: Option<&str>,
) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    if name.trim().is_empty() {
        errors.add("name", "can't be blank");
    } else if name.chars().count() > NAME_MAX_LENGTH {
        errors.add(
            "name",
            format!("is too long (maximum is {} characters)", NAME_MAX_LENGTH),
        );
    }

    if email.trim().is_empty() {
        errors.add("email", "can't be blank");
    }
    if !is_valid_email(email) {
        errors.add("email", "is invalid");
    }

    if password.chars().count() < PASSWORD_MIN_LENGTH {
        errors.add(
            "password",
            format!("is too short (minimum is {} characters)", PASSWORD_MIN_LENGTH),
        );
    }
    if let Some(confirm) = password_confirm {
        if confirm != password {
            errors.add("password_confirmation", "doesn't match Password");
        }
    }

    errors
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Stored form of an email address.
pub fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}

/// A deferred selection of users. Nothing touches the database until the
/// scope is handed to [`UserRepository::fetch`](crate::repositories::UserRepository::fetch)
/// or `count`, and the same scope can be run any number of times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserScope {
    All,
    NameContains(String),
    FollowedBy(i64),
    FollowersOf(i64),
}

impl UserScope {
    /// Case-insensitive name search. A missing or blank phrase selects everyone.
    pub fn search(phrase: Option<&str>) -> Self {
        match normalize_phrase(phrase) {
            Some(needle) => UserScope::NameContains(needle),
            None => UserScope::All,
        }
    }

    pub fn followed_by(user: &User) -> Self {
        UserScope::FollowedBy(user.id)
    }

    pub fn followers_of(user: &User) -> Self {
        UserScope::FollowersOf(user.id)
    }
}

/// Case-folded form of `text` stored alongside searchable columns
/// (`users.name_key`, `microposts.content_key`). Phrases are folded the same
/// way, so matching is a plain substring test on both sides.
pub fn search_key(text: &str) -> String {
    text.to_lowercase()
}

/// Trimmed, lower-cased search phrase, or `None` when there is nothing to match.
pub(crate) fn normalize_phrase(phrase: Option<&str>) -> Option<String> {
    phrase
        .map(|p| search_key(p.trim()))
        .filter(|p| !p.is_empty())
}
