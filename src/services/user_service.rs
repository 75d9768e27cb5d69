use crate::error::ValidationErrors;
use crate::models::micropost::{Micropost, MicropostScope};
use crate::models::subscription::Subscription;
use crate::models::user::{
    normalize_email, validate_attributes, CreateUserRequest, NewUser, UpdateUserRequest, User,
    UserChanges, UserScope,
};
use crate::repositories::{
    MicropostRepository, RepositoryError, SubscriptionRepository, UserRepository,
};
use crate::services::password;
use crate::services::token::{self, TokenDigest};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("User not found")]
    UserNotFound,
    #[error("Not following that user")]
    NotFollowing,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Password hashing failed: {0}")]
    HashingError(String),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

impl From<ValidationErrors> for UserServiceError {
    fn from(errors: ValidationErrors) -> Self {
        UserServiceError::Validation(errors)
    }
}

pub struct UserService {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    microposts: Arc<dyn MicropostRepository>,
    token_digest: TokenDigest,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        microposts: Arc<dyn MicropostRepository>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            microposts,
            token_digest: TokenDigest::default(),
        }
    }

    pub fn with_token_digest(mut self, token_digest: TokenDigest) -> Self {
        self.token_digest = token_digest;
        self
    }

    /// Validate, assign the remember token, normalize the email, then insert.
    pub async fn create_user(&self, request: CreateUserRequest) -> Result<User, UserServiceError> {
        self.validate(
            &request.name,
            &request.email,
            &request.password,
            request.password_confirm.as_deref(),
            None,
        )
        .await?;

        let remember_token = self.token_digest.digest(token::new_remember_token());
        let password_digest = self.hash_password(&request.password)?;

        let new_user = NewUser {
            name: request.name,
            email: normalize_email(&request.email),
            password_digest,
            remember_token,
        };

        match self.users.create_user(new_user).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "User created");
                Ok(user)
            }
            Err(RepositoryError::AlreadyExists) => Err(email_taken().into()),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Same pipeline as creation minus token assignment; the remember token
    /// is left untouched.
    pub async fn update_user(&self, request: UpdateUserRequest) -> Result<User, UserServiceError> {
        self.validate(
            &request.name,
            &request.email,
            &request.password,
            request.password_confirm.as_deref(),
            Some(request.user_id),
        )
        .await?;

        let changes = UserChanges {
            name: request.name,
            email: normalize_email(&request.email),
            password_digest: self.hash_password(&request.password)?,
        };

        match self.users.update_user(request.user_id, changes).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "User updated");
                Ok(user)
            }
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(RepositoryError::AlreadyExists) => Err(email_taken().into()),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.find_by_id(id).await?)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self.users.find_by_email(email).await?)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, UserServiceError> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !user.authenticate(password) {
            tracing::warn!(user_id = user.id, "Rejected sign-in attempt");
            return Err(UserServiceError::InvalidCredentials);
        }

        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), UserServiceError> {
        match self.users.delete_user(id).await {
            Ok(()) => {
                tracing::info!(user_id = id, "User deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    pub async fn fetch_users(
        &self,
        scope: &UserScope,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<User>, UserServiceError> {
        Ok(self.users.fetch(scope, limit, offset).await?)
    }

    pub async fn count_users(&self, scope: &UserScope) -> Result<i64, UserServiceError> {
        Ok(self.users.count(scope).await?)
    }

    pub async fn fetch_microposts(
        &self,
        scope: &MicropostScope,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Micropost>, UserServiceError> {
        Ok(self.microposts.fetch(scope, limit, offset).await?)
    }

    pub async fn count_microposts(&self, scope: &MicropostScope) -> Result<i64, UserServiceError> {
        Ok(self.microposts.count(scope).await?)
    }

    pub async fn following(
        &self,
        user: &User,
        other: &User,
    ) -> Result<Option<Subscription>, UserServiceError> {
        Ok(self.subscriptions.find(user.id, other.id).await?)
    }

    pub async fn is_following(&self, user: &User, other: &User) -> Result<bool, UserServiceError> {
        Ok(self.following(user, other).await?.is_some())
    }

    /// Adds a follow edge. Repeating the call adds another edge.
    pub async fn follow(&self, user: &User, other: &User) -> Result<Subscription, UserServiceError> {
        match self.subscriptions.create(user.id, other.id).await {
            Ok(subscription) => {
                tracing::info!(follower_id = user.id, author_id = other.id, "Followed user");
                Ok(subscription)
            }
            Err(RepositoryError::MissingReference) => Err(UserServiceError::UserNotFound),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    /// Removes one follow edge. Fails with `NotFollowing` when there is none.
    pub async fn unfollow(&self, user: &User, other: &User) -> Result<(), UserServiceError> {
        match self.subscriptions.delete_one(user.id, other.id).await {
            Ok(()) => {
                tracing::info!(follower_id = user.id, author_id = other.id, "Unfollowed user");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(UserServiceError::NotFollowing),
            Err(e) => Err(UserServiceError::RepositoryError(e)),
        }
    }

    async fn validate(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirm: Option<&str>,
        except_id: Option<i64>,
    ) -> Result<(), UserServiceError> {
        let mut errors = validate_attributes(name, email, password, password_confirm);

        // Checked against the email as given; storage compares without case
        if !email.trim().is_empty() && self.users.email_taken(email, except_id).await? {
            errors.add("email", TAKEN);
        }

        if !errors.is_empty() {
            tracing::warn!(fields = ?errors.fields().collect::<Vec<_>>(), "User validation failed");
        }

        Ok(errors.into_result()?)
    }

    fn hash_password(&self, password: &str) -> Result<String, UserServiceError> {
        password::hash_password(password).map_err(|e| UserServiceError::HashingError(e.to_string()))
    }
}

const TAKEN: &str = "has already been taken";

fn email_taken() -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    errors.add("email", TAKEN);
    errors
}
