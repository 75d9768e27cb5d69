use crate::error::ValidationErrors;
use crate::models::micropost::{validate_content, CreateMicropostRequest, Micropost};
use crate::repositories::{MicropostRepository, RepositoryError};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum MicropostServiceError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("Micropost not found")]
    MicropostNotFound,
    #[error("User not found")]
    UserNotFound,
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
}

pub struct MicropostService {
    repository: Arc<dyn MicropostRepository>,
}

impl MicropostService {
    pub fn new(repository: Arc<dyn MicropostRepository>) -> Self {
        Self { repository }
    }

    pub async fn post(
        &self,
        request: CreateMicropostRequest,
    ) -> Result<Micropost, MicropostServiceError> {
        validate_content(&request.content)
            .into_result()
            .map_err(MicropostServiceError::Validation)?;

        match self
            .repository
            .create(request.user_id, &request.content)
            .await
        {
            Ok(micropost) => {
                tracing::info!(
                    micropost_id = micropost.id,
                    user_id = micropost.user_id,
                    "Micropost created"
                );
                Ok(micropost)
            }
            Err(RepositoryError::MissingReference) => Err(MicropostServiceError::UserNotFound),
            Err(e) => Err(MicropostServiceError::RepositoryError(e)),
        }
    }

    pub async fn find(&self, id: i64) -> Result<Option<Micropost>, MicropostServiceError> {
        Ok(self.repository.find_by_id(id).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), MicropostServiceError> {
        match self.repository.delete(id).await {
            Ok(()) => Ok(()),
            Err(RepositoryError::NotFound) => Err(MicropostServiceError::MicropostNotFound),
            Err(e) => Err(MicropostServiceError::RepositoryError(e)),
        }
    }
}
