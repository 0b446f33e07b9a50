use service_core::error::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Passwords must have a length of at least 8 characters.")]
    InvalidPasswordLength,

    #[error("Passwords must contain a lower case character, an upper case character and a digit.")]
    InvalidPasswordFormat,

    #[error("A user with the name '{0}' already exists.")]
    NameInUse(String),

    #[error("A user with the email address '{0}' already exists.")]
    EmailInUse(String),

    #[error("No user with id '{0}' was found.")]
    UserNotFound(Uuid),

    #[error("No project with id '{0}' was found.")]
    ProjectNotFound(Uuid),

    #[error("No group with id '{0}' was found.")]
    GroupNotFound(Uuid),

    #[error("No question with id '{0}' was found.")]
    QuestionNotFound(Uuid),

    #[error("No consolidation with id '{0}' was found.")]
    ConsolidationNotFound(Uuid),

    #[error("No term with id '{0}' was found.")]
    TermNotFound(Uuid),

    #[error("No passage with id '{0}' was found.")]
    PassageNotFound(Uuid),

    #[error("No comment with id '{0}' was found.")]
    CommentNotFound(Uuid),

    #[error("No users were selected.")]
    EmptySelection,

    #[error("Comments may only be removed by their author or a system administrator.")]
    NotCommentAuthor,

    #[error("{0}")]
    Conflict(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid credentials"))
            }
            ServiceError::InvalidPasswordLength | ServiceError::InvalidPasswordFormat => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::NameInUse(_) | ServiceError::EmailInUse(_) => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::UserNotFound(_)
            | ServiceError::ProjectNotFound(_)
            | ServiceError::GroupNotFound(_)
            | ServiceError::QuestionNotFound(_)
            | ServiceError::ConsolidationNotFound(_)
            | ServiceError::TermNotFound(_)
            | ServiceError::PassageNotFound(_)
            | ServiceError::CommentNotFound(_) => {
                AppError::NotFound(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::EmptySelection => AppError::BadRequest(anyhow::anyhow!(err.to_string())),
            ServiceError::NotCommentAuthor => {
                AppError::AuthError(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
        }
    }
}
