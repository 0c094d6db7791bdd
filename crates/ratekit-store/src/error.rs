use ratekit_core::ValidationError;
use thiserror::Error;

use crate::collaborator::CollaboratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthorizationError {
    #[error("must be logged in")]
    NotLoggedIn,

    #[error("not permitted")]
    NotPermitted,
}

/// Errors surfaced by the record store and history reader.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Authorization(#[from] AuthorizationError),

    #[error("calculation not found")]
    NotFound,

    /// Retryable; the store never retries on its own.
    #[error("storage temporarily unavailable: {0}")]
    Persistence(#[from] CollaboratorError),
}

impl ServiceError {
    /// Stable machine-readable code, shared by the HTTP and CLI surfaces.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::Authorization(AuthorizationError::NotLoggedIn) => "unauthorized",
            ServiceError::Authorization(AuthorizationError::NotPermitted) => "forbidden",
            ServiceError::NotFound => "not_found",
            ServiceError::Persistence(_) => "unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_cover_every_variant() {
        assert_eq!(
            ServiceError::from(ValidationError::new("name", "too long")).code(),
            "validation_error"
        );
        assert_eq!(
            ServiceError::from(AuthorizationError::NotLoggedIn).code(),
            "unauthorized"
        );
        assert_eq!(
            ServiceError::from(AuthorizationError::NotPermitted).code(),
            "forbidden"
        );
        assert_eq!(ServiceError::NotFound.code(), "not_found");
        assert_eq!(
            ServiceError::from(CollaboratorError::Unavailable("down".to_string())).code(),
            "unavailable"
        );
    }

    #[test]
    fn authorization_message_is_user_facing() {
        let err = ServiceError::from(AuthorizationError::NotLoggedIn);
        assert_eq!(err.to_string(), "must be logged in");
    }
}
