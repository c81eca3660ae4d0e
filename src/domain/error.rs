use thiserror::Error;

/// Rule violations detected before anything reaches the repository.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("`{field}` {message}")]
    Validation {
        field: &'static str,
        message: &'static str,
    },
    #[error("category `{name}` is reserved and cannot be {action}")]
    ReservedCategory { name: String, action: &'static str },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(field: &'static str, message: &'static str) -> Self {
        Self::Validation { field, message }
    }
}
