use std::error::Error as StdError;

use axum::{http::StatusCode, response::Response};
use thiserror::Error;

use crate::{application::repos::RepoError, cache::CacheError, infra::error::InfraError};

/// Diagnostic chain attached to error responses for the response-logging middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub source: &'static str,
    pub status: StatusCode,
    pub messages: Vec<String>,
}

impl ErrorReport {
    pub fn from_error(source: &'static str, status: StatusCode, error: &dyn StdError) -> Self {
        let mut messages = vec![error.to_string()];
        let mut current = error.source();
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        Self {
            source,
            status,
            messages,
        }
    }

    pub fn from_message(
        source: &'static str,
        status: StatusCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            status,
            messages: vec![message.into()],
        }
    }

    pub fn attach(self, response: &mut Response) {
        response.extensions_mut().insert(self);
    }
}

/// Errors that stop the process before or while serving.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error("cache warm-up failed: {0}")]
    Warmup(#[source] RepoError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Short operator-facing hint printed next to the error chain.
    pub fn hint(&self) -> &'static str {
        match self {
            AppError::Infra(InfraError::Configuration { .. }) => {
                "check bazaar.toml, BAZAAR__* variables and command-line flags"
            }
            AppError::Infra(InfraError::Database { .. }) => {
                "check that Postgres is reachable at database.url"
            }
            AppError::Infra(InfraError::Cache(CacheError::Connection { .. })) => {
                "check that the cache backend is reachable at cache.host:cache.port"
            }
            AppError::Infra(InfraError::Cache(_)) => "the cache backend rejected an operation",
            AppError::Infra(InfraError::Telemetry(_)) => "logging could not be initialised",
            AppError::Infra(InfraError::Io(_)) => "an I/O operation failed",
            AppError::Warmup(_) => "the catalog could not be read while warming the cache",
            AppError::Unexpected(_) => "unexpected failure",
        }
    }
}

impl From<CacheError> for AppError {
    fn from(error: CacheError) -> Self {
        Self::Infra(InfraError::Cache(error))
    }
}
