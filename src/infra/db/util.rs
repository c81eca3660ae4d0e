use sqlx::error::ErrorKind;

use crate::application::repos::RepoError;

/// SQLSTATE raised when `statement_timeout` cancels a query.
const QUERY_CANCELED: &str = "57014";

pub fn map_sqlx_error(err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::RowNotFound => RepoError::NotFound,
        sqlx::Error::PoolTimedOut => RepoError::Timeout,
        sqlx::Error::Database(db) => match db.kind() {
            ErrorKind::UniqueViolation => RepoError::Duplicate {
                constraint: db.constraint().unwrap_or("unknown").to_string(),
            },
            ErrorKind::ForeignKeyViolation => RepoError::InvalidInput {
                message: db.message().to_string(),
            },
            ErrorKind::NotNullViolation | ErrorKind::CheckViolation => RepoError::Integrity {
                message: db.message().to_string(),
            },
            _ if db.code().as_deref() == Some(QUERY_CANCELED) => RepoError::Timeout,
            _ => RepoError::from_persistence(db),
        },
        other => RepoError::from_persistence(other),
    }
}

/// Postgres counts are `BIGINT`; they are never negative.
pub(crate) fn convert_count(value: i64) -> Result<u64, RepoError> {
    u64::try_from(value).map_err(|_| RepoError::from_persistence("count is negative"))
}
