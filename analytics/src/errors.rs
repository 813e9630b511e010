use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Query exceeded the configured timeout")]
    QueryTimeout,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Client-facing classification of a failure, rendered as `{"error": "<kind>"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    StorageUnavailable,
    QueryTimeout,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::StorageUnavailable => "storage_unavailable",
            ErrorKind::QueryTimeout => "query_timeout",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Database(db_err) => classify_database_error(db_err),
            Error::QueryTimeout => ErrorKind::QueryTimeout,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Migration(_) | Error::Config(_) | Error::Metrics(_) => ErrorKind::Internal,
        }
    }
}

fn classify_database_error(err: &sqlx::Error) -> ErrorKind {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) | sqlx::Error::PoolClosed => {
            ErrorKind::StorageUnavailable
        }
        sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
            Some("57014") => ErrorKind::QueryTimeout, // query_canceled (statement_timeout)
            Some(code) if is_unavailable_code(code) => ErrorKind::StorageUnavailable,
            _ => ErrorKind::Internal,
        },
        _ => ErrorKind::Internal,
    }
}

fn is_unavailable_code(code: &str) -> bool {
    code.starts_with("08") || // connection_exception class
    code == "57P01" || // admin_shutdown
    code == "57P03" || // cannot_connect_now
    code == "53300" // too_many_connections
}
