use thiserror::Error;

/// Errors raised while building or serving table data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// The database rejected a statement; the driver message is kept verbatim
    #[error("{0}")]
    Query(String),

    /// No connection is registered under the requested identifier
    #[error("Unknown connection: {0}")]
    UnknownConnection(String),

    /// The connection URL could not be understood
    #[error("Invalid connection url: {0}")]
    InvalidUrl(String),

    /// A result value could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, DbError>;

impl From<tokio_postgres::Error> for DbError {
    fn from(err: tokio_postgres::Error) -> Self {
        // `Display` on a server error only says "db error"; the wrapped
        // DbError carries the real message.
        let message = err
            .as_db_error()
            .map_or_else(|| err.to_string(), |db| db.to_string());
        Self::Query(message)
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Query(err.to_string())
    }
}
