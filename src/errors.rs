use std::fmt;

use datagres_db::DbError;

/// Application-specific errors
#[derive(Debug)]
pub enum DatagresError {
    /// Database operation error
    Database(DbError),
    /// The database did not accept a connection at startup
    Unreachable(String),
    /// Config file could not be read or parsed
    Config(String),
    /// Logging could not be set up
    Logging(String),
    /// I/O error
    Io(std::io::Error),
}

impl fmt::Display for DatagresError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Database(err) => write!(f, "Database error: {err}"),
            Self::Unreachable(name) => write!(f, "Could not connect to {name}"),
            Self::Config(msg) => write!(f, "Config error: {msg}"),
            Self::Logging(msg) => write!(f, "Logging error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for DatagresError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Database(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Unreachable(_) | Self::Config(_) | Self::Logging(_) => None,
        }
    }
}

impl From<std::io::Error> for DatagresError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<DbError> for DatagresError {
    fn from(err: DbError) -> Self {
        Self::Database(err)
    }
}
