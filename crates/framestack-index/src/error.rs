use std::fmt;

pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the persistence adapter.
#[derive(Debug)]
pub enum Error {
    Database(rusqlite::Error),
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Query(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Database(err) => write!(f, "database error: {err}"),
            Error::Io(err) => write!(f, "io error: {err}"),
            Error::Serialization(err) => write!(f, "serialization error: {err}"),
            Error::Query(msg) => write!(f, "query error: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Database(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Serialization(err) => Some(err),
            Error::Query(_) => None,
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err)
    }
}

impl From<Error> for framestack_types::Error {
    fn from(err: Error) -> Self {
        match &err {
            Error::Database(_) => framestack_types::Error::storage_unavailable(err.to_string()),
            Error::Io(_) => framestack_types::Error::storage_unavailable(err.to_string()),
            Error::Serialization(_) => framestack_types::Error::internal(err.to_string()),
            Error::Query(_) => framestack_types::Error::invalid_argument(err.to_string()),
        }
    }
}
