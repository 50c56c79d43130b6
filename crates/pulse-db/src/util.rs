use chrono::{DateTime, Utc};
use pulse_core::error::BackendError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("json encode failed: {message}")]
    JsonEncode { message: String },
    #[error("json decode failed: {message}")]
    JsonDecode { message: String },
    #[error("sqlite: {message}")]
    Sqlite { message: String },
    #[error("duplicate id: {id}")]
    Duplicate { id: String },
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite {
            message: err.to_string(),
        }
    }
}

impl From<DbError> for BackendError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Sqlite { message } => BackendError::Unavailable { message },
            other => BackendError::Rejected {
                message: other.to_string(),
            },
        }
    }
}

pub fn to_rfc3339(value: &DateTime<Utc>) -> String {
    value.to_rfc3339()
}

pub fn encode_json<T: Serialize>(value: &T) -> Result<String, DbError> {
    serde_json::to_string(value).map_err(|err| DbError::JsonEncode {
        message: err.to_string(),
    })
}

pub fn decode_json<T: DeserializeOwned>(value: &str) -> Result<T, DbError> {
    serde_json::from_str(value).map_err(|err| DbError::JsonDecode {
        message: err.to_string(),
    })
}

pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, _)
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
