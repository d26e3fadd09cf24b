use std::error;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DBError {
    #[error(transparent)]
    SQLError(#[from] sqlx::Error),
    #[error(transparent)]
    MigrationError(#[from] sqlx::migrate::MigrateError),
    #[error("Did not find sensor: {0}")]
    SensorNotFound(i64),
    #[error("Did not find project: {0}")]
    ProjectNotFound(i64),
}

#[derive(Debug, Error)]
pub enum SerialError {
    #[error("No serial port available, tried: {0}")]
    PortUnavailable(String),
    #[error("Serial port closed")]
    Eof,
    #[error("Serial I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed line: {0}")]
    MalformedLine(String),
    #[error("Unknown sensor key: {0}")]
    UnknownKey(String),
    #[error("Non-numeric value: {0}")]
    NonNumericValue(String),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Arguments are not used as specified")]
    ArgumentError(),
}

#[derive(Debug, Error)]
pub enum ObserverError {
    #[error("{0}")]
    User(Box<dyn error::Error + Send + Sync>),
    #[error("{0}")]
    Internal(Box<dyn error::Error + Send + Sync>),
}

impl From<DBError> for ObserverError {
    fn from(err: DBError) -> Self {
        match err {
            DBError::SensorNotFound(_) | DBError::ProjectNotFound(_) => {
                ObserverError::User(Box::from(err))
            }
            DBError::SQLError(_) | DBError::MigrationError(_) => {
                ObserverError::Internal(Box::from(err))
            }
        }
    }
}

impl From<ApiError> for ObserverError {
    fn from(err: ApiError) -> Self {
        ObserverError::User(Box::from(err))
    }
}
