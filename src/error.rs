//! Unified application error model and mapping helpers.
//! One taxonomy is shared by the plan store, the EXPLAIN parser and the HTTP
//! layer; handlers map it to a status code and render the message directly.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Persistence was requested but no connection string is configured.
    #[error("No database configured")]
    Configuration,
    /// Connect, query or row decoding failed in the storage backend.
    #[error("{0}")]
    Storage(String),
    #[error("No plan found for reference '{0}'")]
    NotFound(String),
    /// More than one record shares a reference.
    #[error("Expected 1 record. Found {0}")]
    Cardinality(usize),
    #[error("{0}")]
    Parse(String),
    #[error("Error reading from file upload: {0}")]
    Upload(String),
    /// Saved plan text was not valid base64 or not UTF-8 once decoded.
    #[error("Plan text is not valid base64: {0}")]
    Encoding(String),
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl PlanError {
    pub fn storage<S: Into<String>>(msg: S) -> Self { PlanError::Storage(msg.into()) }
    pub fn parse<S: Into<String>>(msg: S) -> Self { PlanError::Parse(msg.into()) }
    pub fn upload<S: Into<String>>(msg: S) -> Self { PlanError::Upload(msg.into()) }

    pub fn code_str(&self) -> &'static str {
        match self {
            PlanError::Configuration => "configuration_error",
            PlanError::Storage(_) => "storage_error",
            PlanError::NotFound(_) => "not_found",
            PlanError::Cardinality(_) => "cardinality_error",
            PlanError::Parse(_) => "parse_error",
            PlanError::Upload(_) => "upload_error",
            PlanError::Encoding(_) => "encoding_error",
            PlanError::Config(_) => "config_error",
        }
    }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            PlanError::Configuration => 503,
            PlanError::Storage(_) => 503,
            PlanError::NotFound(_) => 404,
            PlanError::Cardinality(_) => 500,
            PlanError::Parse(_) => 422,
            PlanError::Upload(_) => 400,
            PlanError::Encoding(_) => 400,
            PlanError::Config(_) => 500,
        }
    }
}

pub type PlanResult<T> = Result<T, PlanError>;

impl From<tokio_postgres::Error> for PlanError {
    fn from(err: tokio_postgres::Error) -> Self {
        PlanError::Storage(err.to_string())
    }
}
