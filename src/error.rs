//! Error types for taskdeck
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (invalid input, unknown or ambiguous task)
//! - 3: Not authenticated
//! - 4: Operation failed (backend, IO, serialization)

use thiserror::Error;

/// Exit codes for the `td` CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const NOT_AUTHENTICATED: i32 = 3;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for taskdeck operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("{0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Ambiguous(String),

    // Authentication (exit code 3)
    #[error("Authentication failed: {0}")]
    Auth(String),

    // Operation failures (exit code 4)
    #[error("Data access failed: {0}")]
    DataAccess(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Validation(_) | Error::NotFound(_) | Error::Ambiguous(_) => {
                exit_codes::USER_ERROR
            }

            Error::Auth(_) => exit_codes::NOT_AUTHENTICATED,

            Error::DataAccess(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Wrap any displayable backend failure as a data-access error.
    pub fn data_access(err: impl std::fmt::Display) -> Self {
        Error::DataAccess(err.to_string())
    }
}

/// Result type alias for taskdeck operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_taxonomy() {
        assert_eq!(Error::Validation("x".into()).exit_code(), exit_codes::USER_ERROR);
        assert_eq!(Error::Auth("x".into()).exit_code(), exit_codes::NOT_AUTHENTICATED);
        assert_eq!(Error::DataAccess("x".into()).exit_code(), exit_codes::OPERATION_FAILED);
    }

    #[test]
    fn validation_message_is_shown_verbatim() {
        let err = Error::Validation("Passwords do not match!".into());
        assert_eq!(err.to_string(), "Passwords do not match!");
    }
}
