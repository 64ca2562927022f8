//! Error types for bams.
//!
//! This module defines all error types used throughout the bams crate. The
//! variants follow the dashboard's failure taxonomy: validation errors are
//! caught before any network call, gateway errors abort an operation without
//! touching local state, and nothing is fatal to the process.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for bams operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Input Errors ===
    /// A submitted field is out of range or malformed.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Message suitable for display next to the field.
        message: String,
    },

    // === Gateway Errors ===
    /// The remote endpoint answered with a non-success status.
    #[error("{message}")]
    Remote {
        /// HTTP status code returned by the server.
        status: u16,
        /// Server-provided message, or `HTTP <status>`.
        message: String,
    },

    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A response arrived but could not be interpreted.
    #[error("unexpected response from {endpoint}: {message}")]
    UnexpectedResponse {
        /// Logical endpoint name.
        endpoint: &'static str,
        /// Description of what was wrong with the payload.
        message: String,
    },

    // === Session Errors ===
    /// No operator is logged in.
    #[error("not logged in")]
    NotAuthenticated,

    /// The logged-in operator lacks a capability.
    #[error("operator '{username}' lacks the '{permission}' permission")]
    Unauthorized {
        /// The operator that attempted the action.
        username: String,
        /// The missing capability.
        permission: String,
    },

    /// An admin account could not be created or removed.
    #[error("admin account error: {message}")]
    Account {
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for bams operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for a single field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create a remote error from a status code and message.
    #[must_use]
    pub fn remote(status: u16, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Create an admin account error.
    #[must_use]
    pub fn account(message: impl Into<String>) -> Self {
        Self::Account {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error was raised by input validation.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error came from the remote gateway.
    #[must_use]
    pub fn is_gateway(&self) -> bool {
        matches!(
            self,
            Self::Remote { .. } | Self::Transport(_) | Self::UnexpectedResponse { .. }
        )
    }

    /// Check if this error is an authentication or authorization failure.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Unauthorized { .. })
    }

    /// The field a validation error refers to, if any.
    #[must_use]
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}
