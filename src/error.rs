//! Unified error handling for the tfsclient library.
//!
//! This module provides the error hierarchy used by every client operation, built
//! with `thiserror` so callers can match on the failure category instead of parsing
//! messages.
//!
//! ## Error Categories
//!
//! - [`TfsError::Validation`]: a required argument was empty or missing
//! - [`TfsError::ResponseShape`]: the server answered with JSON of an unexpected shape
//! - [`TfsError::NotJson`]: the server answered with a body that is not JSON
//! - [`TfsError::Transport`]: the server answered with a non-2xx status
//! - [`TfsError::RelationNotFound`]: a relation could not be located for removal
//! - [`ConfigError`]: configuration loading and validation failures
//!
//! Field commits on a [`WorkItem`](crate::models::WorkItem) never surface these
//! errors; they report a [`CommitResult`](crate::models::CommitResult) instead.
//!
//! ## Example
//!
//! ```rust
//! use tfsclient::error::TfsError;
//!
//! fn example() -> Result<(), TfsError> {
//!     Err(TfsError::validation("type name can't be empty"))
//! }
//!
//! assert!(matches!(example(), Err(TfsError::Validation(_))));
//! ```

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the tfsclient library.
#[derive(Error, Debug)]
pub enum TfsError {
    /// A caller supplied an empty or missing required argument.
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// The response parsed as JSON but lacked an expected key or had the wrong shape.
    #[error("Unexpected response from {operation}: {message}")]
    ResponseShape {
        /// The client operation that received the response.
        operation: String,
        /// Description of what was missing or malformed.
        message: String,
    },

    /// The response body could not be parsed as JSON.
    #[error("Response from {url} is not JSON: {message}")]
    NotJson {
        /// URL of the request.
        url: String,
        /// Parser error message.
        message: String,
    },

    /// The server answered with a non-success status code.
    #[error("{method} {url} failed with status {status}: {message}")]
    Transport {
        /// HTTP method of the request.
        method: String,
        /// URL of the request.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The request could not be sent or its body could not be read.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// No relation matched the requested type and destination.
    #[error(
        "Relation '{relation_name}' to work item {destination:?} not found on work item {work_item_id}"
    )]
    RelationNotFound {
        /// Work item whose relations were searched.
        work_item_id: i32,
        /// Relation type name that was searched for.
        relation_name: String,
        /// Destination work item id that was searched for.
        destination: Option<i32>,
    },

    /// Exceeded the maximum number of page requests while paginating.
    #[error("Exceeded maximum requests ({max}) while fetching data, retrieved {retrieved} items")]
    PaginationLimitExceeded {
        /// Maximum allowed requests.
        max: usize,
        /// Number of items retrieved before the limit was hit.
        retrieved: usize,
    },

    /// A request body could not be serialized.
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),

    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A generic error for cases not covered by specific error types.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl TfsError {
    /// Shorthand for a [`TfsError::Validation`] error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for a [`TfsError::ResponseShape`] error.
    pub fn response_shape(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseShape {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Returns true when the server answered but the answer was unusable.
    ///
    /// Empty bodies, non-JSON bodies and JSON lacking required keys all count.
    pub fn is_unusable_response(&self) -> bool {
        matches!(self, Self::ResponseShape { .. } | Self::NotJson { .. })
    }
}

/// Errors that can occur during configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration field is missing.
    #[error("{field} is required (use the {env_var} env var, the config file, or set it explicitly)")]
    MissingRequired {
        /// Name of the missing field.
        field: String,
        /// Environment variable name for this field.
        env_var: String,
    },

    /// Failed to read the configuration file.
    #[error("Failed to read config file at {path}: {message}")]
    FileReadError {
        /// Path to the config file.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to parse the configuration file.
    #[error("Failed to parse config file at {path}: {message}")]
    ParseError {
        /// Path to the config file.
        path: PathBuf,
        /// Parse error message.
        message: String,
    },

    /// An invalid value was provided for a configuration field.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue {
        /// Name of the field with invalid value.
        field: String,
        /// Description of why the value is invalid.
        message: String,
    },
}

/// Type alias for Results using [`TfsError`].
pub type Result<T> = std::result::Result<T, TfsError>;
