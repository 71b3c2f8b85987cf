//! Error types for the cadence library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Structural violations rejected by [`crate::graph::PlanGraph`].
///
/// Every variant is returned synchronously and leaves the graph exactly as it
/// was before the attempted mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A step with this id already exists in the graph
    #[error("Step '{id}' already exists")]
    DuplicateId { id: String },
    /// An edge from a step to itself
    #[error("Step '{id}' cannot depend on itself")]
    SelfLoop { id: String },
    /// The identical ordered pair is already present
    #[error("Dependency '{from}' -> '{to}' already exists")]
    DuplicateEdge { from: String, to: String },
    /// One of the endpoints is not a step in the graph
    #[error("Dependency '{from}' -> '{to}' references unknown step '{missing}'")]
    OrphanEdge {
        from: String,
        to: String,
        missing: String,
    },
    /// The edge would close a cycle; `path` lists the steps on it
    #[error("Dependency would create a cycle: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },
}

/// Comprehensive error type for all cadence operations.
#[derive(Error, Debug)]
pub enum CadenceError {
    /// Graph validation failures
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    /// No plan is stored for the given work item
    #[error("Plan for work item '{id}' not found")]
    PlanNotFound { id: String },
    /// Step not found in any plan
    #[error("Step '{id}' not found")]
    StepNotFound { id: String },
    /// No scheduled block matches the given reference
    #[error("No scheduled block for step '{task_id}' on {day} at {start}")]
    BlockNotFound {
        task_id: String,
        day: String,
        start: String,
    },
    /// A manual move that would violate placement invariants
    #[error("Scheduling conflict: {reason}")]
    Conflict { reason: String },
    /// A schedule run was cancelled or replaced by a newer one
    #[error("Schedule run {generation} was superseded")]
    Superseded { generation: u64 },
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration and runtime plumbing errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> CadenceError {
        CadenceError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> CadenceError {
        CadenceError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl CadenceError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a conflict error for a rejected manual placement.
    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict {
            reason: reason.into(),
        }
    }

    /// Wraps a background task failure.
    pub fn join(error: impl fmt::Display) -> Self {
        Self::Configuration {
            message: format!("Task join error: {error}"),
        }
    }

    /// Whether this error is a structural graph violation.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| CadenceError::database(message).with_source(e))
    }
}

/// Result type alias for cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;
