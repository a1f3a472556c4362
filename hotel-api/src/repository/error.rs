//! Repository error types
//!
//! Every data-access failure is a [`RepositoryError`] carrying the operation
//! that failed, a [`RepositoryErrorKind`] the HTTP layer branches on, and the
//! entity involved when known.
//!
//! # Example
//!
//! ```rust
//! use hotel_api::repository::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
//!
//! let error = RepositoryError::not_found(RepositoryOperation::Find, "Room", 12);
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert_eq!(error.entity_id.as_deref(), Some("12"));
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Creating a new entity
    Insert,
    /// Loading a single entity by key
    Find,
    /// Listing entities with filters
    List,
    /// Updating an existing entity
    Update,
    /// Deleting an entity
    Delete,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert => write!(f, "insert"),
            Self::Find => write!(f, "find"),
            Self::List => write!(f, "list"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// Entity was not found
    NotFound,
    /// A unique key is already taken
    AlreadyExists,
    /// The row changed or vanished between read and write
    EditConflict,
    /// Foreign key or check constraint rejected the write
    ConstraintViolation,
    /// Failed to obtain a connection
    ConnectionFailed,
    /// Query did not finish within the configured timeout
    Timeout,
    /// Any other database failure
    DatabaseError,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::AlreadyExists => write!(f, "already_exists"),
            Self::EditConflict => write!(f, "edit_conflict"),
            Self::ConstraintViolation => write!(f, "constraint_violation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
        }
    }
}

/// Structured repository error with operation context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The type of entity involved (e.g., "Guest", "Room")
    pub entity_type: Option<String>,
    /// The key of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// Create a "not found" error with entity context
    pub fn not_found(
        operation: RepositoryOperation,
        entity_type: impl Into<String>,
        entity_id: impl fmt::Display,
    ) -> Self {
        Self::new(operation, RepositoryErrorKind::NotFound, "Entity not found")
            .with_entity(entity_type, entity_id)
    }

    /// Create an "already exists" error naming the duplicated key
    pub fn already_exists(
        operation: RepositoryOperation,
        entity_type: impl Into<String>,
        identifier: impl fmt::Display,
    ) -> Self {
        Self::new(
            operation,
            RepositoryErrorKind::AlreadyExists,
            "Entity already exists",
        )
        .with_entity(entity_type, identifier)
    }

    /// Create an edit conflict error for a stale or vanished row
    pub fn edit_conflict(entity_type: impl Into<String>, entity_id: impl fmt::Display) -> Self {
        Self::new(
            RepositoryOperation::Update,
            RepositoryErrorKind::EditConflict,
            "Entity was modified or removed concurrently",
        )
        .with_entity(entity_type, entity_id)
    }

    /// Create a timeout error
    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Timeout, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl fmt::Display,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.to_string());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        if let (Some(entity_type), Some(entity_id)) = (&self.entity_type, &self.entity_id) {
            write!(f, " [{}: {}]", entity_type, entity_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

/// Classify a driver error
///
/// The operation defaults to [`RepositoryOperation::Find`]; callers set the
/// real one with [`RepositoryError::with_operation`].
impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;

        let operation = RepositoryOperation::Find;
        match err {
            E::RowNotFound => Self::new(operation, RepositoryErrorKind::NotFound, "Row not found"),
            E::PoolTimedOut => Self::new(
                operation,
                RepositoryErrorKind::ConnectionFailed,
                "Connection pool timed out",
            ),
            E::PoolClosed => Self::new(
                operation,
                RepositoryErrorKind::ConnectionFailed,
                "Connection pool is closed",
            ),
            E::Io(e) => Self::new(operation, RepositoryErrorKind::ConnectionFailed, e.to_string()),
            E::Database(db) => {
                let kind = if db.is_unique_violation() {
                    RepositoryErrorKind::AlreadyExists
                } else if db.is_foreign_key_violation() || db.is_check_violation() {
                    RepositoryErrorKind::ConstraintViolation
                } else {
                    RepositoryErrorKind::DatabaseError
                };
                Self::new(operation, kind, db.message().to_string())
            }
            other => Self::new(operation, RepositoryErrorKind::DatabaseError, other.to_string()),
        }
    }
}
