use userbook_core_types::RequestId;
use thiserror::Error;

/// Result type alias using UserbookError
pub type Result<T> = std::result::Result<T, UserbookError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Every failure surfaced by the store, the repository or the CLI maps to one
/// of these kinds, and each kind has a stable code for programmatic handling
/// and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Caller input (raised by the collaborator layer, never by the store)
    InvalidInput,

    // Lookups
    NotFound,
    /// Duplicate-key insert. Reserved: the store ignores conflicting inserts.
    AlreadyExists,

    // Schema
    /// A migration step failed or the requested transition is not allowed
    Migration,
    /// Recorded migration history disagrees with the embedded migrations
    ConstraintViolation,

    // Integration/IO
    Io,
    Persistence,
    /// The repository worker is gone or dropped the reply
    Concurrency,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::Migration => "ERR_MIGRATION",
            ExErrorKind::ConstraintViolation => "ERR_CONSTRAINT_VIOLATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::Concurrency => "ERR_CONCURRENCY",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification (`kind`) for programmatic handling plus optional
/// context for debugging: the operation name, the user id involved and the
/// request id of the repository job that failed.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl ToString) -> Self {
        self.entity_id = Some(id.to_string());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the entity ID context, if any
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Get the request ID context, if any
    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (user_id: {})", entity_id)?;
        }
        if let Some(source) = &self.source {
            write!(f, " <- {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain errors for Userbook operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UserbookError {
    // ===== Validation Errors =====
    /// A field was supplied but could not be accepted
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: String, reason: String },

    /// A required field was blank or missing
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    // ===== Lookup Errors =====
    /// A user-directed command targeted an id with no record
    #[error("User not found: {user_id}")]
    UserNotFound { user_id: i64 },

    // ===== Schema Errors =====
    /// No migration is registered for the requested version
    #[error("Unknown schema version: {version}")]
    UnknownSchemaVersion { version: u32 },

    /// The database was written by a newer build
    #[error("Database schema version {on_disk} is newer than supported version {supported}")]
    SchemaAhead { on_disk: u32, supported: u32 },

    /// A migration request that would skip or rewind versions
    #[error("Cannot migrate from version {from} to {to}")]
    MigrationGap { from: u32, to: u32 },
}

impl From<UserbookError> for ExError {
    fn from(err: UserbookError) -> Self {
        match err {
            UserbookError::InvalidField { field, reason } => {
                ExError::new(ExErrorKind::InvalidInput)
                    .with_op("validate")
                    .with_message(format!("Invalid {}: {}", field, reason))
            }

            UserbookError::MissingField { field } => ExError::new(ExErrorKind::InvalidInput)
                .with_op("validate")
                .with_message(format!("Missing required field: {}", field)),

            UserbookError::UserNotFound { user_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(user_id)
                .with_message("User not found"),

            UserbookError::UnknownSchemaVersion { version } => {
                ExError::new(ExErrorKind::Migration)
                    .with_op("migration")
                    .with_message(format!("Unknown schema version {}", version))
            }

            UserbookError::SchemaAhead { on_disk, supported } => {
                ExError::new(ExErrorKind::Migration)
                    .with_op("migration")
                    .with_message(format!(
                        "Database schema version {} is newer than supported version {}",
                        on_disk, supported
                    ))
            }

            UserbookError::MigrationGap { from, to } => ExError::new(ExErrorKind::Migration)
                .with_op("migration")
                .with_message(format!("Cannot migrate from version {} to {}", from, to)),
        }
    }
}
