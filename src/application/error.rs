//! Application-level errors (wraps domain errors)

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("no .{extension} map file given")]
    MissingRequiredFile { extension: String },

    #[error("map not found: {}", path.display())]
    MapNotFound { path: PathBuf },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// Whether this is a document parse failure (as opposed to I/O or config).
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self,
            ApplicationError::Domain(
                DomainError::MalformedXml { .. }
                    | DomainError::MissingRoot { .. }
                    | DomainError::MissingId { .. }
                    | DomainError::DuplicateId(_)
            )
        )
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
