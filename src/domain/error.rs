//! Domain-level errors (no external dependencies)

use std::fmt;
use thiserror::Error;

/// Which of the two map documents an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Base map (`.mm`): ids, labels and structure
    Primary,
    /// View-state extension (`.mmx`): fold flags keyed by id
    Sidecar,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Primary => write!(f, "primary"),
            DocumentKind::Sidecar => write!(f, "sidecar"),
        }
    }
}

/// Domain errors represent tree and document-format violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("malformed {document} document: {reason}")]
    MalformedXml {
        document: DocumentKind,
        reason: String,
    },

    #[error("{document} document has no <map> root with a <node> child")]
    MissingRoot { document: DocumentKind },

    #[error("node without ID attribute (TEXT={text:?})")]
    MissingId { text: String },

    #[error("duplicate node id: {0}")]
    DuplicateId(String),

    #[error("node not found: {0}")]
    NodeNotFound(String),

    #[error("arena index no longer refers to a live node")]
    StaleIndex,
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
