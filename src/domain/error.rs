//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the input contract.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("element {id} references unknown parent {parent_id}")]
    UnresolvedParent { id: i64, parent_id: i64 },

    #[error("cycle detected in parent chain at element {0}")]
    CycleDetected(i64),

    #[error("unknown element id: {0}")]
    UnknownElement(i64),
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
