//! Error types for RBP.

use thiserror::Error;

/// Result type alias for RBP operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during packing operations.
///
/// Single-bin evaluation never produces an error: a bin that cannot hold an
/// item reports `None`. Only argument validation and solution-level problems
/// surface here.
#[derive(Debug, Error)]
pub enum Error {
    /// An argument is outside its accepted domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An operation was invoked on a solution that is not ready for it.
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// A free-space or occupancy invariant was broken. Never recovered from.
    #[error("Internal inconsistency: {0}")]
    InternalInconsistency(String),

    /// No bin, not even an empty one, can accept an item.
    #[error("Infeasible instance: {0}")]
    InfeasibleInstance(String),
}

impl Error {
    /// Returns true for errors that indicate a bug in the engine rather than
    /// bad input.
    pub fn is_internal(&self) -> bool {
        matches!(self, Error::InternalInconsistency(_))
    }
}
