//! Error types for gig-escrow.

use gig_ledger::LedgerError;
use thiserror::Error;

use crate::gig::GigId;

/// Result type for gig escrow operations.
pub type Result<T> = std::result::Result<T, GigError>;

/// Coarse classification of a [`GigError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong sender for the operation.
    Unauthorized,
    /// Operation not valid in the current state.
    InvalidState,
    /// Dispute already resolved.
    AlreadyResolved,
    /// Operation needs an assigned freelancer and there is none.
    NoFreelancerAssigned,
    /// No gig with the given identifier.
    NotFound,
    /// Malformed input (description, command payload, configuration).
    InvalidInput,
    /// The custody ledger refused the operation.
    Ledger,
}

/// Errors that can occur in gig escrow operations.
///
/// Every error aborts the operation before any state or value moves.
#[derive(Debug, Error)]
pub enum GigError {
    /// The sender may not perform this operation on this gig.
    #[error("unauthorized: {sender} may not {operation}")]
    Unauthorized {
        /// The attempted operation.
        operation: &'static str,
        /// The authenticated sender.
        sender: String,
    },

    /// The operation is not valid in the gig's current state.
    #[error("invalid state: cannot {operation} while {state}")]
    InvalidState {
        /// The attempted operation.
        operation: &'static str,
        /// The gig's current state.
        state: String,
    },

    /// The dispute on this gig has already been resolved.
    #[error("dispute on gig {0} already resolved")]
    AlreadyResolved(GigId),

    /// The gig has no assigned freelancer.
    #[error("no freelancer assigned to gig {0}")]
    NoFreelancerAssigned(GigId),

    /// No gig with this identifier.
    #[error("gig not found: {0}")]
    GigNotFound(GigId),

    /// Description exceeds the configured maximum.
    #[error("description too long: {len} bytes, max {max}")]
    DescriptionTooLong {
        /// Submitted length.
        len: usize,
        /// Configured maximum.
        max: usize,
    },

    /// A command payload could not be decoded.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Invalid engine configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The custody ledger rejected a primitive.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl GigError {
    /// Create an unauthorized error.
    #[must_use]
    pub fn unauthorized(operation: &'static str, sender: impl ToString) -> Self {
        Self::Unauthorized {
            operation,
            sender: sender.to_string(),
        }
    }

    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(operation: &'static str, state: impl ToString) -> Self {
        Self::InvalidState {
            operation,
            state: state.to_string(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::InvalidState { .. } => ErrorKind::InvalidState,
            Self::AlreadyResolved(_) => ErrorKind::AlreadyResolved,
            Self::NoFreelancerAssigned(_) => ErrorKind::NoFreelancerAssigned,
            Self::GigNotFound(_) => ErrorKind::NotFound,
            Self::DescriptionTooLong { .. } | Self::InvalidCommand(_) | Self::Config(_) => {
                ErrorKind::InvalidInput
            }
            Self::Ledger(_) => ErrorKind::Ledger,
        }
    }
}

impl From<serde_json::Error> for GigError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidCommand(e.to_string())
    }
}
