//! Error handling for the ordena library
//!
//! This module provides the error taxonomy shared by every container:
//! precondition violations, state violations (missing/duplicate keys, empty
//! containers, out-of-view writes), concurrent-modification detection, and
//! structural contract violations.

use thiserror::Error;

/// Main error type for the ordena library
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrdenaError {
    /// A caller-supplied argument violates a precondition
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the violated precondition
        message: String,
    },

    /// A lookup that was required to succeed found no matching key
    #[error("key not found: {message}")]
    KeyNotFound {
        /// Description of the missing key
        message: String,
    },

    /// An insert was rejected because an equal key already exists
    #[error("duplicate key: {message}")]
    DuplicateKey {
        /// Description of the conflicting key
        message: String,
    },

    /// A remove or peek was attempted on an empty container
    #[error("empty container: {message}")]
    Empty {
        /// Name of the operation that found the container empty
        message: String,
    },

    /// A write through a range view targeted a key outside the view's bounds
    #[error("key outside view range: {message}")]
    OutOfViewRange {
        /// Description of the rejected write
        message: String,
    },

    /// The backing container was structurally modified while a cursor was live
    #[error("concurrent modification: {message}")]
    ConcurrentModification {
        /// Description of the invalidated enumeration
        message: String,
    },

    /// A structural contract of the container does not hold
    #[error("contract violation: {message}")]
    ContractViolation {
        /// Description of the broken contract
        message: String,
    },
}

impl OrdenaError {
    /// Create an invalid argument error
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument { message: message.into() }
    }

    /// Create a key not found error
    pub fn key_not_found<S: Into<String>>(message: S) -> Self {
        Self::KeyNotFound { message: message.into() }
    }

    /// Create a duplicate key error
    pub fn duplicate_key<S: Into<String>>(message: S) -> Self {
        Self::DuplicateKey { message: message.into() }
    }

    /// Create an empty container error
    pub fn empty<S: Into<String>>(message: S) -> Self {
        Self::Empty { message: message.into() }
    }

    /// Create an out-of-view-range error
    pub fn out_of_view_range<S: Into<String>>(message: S) -> Self {
        Self::OutOfViewRange { message: message.into() }
    }

    /// Create a concurrent modification error
    pub fn concurrent_modification<S: Into<String>>(message: S) -> Self {
        Self::ConcurrentModification { message: message.into() }
    }

    /// Create a contract violation error
    pub fn contract_violation<S: Into<String>>(message: S) -> Self {
        Self::ContractViolation { message: message.into() }
    }

    /// Check if this is a recoverable error
    ///
    /// Every failure in this crate is synchronous and local, and almost all
    /// of them leave the container fully usable, so the caller can correct
    /// the input and retry. The exceptions: a concurrent-modification report
    /// permanently invalidates the cursor that raised it, and a contract
    /// violation means the container itself is broken.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::InvalidArgument { .. } => true,
            Self::KeyNotFound { .. } => true,
            Self::DuplicateKey { .. } => true,
            Self::Empty { .. } => true,
            Self::OutOfViewRange { .. } => true,
            Self::ConcurrentModification { .. } => false,
            Self::ContractViolation { .. } => false,
        }
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidArgument { .. } => "precondition",
            Self::KeyNotFound { .. } => "state",
            Self::DuplicateKey { .. } => "state",
            Self::Empty { .. } => "state",
            Self::OutOfViewRange { .. } => "state",
            Self::ConcurrentModification { .. } => "concurrency",
            Self::ContractViolation { .. } => "contract",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, OrdenaError>;
