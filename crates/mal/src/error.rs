//! Error types for region-backed allocators
//!
//! Uses thiserror for clean, idiomatic Rust error definitions.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

use crate::config::FailureMode;

// ============================================================================
// Main Error Types
// ============================================================================

/// Allocator errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// The request does not fit in what is left of the region
    #[error(
        "{allocator} exhausted: requested {requested} bytes, {available} of {capacity} available"
    )]
    AllocationExhausted {
        /// Allocator kind that ran out of room
        allocator: &'static str,
        /// Bytes the caller asked for
        requested: usize,
        /// Bytes still free in the region
        available: usize,
        /// Region capacity in bytes
        capacity: usize,
    },

    /// The page source could not map or unmap a region
    #[error("backing {operation} of {size} bytes failed: {reason}")]
    BackingAllocationFailed {
        /// `acquire` or `release`
        operation: &'static str,
        /// Length of the region involved
        size: usize,
        /// OS-level cause
        reason: String,
    },

    /// The caller broke an allocator contract (out-of-order release, foreign slot, ...)
    #[error("precondition violated in {allocator}: {reason}")]
    PreconditionViolation {
        /// Allocator kind that detected the misuse
        allocator: &'static str,
        /// What was wrong
        reason: String,
    },

    /// The requested component does not exist in this crate
    #[error("{feature} is not implemented")]
    Unimplemented {
        /// Missing component
        feature: &'static str,
    },

    /// Construction parameters cannot describe a valid allocator
    #[error("Invalid configuration: {reason}")]
    InvalidConfig {
        /// Why the parameters were rejected
        reason: String,
    },

    /// Size arithmetic overflowed `usize`
    #[error("Size overflow during operation: {operation}")]
    SizeOverflow {
        /// Operation that overflowed
        operation: &'static str,
    },
}

impl MemoryError {
    /// Check if error is retryable
    ///
    /// Only exhaustion is: the caller can reset, free, or ask for less.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AllocationExhausted { .. })
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationExhausted { allocator, .. } => match *allocator {
                "arena" => "MEM:ARENA:EXHAUSTED",
                "pool" => "MEM:POOL:EXHAUSTED",
                _ => "MEM:STACK:EXHAUSTED",
            },
            Self::BackingAllocationFailed { .. } => "MEM:BACKING:FAILED",
            Self::PreconditionViolation { .. } => "MEM:PRECONDITION",
            Self::Unimplemented { .. } => "MEM:UNIMPLEMENTED",
            Self::InvalidConfig { .. } => "MEM:CONFIG:INVALID",
            Self::SizeOverflow { .. } => "MEM:ALLOC:OVERFLOW",
        }
    }

    /// Apply a failure mode to this error
    ///
    /// Under [`FailureMode::Abort`] the error is logged and the process aborts;
    /// otherwise the error is handed back unchanged for propagation.
    pub fn escalate(self, mode: FailureMode) -> Self {
        if mode == FailureMode::Abort {
            #[cfg(feature = "logging")]
            error!(code = self.code(), "aborting on allocator failure: {}", self);

            std::process::abort();
        }
        self
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create allocation exhausted error
    pub fn exhausted(
        allocator: &'static str,
        requested: usize,
        available: usize,
        capacity: usize,
    ) -> Self {
        #[cfg(feature = "logging")]
        warn!(allocator, requested, available, capacity, "allocator exhausted");

        Self::AllocationExhausted {
            allocator,
            requested,
            available,
            capacity,
        }
    }

    /// Create backing allocation failed error
    pub fn backing_failed(operation: &'static str, size: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();

        #[cfg(feature = "logging")]
        error!(operation, size, %reason, "page source call failed");

        Self::BackingAllocationFailed {
            operation,
            size,
            reason,
        }
    }

    /// Create precondition violation error
    pub fn precondition(allocator: &'static str, reason: impl Into<String>) -> Self {
        let reason = reason.into();

        #[cfg(feature = "logging")]
        warn!(allocator, %reason, "allocator precondition violated");

        Self::PreconditionViolation { allocator, reason }
    }

    /// Create unimplemented error
    pub fn unimplemented(feature: &'static str) -> Self {
        Self::Unimplemented { feature }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &'static str) -> Self {
        Self::SizeOverflow { operation }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for allocator operations
pub type MemoryResult<T> = core::result::Result<T, MemoryError>;

/// Generic result type alias
pub type Result<T> = MemoryResult<T>;

// ============================================================================
// Tests
// ============================================================================
