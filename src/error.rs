//! # Error Handling
//!
//! Error types for the clubs core.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           ERROR HIERARCHY                               │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  Error (top-level)                                                     │
//! │  │                                                                      │
//! │  ├── Remote Errors                                                     │
//! │  │   ├── Network              - Request never completed                │
//! │  │   ├── Timeout              - Request exceeded the deadline          │
//! │  │   └── InvalidResponse      - Response body wasn't what we expected  │
//! │  │                                                                      │
//! │  ├── Lookup Errors                                                     │
//! │  │   ├── AttributeNotFound    - Identity has no such attribute         │
//! │  │   └── ClubNotFound         - Club id unknown to the directory       │
//! │  │                                                                      │
//! │  └── Operation Errors                                                  │
//! │      ├── Validation           - Rejected before any remote call        │
//! │      ├── PartialFailure       - One of two dependent writes succeeded  │
//! │      └── Serialization        - JSON encode/decode failure             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Read failures degrade gracefully (previous snapshot retained, absent
//! attribute treated as empty); write failures inside the coordinator's
//! background sync are logged and swallowed rather than surfaced. Only
//! directory refresh and club creation propagate errors to the caller.

use thiserror::Error;

/// Result type alias for clubs core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the clubs core
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// The request never completed
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded its deadline
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The response completed but its body wasn't what we expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // ========================================================================
    // Lookup Errors
    // ========================================================================
    /// The identity record has no attribute with the requested name.
    /// Callers treat this as "empty", not as a user-visible failure.
    #[error("Attribute '{0}' not found")]
    AttributeNotFound(String),

    /// The club id is unknown to the directory
    #[error("Club not found: {0}")]
    ClubNotFound(String),

    // ========================================================================
    // Operation Errors
    // ========================================================================
    /// A required field was missing or empty. Rejected before any remote call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// One of two dependent writes succeeded and the other did not,
    /// leaving the remote state inconsistent (e.g. an orphan club with no
    /// listed admin).
    #[error("Partial failure: {0}")]
    PartialFailure(String),

    /// JSON encode/decode failure
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Check if this error is recoverable
    ///
    /// Recoverable errors can potentially be resolved by retrying.
    /// Only idempotent reads are ever retried automatically; the counter
    /// read-modify-write is not, since a retry could double-apply.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout(_))
    }

    /// Check if this error means "the thing simply isn't there"
    ///
    /// Absence is treated as empty data by callers, never shown to the user
    /// as a failure.
    pub fn is_absence(&self) -> bool {
        matches!(self, Error::AttributeNotFound(_) | Error::ClubNotFound(_))
    }
}

// ============================================================================
// ERROR CONVERSIONS
// ============================================================================

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout(err.to_string())
        } else if err.is_decode() {
            Error::InvalidResponse(err.to_string())
        } else {
            Error::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================
