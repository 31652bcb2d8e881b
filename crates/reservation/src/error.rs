//! Accessor error types.

use booking::SnapshotError;
use thiserror::Error;

/// Errors that can occur when creating a pending booking.
///
/// Creation is never retried: any of these aborts the enclosing checkout
/// before the user is redirected to payment.
#[derive(Debug, Error)]
pub enum CreateError {
    /// The snapshot failed local validation; nothing was sent.
    #[error("Snapshot validation failed: {0}")]
    Snapshot(#[from] SnapshotError),

    /// The store answered with a non-success status.
    #[error("Store rejected create (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never completed (connection, DNS, timeout).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The store answered 2xx but the body was not a valid receipt.
    #[error("Invalid create response: {0}")]
    InvalidResponse(String),
}

/// Result type for create operations.
pub type Result<T> = std::result::Result<T, CreateError>;
