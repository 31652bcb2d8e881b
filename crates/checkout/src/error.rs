//! Checkout error types.

use reservation::CreateError;
use thiserror::Error;

/// Errors that can occur while orchestrating a checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The pending booking could not be created; the checkout is aborted
    /// before any payment is attempted.
    #[error("Pending booking creation failed: {0}")]
    Create(#[from] CreateError),

    /// The payment gateway failed or answered unintelligibly.
    #[error("Payment gateway error: {0}")]
    Gateway(String),
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
