//! Shared identifier types for the booking platform.

pub mod types;

pub use types::{PendingBookingId, TransactionId};
