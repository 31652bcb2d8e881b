//! Booking domain types for the event platform.
//!
//! This crate provides the value objects shared by the checkout flow and the
//! pending-booking accessor:
//! - `BookingSnapshot`, the write-once capture of a prospective booking
//! - `Money` in integer paise
//! - `PendingState`, the client-observed lifecycle of a pending reservation

pub mod money;
pub mod snapshot;
pub mod state;

pub use money::Money;
pub use snapshot::{AddOnSelection, BookingSnapshot, PaymentMethod, SnapshotError};
pub use state::PendingState;
