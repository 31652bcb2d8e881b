//! Checkout orchestration for the booking platform.
//!
//! Drives the pending-booking reservation across the payment redirect:
//! `begin` parks the booking snapshot in the remote store and points the
//! user at the payment gateway; `resume` runs on the payment-return page,
//! confirms the payment, reads the snapshot back, and consumes the record.
//! Failure legs follow the reservation taxonomy: creation failures abort
//! the checkout, unreadable records resolve to a recovery screen, and all
//! cleanup is best-effort.

pub mod coordinator;
pub mod error;
pub mod gateway;

pub use coordinator::{CheckoutFlow, CheckoutSession, NotRecoverableReason, Resolution};
pub use error::CheckoutError;
pub use gateway::{InMemoryPaymentGateway, PaymentGateway, PaymentRedirect, PaymentStatus};
