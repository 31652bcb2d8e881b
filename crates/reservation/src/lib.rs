//! Pending-booking accessor for the remote webhook store.
//!
//! A prospective booking is captured as a snapshot and parked in the remote
//! store between "user submits the checkout form" and "payment gateway
//! confirms payment", because the payment redirect round-trip cannot carry
//! arbitrary state. This crate translates the three lifecycle operations
//! (create, fetch, delete) into HTTP calls:
//!
//! - `create` runs once, with no retry; a failure aborts the checkout.
//! - `get` tolerates transient failures with bounded exponential backoff and
//!   a fresh timeout budget per attempt.
//! - `delete` is best-effort cleanup; failures are logged, never surfaced.
//!
//! The `PendingBookingStore` trait is the seam between the checkout flow and
//! the transport; `HttpPendingBookingStore` talks to the real webhook routes
//! and `InMemoryPendingBookingStore` backs tests.

pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod store;

pub use config::{RetryPolicy, StoreConfig};
pub use error::CreateError;
pub use http::HttpPendingBookingStore;
pub use memory::InMemoryPendingBookingStore;
pub use store::{GetOutcome, PendingBookingStore, PendingReceipt};
