//! Store trait and operation outcomes for pending bookings.

use async_trait::async_trait;
use booking::{BookingSnapshot, PendingState};
use chrono::{DateTime, Utc};
use common::{PendingBookingId, TransactionId};

use crate::error::CreateError;

/// Receipt returned by a successful create.
///
/// The transaction id is the only key the client may ever use to fetch or
/// delete the record; the row id and expiry are informational.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingReceipt {
    /// Backend-issued lookup key for the pending record.
    pub transaction_id: TransactionId,

    /// Row id of the record inside the remote store.
    pub pending_booking_id: PendingBookingId,

    /// Server-enforced expiry; the record is gone after this instant.
    pub expires_at: DateTime<Utc>,
}

/// Outcome of fetching a pending booking.
///
/// The read path never returns an error: every way a record can fail to be
/// usable collapses to a snapshot-less variant, and the caller decides what
/// that means for the enclosing flow.
#[derive(Debug, Clone, PartialEq)]
pub enum GetOutcome {
    /// The record was intact (HTTP 200).
    Found(BookingSnapshot),

    /// The record was partial (HTTP 207) but an embedded payload parsed.
    Recovered(BookingSnapshot),

    /// No record exists for the transaction id (HTTP 404).
    NotFound,

    /// The record passed its server-enforced expiry (HTTP 410).
    Expired,

    /// The record was partial and unrecoverable; a best-effort cleanup
    /// delete has been dispatched.
    Corrupted,

    /// Transient failures exhausted the retry budget.
    Unavailable,
}

impl GetOutcome {
    /// Collapses the outcome to the nullable view the checkout flow
    /// consumes: a snapshot, or nothing usable.
    pub fn into_snapshot(self) -> Option<BookingSnapshot> {
        match self {
            GetOutcome::Found(snapshot) | GetOutcome::Recovered(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Returns true if the outcome carries a usable snapshot.
    pub fn has_snapshot(&self) -> bool {
        matches!(self, GetOutcome::Found(_) | GetOutcome::Recovered(_))
    }

    /// The client-observed state this outcome implies for the record.
    pub fn implied_state(&self) -> PendingState {
        match self {
            GetOutcome::Found(_) | GetOutcome::Recovered(_) => PendingState::Pending,
            GetOutcome::NotFound => PendingState::Absent,
            GetOutcome::Expired => PendingState::Expired,
            GetOutcome::Corrupted => PendingState::Cleaned,
            // Nothing was observed; the record may still be pending.
            GetOutcome::Unavailable => PendingState::Pending,
        }
    }
}

/// Accessor for the remote pending-booking store.
///
/// One record per transaction id, write-once, read-rarely, delete-once.
/// Implementations must uphold the error taxonomy: `create` failures are
/// fatal to the caller, `get` never errors, `delete` never errors.
#[async_trait]
pub trait PendingBookingStore: Send + Sync {
    /// Stores a booking snapshot and returns the backend-issued receipt.
    ///
    /// Not retried: the caller must not proceed to payment on failure.
    async fn create(&self, snapshot: &BookingSnapshot) -> Result<PendingReceipt, CreateError>;

    /// Fetches the snapshot for a transaction id.
    async fn get(&self, transaction_id: &TransactionId) -> GetOutcome;

    /// Removes the record for a transaction id, best-effort.
    ///
    /// Returns whether the remote store acknowledged the removal. Failures
    /// are logged by implementations and never propagated; either the
    /// record already expired or a later cleanup pass will catch it.
    async fn delete(&self, transaction_id: &TransactionId) -> bool;
}
