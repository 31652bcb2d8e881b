//! Client-observed lifecycle of a pending reservation.

use serde::{Deserialize, Serialize};

/// The state of a pending booking as observed from the client.
///
/// State transitions:
/// ```text
/// Absent ──► Pending ──┬──► Consumed
///                      ├──► Expired
///                      └──► Cleaned
/// ```
///
/// All terminal states are equivalent to `Absent` from the client's
/// perspective: the record can no longer be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PendingState {
    /// No record exists for the transaction id.
    #[default]
    Absent,

    /// A record was created and is awaiting the payment round-trip.
    Pending,

    /// The record was read back and deleted after a successful payment.
    Consumed,

    /// The server-enforced expiry passed before the record was read.
    Expired,

    /// A corrupted record was detected and a cleanup delete dispatched.
    Cleaned,
}

impl PendingState {
    /// Returns true if a create may be issued in this state.
    pub fn can_create(&self) -> bool {
        matches!(self, PendingState::Absent)
    }

    /// Returns true if the record may still be fetched in this state.
    pub fn can_fetch(&self) -> bool {
        matches!(self, PendingState::Pending)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PendingState::Consumed | PendingState::Expired | PendingState::Cleaned
        )
    }

    /// Returns true if the state is indistinguishable from `Absent` for
    /// a caller issuing a fetch.
    pub fn is_absent_equivalent(&self) -> bool {
        *self == PendingState::Absent || self.is_terminal()
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingState::Absent => "Absent",
            PendingState::Pending => "Pending",
            PendingState::Consumed => "Consumed",
            PendingState::Expired => "Expired",
            PendingState::Cleaned => "Cleaned",
        }
    }
}

impl std::fmt::Display for PendingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
