use serde::{Deserialize, Serialize};

/// Transaction identifier issued by the remote pending-booking store.
///
/// The backend generates this key at creation time; it is the only key
/// ever used to fetch or delete a pending booking. The client treats it
/// as an opaque string and never synthesizes one outside of tests.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(String);

impl TransactionId {
    /// Wraps a backend-issued transaction id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the transaction id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TransactionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TransactionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for TransactionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Row identifier of a pending-booking record inside the remote store.
///
/// Returned alongside the transaction id on creation. Carried opaquely for
/// diagnostics; lookups always go through the transaction id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingBookingId(i64);

impl PendingBookingId {
    /// Creates a pending-booking id from a raw row id.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying row id.
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PendingBookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PendingBookingId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
