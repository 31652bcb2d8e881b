//! In-memory pending-booking store for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use booking::BookingSnapshot;
use chrono::{DateTime, Duration, Utc};
use common::TransactionId;

use crate::error::CreateError;
use crate::store::{GetOutcome, PendingBookingStore, PendingReceipt};

#[derive(Debug, Clone)]
struct StoredRecord {
    snapshot: BookingSnapshot,
    expires_at: DateTime<Utc>,
    /// `Some(true)` = corrupted with a recoverable payload,
    /// `Some(false)` = corrupted beyond recovery.
    corrupted: Option<bool>,
}

#[derive(Debug)]
struct InMemoryState {
    records: HashMap<TransactionId, StoredRecord>,
    next_id: i64,
    ttl: Duration,
    fail_on_create: bool,
    failing_gets: u32,
    get_calls: usize,
    delete_calls: usize,
}

impl Default for InMemoryState {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            next_id: 0,
            ttl: Duration::minutes(30),
            fail_on_create: false,
            failing_gets: 0,
            get_calls: 0,
            delete_calls: 0,
        }
    }
}

/// In-memory pending-booking store for testing.
///
/// Provides the same interface as the HTTP implementation, with switches to
/// inject every failure mode the checkout flow must survive. Transaction ids
/// are sequential (`TXN-0001`, ...) so tests stay deterministic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPendingBookingStore {
    state: Arc<RwLock<InMemoryState>>,
}

impl InMemoryPendingBookingStore {
    /// Creates a new empty store with a 30-minute TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty store with the given record TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        let store = Self::default();
        store.state.write().unwrap().ttl = ttl;
        store
    }

    /// Configures the store to fail the next create calls.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Makes the next `n` get calls resolve as `Unavailable`, simulating a
    /// read path that exhausted its retries.
    pub fn fail_next_gets(&self, n: u32) {
        self.state.write().unwrap().failing_gets = n;
    }

    /// Marks a record as corrupted. With `recoverable` the embedded payload
    /// still parses; without it the record is lost and gets cleaned up.
    pub fn corrupt(&self, transaction_id: &TransactionId, recoverable: bool) {
        if let Some(record) = self
            .state
            .write()
            .unwrap()
            .records
            .get_mut(transaction_id)
        {
            record.corrupted = Some(recoverable);
        }
    }

    /// Forces a record past its expiry.
    pub fn expire(&self, transaction_id: &TransactionId) {
        if let Some(record) = self
            .state
            .write()
            .unwrap()
            .records
            .get_mut(transaction_id)
        {
            record.expires_at = Utc::now() - Duration::seconds(1);
        }
    }

    /// Returns the number of live records.
    pub fn record_count(&self) -> usize {
        self.state.read().unwrap().records.len()
    }

    /// Returns true if a record exists for the transaction id.
    pub fn contains(&self, transaction_id: &TransactionId) -> bool {
        self.state.read().unwrap().records.contains_key(transaction_id)
    }

    /// Number of get calls observed.
    pub fn get_calls(&self) -> usize {
        self.state.read().unwrap().get_calls
    }

    /// Number of delete calls observed.
    pub fn delete_calls(&self) -> usize {
        self.state.read().unwrap().delete_calls
    }
}

#[async_trait]
impl PendingBookingStore for InMemoryPendingBookingStore {
    async fn create(&self, snapshot: &BookingSnapshot) -> Result<PendingReceipt, CreateError> {
        snapshot.validate()?;

        let mut state = self.state.write().unwrap();
        if state.fail_on_create {
            return Err(CreateError::Transport("injected create failure".to_string()));
        }

        state.next_id += 1;
        let transaction_id = TransactionId::new(format!("TXN-{:04}", state.next_id));
        let expires_at = Utc::now() + state.ttl;
        state.records.insert(
            transaction_id.clone(),
            StoredRecord {
                snapshot: snapshot.clone(),
                expires_at,
                corrupted: None,
            },
        );

        Ok(PendingReceipt {
            transaction_id,
            pending_booking_id: state.next_id.into(),
            expires_at,
        })
    }

    async fn get(&self, transaction_id: &TransactionId) -> GetOutcome {
        let mut state = self.state.write().unwrap();
        state.get_calls += 1;

        if state.failing_gets > 0 {
            state.failing_gets -= 1;
            return GetOutcome::Unavailable;
        }

        let Some(record) = state.records.get(transaction_id).cloned() else {
            return GetOutcome::NotFound;
        };

        if record.expires_at <= Utc::now() {
            state.records.remove(transaction_id);
            return GetOutcome::Expired;
        }

        match record.corrupted {
            Some(true) => GetOutcome::Recovered(record.snapshot),
            Some(false) => {
                // The HTTP store dispatches this cleanup asynchronously; the
                // double applies it inline so tests can assert right away.
                state.records.remove(transaction_id);
                GetOutcome::Corrupted
            }
            None => GetOutcome::Found(record.snapshot),
        }
    }

    async fn delete(&self, transaction_id: &TransactionId) -> bool {
        let mut state = self.state.write().unwrap();
        state.delete_calls += 1;
        state.records.remove(transaction_id).is_some()
    }
}
