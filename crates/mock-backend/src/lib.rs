//! In-process stub of the pending-booking webhook backend.
//!
//! Implements the three proxy routes the accessor talks to, over an
//! in-memory map, plus a fault-injection handle so tests can exercise
//! every branch of the client: transient 500s, stalled responses,
//! corrupted records (with and without a recoverable payload), and
//! forced expiry. Also runnable as a standalone binary for manual
//! checkout testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// How a stored record has been damaged, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Corruption {
    /// The row is partial but still carries the full snapshot re-encoded
    /// as a JSON string.
    RecoverableRaw,

    /// Only fragments of the row survive.
    Unrecoverable,
}

#[derive(Debug, Clone)]
struct StoredPending {
    row_id: i64,
    booking_data: Value,
    expires_at: DateTime<Utc>,
    corruption: Option<Corruption>,
}

/// Per-route request counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteHits {
    pub create: usize,
    pub get: usize,
    pub delete: usize,
}

#[derive(Debug)]
struct BackendState {
    records: HashMap<String, StoredPending>,
    next_row_id: i64,
    ttl: chrono::Duration,
    fail_next: u32,
    stall_next: u32,
    stall_for: Duration,
    hits: RouteHits,
}

impl Default for BackendState {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            next_row_id: 0,
            ttl: chrono::Duration::minutes(30),
            fail_next: 0,
            stall_next: 0,
            stall_for: Duration::ZERO,
            hits: RouteHits::default(),
        }
    }
}

/// Handle over the stub's shared state.
///
/// Clone freely; the router and the test hold the same state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<RwLock<BackendState>>,
}

#[derive(Deserialize)]
struct LookupRequest {
    transaction_id: String,
}

impl MockBackend {
    /// Creates a stub with a 30-minute record TTL.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a stub with the given record TTL.
    pub fn with_ttl(ttl: chrono::Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(BackendState {
                ttl,
                ..BackendState::default()
            })),
        }
    }

    /// Makes the next `n` requests (any route) answer 500.
    pub async fn fail_next(&self, n: u32) {
        self.state.write().await.fail_next = n;
    }

    /// Makes the next `n` requests stall for `delay` before answering.
    pub async fn stall_next(&self, n: u32, delay: Duration) {
        let mut state = self.state.write().await;
        state.stall_next = n;
        state.stall_for = delay;
    }

    /// Marks a record as corrupted. With `recoverable` the 207 response
    /// carries the full snapshot re-encoded in `rawBookingData`; without it
    /// only a fragment survives in `partialData`.
    pub async fn corrupt(&self, transaction_id: &str, recoverable: bool) {
        if let Some(record) = self.state.write().await.records.get_mut(transaction_id) {
            record.corruption = Some(if recoverable {
                Corruption::RecoverableRaw
            } else {
                Corruption::Unrecoverable
            });
        }
    }

    /// Forces a record past its expiry.
    pub async fn force_expire(&self, transaction_id: &str) {
        if let Some(record) = self.state.write().await.records.get_mut(transaction_id) {
            record.expires_at = Utc::now() - chrono::Duration::seconds(1);
        }
    }

    /// Returns the number of live records.
    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Returns the per-route request counters.
    pub async fn hits(&self) -> RouteHits {
        self.state.read().await.hits
    }

    /// Builds the Axum router for the three webhook routes.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/pending-bookings/create", post(create_pending))
            .route("/api/pending-bookings/get", post(get_pending))
            .route("/api/pending-bookings/delete", post(delete_pending))
            .with_state(self.clone())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .layer(TraceLayer::new_for_http())
    }

    /// Consumes one stall token, returning how long to sleep.
    async fn take_stall(&self) -> Option<Duration> {
        let mut state = self.state.write().await;
        if state.stall_next > 0 {
            state.stall_next -= 1;
            Some(state.stall_for)
        } else {
            None
        }
    }

    /// Consumes one fault token.
    async fn take_fault(&self) -> bool {
        let mut state = self.state.write().await;
        if state.fail_next > 0 {
            state.fail_next -= 1;
            true
        } else {
            false
        }
    }
}

/// Serves the stub on the given listener.
pub async fn run(listener: TcpListener, backend: MockBackend) -> Result<(), std::io::Error> {
    axum::serve(listener, backend.router()).await
}

fn injected_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "injected failure" })),
    )
        .into_response()
}

async fn create_pending(
    State(backend): State<MockBackend>,
    Json(booking_data): Json<Value>,
) -> Response {
    backend.state.write().await.hits.create += 1;
    if let Some(delay) = backend.take_stall().await {
        tokio::time::sleep(delay).await;
    }
    if backend.take_fault().await {
        return injected_failure();
    }

    let mut state = backend.state.write().await;
    state.next_row_id += 1;
    let transaction_id = format!("TXN-{}", Uuid::new_v4().simple());
    let expires_at = Utc::now() + state.ttl;
    let row_id = state.next_row_id;
    state.records.insert(
        transaction_id.clone(),
        StoredPending {
            row_id,
            booking_data,
            expires_at,
            corruption: None,
        },
    );

    tracing::info!(%transaction_id, row_id, "pending booking stored");
    Json(json!({
        "transactionId": transaction_id,
        "pendingBookingId": row_id,
        "expiresAt": expires_at,
    }))
    .into_response()
}

async fn get_pending(
    State(backend): State<MockBackend>,
    Json(request): Json<LookupRequest>,
) -> Response {
    backend.state.write().await.hits.get += 1;
    if let Some(delay) = backend.take_stall().await {
        tokio::time::sleep(delay).await;
    }
    if backend.take_fault().await {
        return injected_failure();
    }

    let mut state = backend.state.write().await;
    let Some(record) = state.records.get(&request.transaction_id).cloned() else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "pending booking not found" })),
        )
            .into_response();
    };

    if record.expires_at <= Utc::now() {
        // Expiry is enforced here, server-side; the row is purged on read.
        state.records.remove(&request.transaction_id);
        return (
            StatusCode::GONE,
            Json(json!({ "error": "pending booking expired" })),
        )
            .into_response();
    }

    match record.corruption {
        Some(Corruption::RecoverableRaw) => {
            let raw = record.booking_data.to_string();
            (
                StatusCode::MULTI_STATUS,
                Json(json!({ "needsCleanup": true, "rawBookingData": raw })),
            )
                .into_response()
        }
        Some(Corruption::Unrecoverable) => {
            let fragment = json!({ "parentName": record.booking_data.get("parentName") });
            (
                StatusCode::MULTI_STATUS,
                Json(json!({ "needsCleanup": true, "partialData": fragment })),
            )
                .into_response()
        }
        None => {
            tracing::debug!(row_id = record.row_id, "pending booking served");
            Json(json!({ "bookingData": record.booking_data })).into_response()
        }
    }
}

async fn delete_pending(
    State(backend): State<MockBackend>,
    Json(request): Json<LookupRequest>,
) -> Response {
    backend.state.write().await.hits.delete += 1;
    if let Some(delay) = backend.take_stall().await {
        tokio::time::sleep(delay).await;
    }
    if backend.take_fault().await {
        return injected_failure();
    }

    let removed = backend
        .state
        .write()
        .await
        .records
        .remove(&request.transaction_id)
        .is_some();

    if removed {
        Json(json!({ "success": true })).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "pending booking not found" })),
        )
            .into_response()
    }
}
