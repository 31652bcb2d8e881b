//! HTTP implementation of the pending-booking store.

use async_trait::async_trait;
use booking::BookingSnapshot;
use chrono::{DateTime, Utc};
use common::TransactionId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{RetryPolicy, StoreConfig};
use crate::error::CreateError;
use crate::store::{GetOutcome, PendingBookingStore, PendingReceipt};

/// Accessor over the webhook proxy routes `/api/pending-bookings/{create,get,delete}`.
///
/// Holds a connection-pooling `reqwest::Client` and an injected
/// `RetryPolicy`; cloning is cheap and shares the pool. Only the read path
/// retries, and each attempt carries its own timeout so a stalled attempt
/// is cancelled rather than eating the whole retry budget.
#[derive(Debug, Clone)]
pub struct HttpPendingBookingStore {
    client: reqwest::Client,
    base_url: String,
    retry: RetryPolicy,
}

// -- Wire types --

#[derive(Serialize)]
struct LookupRequest<'a> {
    transaction_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    transaction_id: String,
    pending_booking_id: i64,
    expires_at: DateTime<Utc>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetResponse {
    booking_data: BookingSnapshot,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartialResponse {
    needs_cleanup: bool,
    raw_booking_data: Option<String>,
    partial_data: Option<serde_json::Value>,
}

/// A read attempt that may be worth repeating.
#[derive(Debug, Error)]
enum TransientError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),
}

impl HttpPendingBookingStore {
    /// Creates a store talking to the given webhook proxy base URL.
    pub fn new(base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            retry,
        }
    }

    /// Creates a store from loaded configuration.
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.base_url.clone(), config.retry.clone())
    }

    fn url(&self, operation: &str) -> String {
        format!("{}/api/pending-bookings/{operation}", self.base_url)
    }

    /// One read attempt. Terminal statuses (200/404/410/207) resolve to an
    /// outcome; everything else is transient and handed back for retry.
    async fn try_get(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<GetOutcome, TransientError> {
        let response = self
            .client
            .post(self.url("get"))
            .timeout(self.retry.request_timeout)
            .json(&LookupRequest {
                transaction_id: transaction_id.as_str(),
            })
            .send()
            .await
            .map_err(|e| TransientError::Transport(e.to_string()))?;

        match response.status().as_u16() {
            200 => response
                .json::<GetResponse>()
                .await
                .map(|body| GetOutcome::Found(body.booking_data))
                // A truncated 200 body is as retryable as a dropped connection.
                .map_err(|e| TransientError::Transport(e.to_string())),
            404 => Ok(GetOutcome::NotFound),
            410 => Ok(GetOutcome::Expired),
            207 => Ok(self.recover_partial(transaction_id, response).await),
            status => Err(TransientError::Status(status)),
        }
    }

    /// Compatibility shim for records the backend wrote inconsistently.
    ///
    /// A 207 carries the record in a degraded form: `rawBookingData` (the
    /// snapshot re-encoded as a JSON string) or `partialData` (whatever
    /// fields survived). Either may parse back into a full snapshot; if
    /// neither does, the record is useless and a cleanup delete is
    /// dispatched without blocking the caller.
    async fn recover_partial(
        &self,
        transaction_id: &TransactionId,
        response: reqwest::Response,
    ) -> GetOutcome {
        metrics::counter!("pending_booking_partial_records_total").increment(1);

        let body: PartialResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!(%transaction_id, error = %e, "unreadable partial record body");
                return self.dispatch_cleanup(transaction_id);
            }
        };
        tracing::warn!(
            %transaction_id,
            needs_cleanup = body.needs_cleanup,
            "store returned a partial pending-booking record"
        );

        if let Some(raw) = body.raw_booking_data.as_deref()
            && let Ok(snapshot) = serde_json::from_str::<BookingSnapshot>(raw)
        {
            metrics::counter!("pending_booking_recovered_total").increment(1);
            tracing::info!(%transaction_id, "recovered pending booking from raw payload");
            return GetOutcome::Recovered(snapshot);
        }

        if let Some(partial) = body.partial_data
            && let Ok(snapshot) = serde_json::from_value::<BookingSnapshot>(partial)
        {
            metrics::counter!("pending_booking_recovered_total").increment(1);
            tracing::info!(%transaction_id, "recovered pending booking from partial fields");
            return GetOutcome::Recovered(snapshot);
        }

        self.dispatch_cleanup(transaction_id)
    }

    /// Fire-and-forget delete for a corrupted record. The spawned task logs
    /// its own failure; the caller is already returning `Corrupted`.
    fn dispatch_cleanup(&self, transaction_id: &TransactionId) -> GetOutcome {
        metrics::counter!("pending_booking_cleanups_dispatched_total").increment(1);
        tracing::warn!(%transaction_id, "unrecoverable partial record, dispatching cleanup delete");

        let store = self.clone();
        let transaction_id = transaction_id.clone();
        tokio::spawn(async move {
            store.delete(&transaction_id).await;
        });

        GetOutcome::Corrupted
    }
}

#[async_trait]
impl PendingBookingStore for HttpPendingBookingStore {
    #[tracing::instrument(skip(self, snapshot), fields(event_id = snapshot.event_id))]
    async fn create(&self, snapshot: &BookingSnapshot) -> Result<PendingReceipt, CreateError> {
        snapshot.validate()?;
        metrics::counter!("pending_booking_creates_total").increment(1);

        let response = self
            .client
            .post(self.url("create"))
            .timeout(self.retry.request_timeout)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| {
                metrics::counter!("pending_booking_create_failures_total").increment(1);
                tracing::error!(error = %e, "pending booking create did not complete");
                CreateError::Transport(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            metrics::counter!("pending_booking_create_failures_total").increment(1);
            tracing::error!(status = status.as_u16(), %message, "pending booking create rejected");
            return Err(CreateError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let body: CreateResponse = response
            .json()
            .await
            .map_err(|e| CreateError::InvalidResponse(e.to_string()))?;

        tracing::info!(
            transaction_id = %body.transaction_id,
            expires_at = %body.expires_at,
            "pending booking created"
        );
        Ok(PendingReceipt {
            transaction_id: TransactionId::new(body.transaction_id),
            pending_booking_id: body.pending_booking_id.into(),
            expires_at: body.expires_at,
        })
    }

    #[tracing::instrument(skip(self), fields(transaction_id = %transaction_id))]
    async fn get(&self, transaction_id: &TransactionId) -> GetOutcome {
        let mut retry = 0u32;
        loop {
            match self.try_get(transaction_id).await {
                Ok(outcome) => return outcome,
                Err(e) => {
                    if retry >= self.retry.max_retries {
                        metrics::counter!("pending_booking_gets_exhausted_total").increment(1);
                        tracing::warn!(
                            attempts = retry + 1,
                            error = %e,
                            "pending booking unavailable, retries exhausted"
                        );
                        return GetOutcome::Unavailable;
                    }
                    let delay = self.retry.delay_for(retry);
                    metrics::counter!("pending_booking_get_retries_total").increment(1);
                    tracing::warn!(
                        retry = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient failure fetching pending booking, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
            }
        }
    }

    #[tracing::instrument(skip(self), fields(transaction_id = %transaction_id))]
    async fn delete(&self, transaction_id: &TransactionId) -> bool {
        metrics::counter!("pending_booking_deletes_total").increment(1);

        let result = self
            .client
            .post(self.url("delete"))
            .timeout(self.retry.request_timeout)
            .json(&LookupRequest {
                transaction_id: transaction_id.as_str(),
            })
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                tracing::warn!(
                    status = response.status().as_u16(),
                    "pending booking delete rejected"
                );
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "pending booking delete did not complete");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn store() -> HttpPendingBookingStore {
        HttpPendingBookingStore::new("http://localhost:3000", RetryPolicy::default())
    }

    #[test]
    fn urls_target_the_webhook_routes() {
        let store = store();
        assert_eq!(
            store.url("create"),
            "http://localhost:3000/api/pending-bookings/create"
        );
        assert_eq!(
            store.url("get"),
            "http://localhost:3000/api/pending-bookings/get"
        );
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let store = HttpPendingBookingStore::new("http://localhost:3000/", RetryPolicy::default());
        assert_eq!(
            store.url("delete"),
            "http://localhost:3000/api/pending-bookings/delete"
        );
    }

    #[test]
    fn from_config_carries_the_policy() {
        let config = StoreConfig {
            base_url: "http://proxy:8080".to_string(),
            retry: RetryPolicy {
                max_retries: 1,
                request_timeout: Duration::from_millis(100),
                backoff_base: Duration::from_millis(5),
            },
        };
        let store = HttpPendingBookingStore::from_config(&config);
        assert_eq!(store.retry, config.retry);
        assert_eq!(store.base_url, "http://proxy:8080");
    }

    #[test]
    fn lookup_request_uses_snake_case() {
        let json = serde_json::to_value(LookupRequest {
            transaction_id: "TXN-abc123",
        })
        .unwrap();
        assert_eq!(json["transaction_id"], "TXN-abc123");
    }

    #[test]
    fn create_response_parses_camel_case() {
        let body: CreateResponse = serde_json::from_str(
            r#"{"transactionId":"TXN-abc123","pendingBookingId":7,"expiresAt":"2025-01-01T00:30:00Z"}"#,
        )
        .unwrap();
        assert_eq!(body.transaction_id, "TXN-abc123");
        assert_eq!(body.pending_booking_id, 7);
    }

    #[test]
    fn partial_response_tolerates_missing_payloads() {
        let body: PartialResponse =
            serde_json::from_str(r#"{"needsCleanup":true}"#).unwrap();
        assert!(body.needs_cleanup);
        assert!(body.raw_booking_data.is_none());
        assert!(body.partial_data.is_none());
    }
}
