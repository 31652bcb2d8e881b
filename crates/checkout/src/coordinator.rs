//! Coordinator driving a checkout across the payment redirect.

use booking::BookingSnapshot;
use common::TransactionId;
use reservation::{GetOutcome, PendingBookingStore, PendingReceipt};

use crate::error::CheckoutError;
use crate::gateway::{PaymentGateway, PaymentRedirect, PaymentStatus};

/// Everything the caller needs to hand the user off to payment.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Receipt for the parked booking snapshot.
    pub receipt: PendingReceipt,

    /// Gateway redirect for the payment round-trip.
    pub redirect: PaymentRedirect,
}

/// Why a returning payment could not be matched to a usable booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotRecoverableReason {
    /// The store has no record for the transaction id.
    NotFound,

    /// The record aged out before the user came back.
    Expired,

    /// The record was corrupted beyond recovery and has been cleaned up.
    Corrupted,

    /// The store could not be reached within the retry budget.
    Unavailable,
}

impl std::fmt::Display for NotRecoverableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            NotRecoverableReason::NotFound => "no pending booking found",
            NotRecoverableReason::Expired => "pending booking expired",
            NotRecoverableReason::Corrupted => "pending booking corrupted",
            NotRecoverableReason::Unavailable => "pending booking store unavailable",
        };
        write!(f, "{reason}")
    }
}

/// How a payment return resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Payment captured and the snapshot read back; the pending record has
    /// been consumed.
    Confirmed {
        transaction_id: TransactionId,
        snapshot: BookingSnapshot,
    },

    /// The gateway declined. The record is left to expire server-side.
    PaymentDeclined,

    /// Payment captured but no usable booking could be read back; the
    /// caller should route the user to a recovery screen.
    NotRecoverable(NotRecoverableReason),
}

/// Orchestrates checkout initiation and the payment-return flow.
///
/// The coordinator owns no state of its own; each transaction id moves
/// through the store independently, so concurrent checkouts never
/// interfere.
pub struct CheckoutFlow<S, P>
where
    S: PendingBookingStore,
    P: PaymentGateway,
{
    store: S,
    gateway: P,
}

impl<S, P> CheckoutFlow<S, P>
where
    S: PendingBookingStore,
    P: PaymentGateway,
{
    /// Creates a new checkout flow over the given store and gateway.
    pub fn new(store: S, gateway: P) -> Self {
        Self { store, gateway }
    }

    /// Parks the booking snapshot and initiates payment.
    ///
    /// A create failure aborts the checkout before any payment is
    /// attempted. A gateway failure after the create compensates by
    /// deleting the freshly parked record (best-effort; an undeleted
    /// record ages out server-side).
    #[tracing::instrument(skip(self, snapshot), fields(event_id = snapshot.event_id))]
    pub async fn begin(&self, snapshot: &BookingSnapshot) -> Result<CheckoutSession, CheckoutError> {
        metrics::counter!("checkout_begins_total").increment(1);

        let receipt = self.store.create(snapshot).await?;

        match self
            .gateway
            .initiate(&receipt.transaction_id, snapshot.total_amount)
            .await
        {
            Ok(redirect) => {
                tracing::info!(
                    transaction_id = %receipt.transaction_id,
                    expires_at = %receipt.expires_at,
                    "checkout started, redirecting to payment"
                );
                Ok(CheckoutSession { receipt, redirect })
            }
            Err(e) => {
                metrics::counter!("checkout_begin_failures_total").increment(1);
                tracing::warn!(
                    transaction_id = %receipt.transaction_id,
                    error = %e,
                    "payment initiation failed, releasing pending booking"
                );
                if !self.store.delete(&receipt.transaction_id).await {
                    tracing::warn!(
                        transaction_id = %receipt.transaction_id,
                        "pending booking left to expire"
                    );
                }
                Err(e)
            }
        }
    }

    /// Resolves a payment return.
    ///
    /// Confirms the payment, reads the parked snapshot back, and consumes
    /// the record. Every way the record can be unusable resolves to
    /// `NotRecoverable` rather than an error; only gateway failures are
    /// surfaced as `Err`.
    #[tracing::instrument(skip(self), fields(transaction_id = %transaction_id))]
    pub async fn resume(&self, transaction_id: &TransactionId) -> Result<Resolution, CheckoutError> {
        match self.gateway.confirm(transaction_id).await? {
            PaymentStatus::Declined => {
                metrics::counter!("checkout_declines_total").increment(1);
                tracing::info!("payment declined, pending booking left to expire");
                Ok(Resolution::PaymentDeclined)
            }
            PaymentStatus::Authorized => match self.store.get(transaction_id).await {
                GetOutcome::Found(snapshot) | GetOutcome::Recovered(snapshot) => {
                    // Consume the record; delete logs its own failures.
                    self.store.delete(transaction_id).await;
                    metrics::counter!("checkout_confirmations_total").increment(1);
                    tracing::info!("checkout confirmed, pending booking consumed");
                    Ok(Resolution::Confirmed {
                        transaction_id: transaction_id.clone(),
                        snapshot,
                    })
                }
                outcome => {
                    let reason = match outcome {
                        GetOutcome::Expired => NotRecoverableReason::Expired,
                        GetOutcome::Corrupted => NotRecoverableReason::Corrupted,
                        GetOutcome::Unavailable => NotRecoverableReason::Unavailable,
                        _ => NotRecoverableReason::NotFound,
                    };
                    metrics::counter!("checkout_unrecoverable_total").increment(1);
                    tracing::warn!(%reason, "authorized payment without a usable booking");
                    Ok(Resolution::NotRecoverable(reason))
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::InMemoryPaymentGateway;
    use booking::{Money, PaymentMethod};
    use chrono::NaiveDate;
    use reservation::InMemoryPendingBookingStore;

    fn snapshot() -> BookingSnapshot {
        BookingSnapshot {
            parent_name: "Asha".to_string(),
            parent_email: "asha@example.com".to_string(),
            parent_phone: "+91-9800000000".to_string(),
            child_name: "Ravi".to_string(),
            child_dob: NaiveDate::from_ymd_opt(2023, 4, 18).unwrap(),
            event_id: 12,
            game_ids: vec![3, 7],
            add_ons: Vec::new(),
            promo_code: None,
            total_amount: Money::from_rupees(1800),
            payment_method: PaymentMethod::PhonePe,
        }
    }

    fn setup() -> (
        CheckoutFlow<InMemoryPendingBookingStore, InMemoryPaymentGateway>,
        InMemoryPendingBookingStore,
        InMemoryPaymentGateway,
    ) {
        let store = InMemoryPendingBookingStore::new();
        let gateway = InMemoryPaymentGateway::new();
        let flow = CheckoutFlow::new(store.clone(), gateway.clone());
        (flow, store, gateway)
    }

    #[tokio::test]
    async fn happy_path_consumes_the_record() {
        let (flow, store, gateway) = setup();

        let session = flow.begin(&snapshot()).await.unwrap();
        assert!(session.redirect.redirect_url.contains("TXN-0001"));
        assert_eq!(
            gateway.amount_for(&session.receipt.transaction_id),
            Some(Money::from_rupees(1800))
        );

        let resolution = flow.resume(&session.receipt.transaction_id).await.unwrap();
        assert_eq!(
            resolution,
            Resolution::Confirmed {
                transaction_id: session.receipt.transaction_id.clone(),
                snapshot: snapshot(),
            }
        );
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn create_failure_aborts_before_payment() {
        let (flow, store, gateway) = setup();
        store.set_fail_on_create(true);

        let err = flow.begin(&snapshot()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Create(_)));
        assert_eq!(gateway.initiated_count(), 0);
    }

    #[tokio::test]
    async fn invalid_snapshot_aborts_before_payment() {
        let (flow, _store, gateway) = setup();
        let mut bad = snapshot();
        bad.parent_name = String::new();

        let err = flow.begin(&bad).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Create(_)));
        assert_eq!(gateway.initiated_count(), 0);
    }

    #[tokio::test]
    async fn gateway_failure_releases_the_record() {
        let (flow, store, gateway) = setup();
        gateway.set_fail_on_initiate(true);

        let err = flow.begin(&snapshot()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::Gateway(_)));
        assert_eq!(store.record_count(), 0);
        assert_eq!(store.delete_calls(), 1);
    }

    #[tokio::test]
    async fn declined_payment_leaves_the_record_to_expire() {
        let (flow, store, gateway) = setup();
        let session = flow.begin(&snapshot()).await.unwrap();
        gateway.set_decline(true);

        let resolution = flow.resume(&session.receipt.transaction_id).await.unwrap();
        assert_eq!(resolution, Resolution::PaymentDeclined);
        assert!(store.contains(&session.receipt.transaction_id));
        assert_eq!(store.delete_calls(), 0);
    }

    #[tokio::test]
    async fn expired_record_routes_to_recovery() {
        let (flow, store, _gateway) = setup();
        let session = flow.begin(&snapshot()).await.unwrap();
        store.expire(&session.receipt.transaction_id);

        let resolution = flow.resume(&session.receipt.transaction_id).await.unwrap();
        assert_eq!(
            resolution,
            Resolution::NotRecoverable(NotRecoverableReason::Expired)
        );
    }

    #[tokio::test]
    async fn missing_record_routes_to_recovery() {
        let (flow, store, _gateway) = setup();
        let session = flow.begin(&snapshot()).await.unwrap();
        store.delete(&session.receipt.transaction_id).await;

        let resolution = flow.resume(&session.receipt.transaction_id).await.unwrap();
        assert_eq!(
            resolution,
            Resolution::NotRecoverable(NotRecoverableReason::NotFound)
        );
    }

    #[tokio::test]
    async fn unavailable_store_routes_to_recovery() {
        let (flow, store, _gateway) = setup();
        let session = flow.begin(&snapshot()).await.unwrap();
        store.fail_next_gets(1);

        let resolution = flow.resume(&session.receipt.transaction_id).await.unwrap();
        assert_eq!(
            resolution,
            Resolution::NotRecoverable(NotRecoverableReason::Unavailable)
        );
        // The record is intact; a later resume still succeeds.
        let resolution = flow.resume(&session.receipt.transaction_id).await.unwrap();
        assert!(matches!(resolution, Resolution::Confirmed { .. }));
    }

    #[tokio::test]
    async fn recovered_record_confirms_transparently() {
        let (flow, store, _gateway) = setup();
        let session = flow.begin(&snapshot()).await.unwrap();
        store.corrupt(&session.receipt.transaction_id, true);

        let resolution = flow.resume(&session.receipt.transaction_id).await.unwrap();
        assert!(matches!(resolution, Resolution::Confirmed { .. }));
    }

    #[tokio::test]
    async fn unrecoverable_corruption_routes_to_recovery() {
        let (flow, store, _gateway) = setup();
        let session = flow.begin(&snapshot()).await.unwrap();
        store.corrupt(&session.receipt.transaction_id, false);

        let resolution = flow.resume(&session.receipt.transaction_id).await.unwrap();
        assert_eq!(
            resolution,
            Resolution::NotRecoverable(NotRecoverableReason::Corrupted)
        );
    }

    #[tokio::test]
    async fn confirm_failure_is_surfaced_and_record_kept() {
        let (flow, store, gateway) = setup();
        let session = flow.begin(&snapshot()).await.unwrap();
        gateway.set_fail_on_confirm(true);

        let result = flow.resume(&session.receipt.transaction_id).await;
        assert!(matches!(result, Err(CheckoutError::Gateway(_))));
        assert!(store.contains(&session.receipt.transaction_id));
    }
}
