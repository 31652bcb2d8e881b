//! Payment gateway trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use booking::Money;
use common::TransactionId;

use crate::error::CheckoutError;

/// Where to send the user for the payment round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRedirect {
    /// The gateway-hosted page the user is redirected to.
    pub redirect_url: String,
}

/// Result of confirming a payment on the return page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    /// The gateway captured the amount.
    Authorized,

    /// The user cancelled or the gateway refused the charge.
    Declined,
}

/// Trait for the payment gateway the checkout redirects through.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers the amount against the transaction id and returns the
    /// redirect target.
    async fn initiate(
        &self,
        transaction_id: &TransactionId,
        amount: Money,
    ) -> Result<PaymentRedirect, CheckoutError>;

    /// Looks up the final status of a payment after the user returns.
    async fn confirm(&self, transaction_id: &TransactionId) -> Result<PaymentStatus, CheckoutError>;
}

#[derive(Debug, Default)]
struct InMemoryGatewayState {
    initiated: HashMap<TransactionId, Money>,
    fail_on_initiate: bool,
    fail_on_confirm: bool,
    decline: bool,
}

/// In-memory payment gateway for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<InMemoryGatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway that authorizes everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail initiation calls.
    pub fn set_fail_on_initiate(&self, fail: bool) {
        self.state.write().unwrap().fail_on_initiate = fail;
    }

    /// Configures the gateway to fail confirmation calls.
    pub fn set_fail_on_confirm(&self, fail: bool) {
        self.state.write().unwrap().fail_on_confirm = fail;
    }

    /// Configures the gateway to decline instead of authorize.
    pub fn set_decline(&self, decline: bool) {
        self.state.write().unwrap().decline = decline;
    }

    /// Returns the number of initiated payments.
    pub fn initiated_count(&self) -> usize {
        self.state.read().unwrap().initiated.len()
    }

    /// Returns the amount registered for a transaction, if any.
    pub fn amount_for(&self, transaction_id: &TransactionId) -> Option<Money> {
        self.state.read().unwrap().initiated.get(transaction_id).copied()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn initiate(
        &self,
        transaction_id: &TransactionId,
        amount: Money,
    ) -> Result<PaymentRedirect, CheckoutError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_initiate {
            return Err(CheckoutError::Gateway("gateway unreachable".to_string()));
        }

        state.initiated.insert(transaction_id.clone(), amount);
        Ok(PaymentRedirect {
            redirect_url: format!("https://pay.example.com/redirect/{transaction_id}"),
        })
    }

    async fn confirm(&self, transaction_id: &TransactionId) -> Result<PaymentStatus, CheckoutError> {
        let state = self.state.read().unwrap();

        if state.fail_on_confirm {
            return Err(CheckoutError::Gateway("gateway unreachable".to_string()));
        }
        if !state.initiated.contains_key(transaction_id) {
            return Err(CheckoutError::Gateway(format!(
                "unknown transaction {transaction_id}"
            )));
        }

        Ok(if state.decline {
            PaymentStatus::Declined
        } else {
            PaymentStatus::Authorized
        })
    }
}
