//! The write-once booking snapshot captured at checkout initiation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::money::Money;

/// Payment method chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    PhonePe,
    Card,
    NetBanking,
    Cash,
}

/// An add-on chosen for a booking (meal, merchandise, photo package).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddOnSelection {
    /// Catalog id of the add-on.
    pub add_on_id: i64,

    /// Quantity ordered.
    pub quantity: u32,

    /// Selected variant (size, colour), if the add-on has variants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_id: Option<String>,
}

impl AddOnSelection {
    /// Creates a new add-on selection without a variant.
    pub fn new(add_on_id: i64, quantity: u32) -> Self {
        Self {
            add_on_id,
            quantity,
            variant_id: None,
        }
    }

    /// Creates a new add-on selection with a variant.
    pub fn with_variant(add_on_id: i64, quantity: u32, variant_id: impl Into<String>) -> Self {
        Self {
            add_on_id,
            quantity,
            variant_id: Some(variant_id.into()),
        }
    }
}

/// Snapshot of a prospective booking, captured when checkout starts.
///
/// The snapshot is written once to the remote pending-booking store before
/// the payment redirect and never mutated afterwards; the payment-return
/// page reads it back by transaction id. Field names follow the webhook
/// wire format (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingSnapshot {
    /// Parent (account holder) full name.
    pub parent_name: String,

    /// Parent contact email.
    pub parent_email: String,

    /// Parent contact phone.
    pub parent_phone: String,

    /// Participating child's name.
    pub child_name: String,

    /// Child's date of birth, used for age-slot eligibility.
    pub child_dob: NaiveDate,

    /// The event being booked.
    pub event_id: i64,

    /// Games selected within the event.
    pub game_ids: Vec<i64>,

    /// Chosen add-ons.
    #[serde(default)]
    pub add_ons: Vec<AddOnSelection>,

    /// Promo code applied at checkout, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promo_code: Option<String>,

    /// Total computed at checkout, after promo discount.
    pub total_amount: Money,

    /// Payment method the user picked.
    pub payment_method: PaymentMethod,
}

impl BookingSnapshot {
    /// Validates the snapshot before it is handed to the remote store.
    ///
    /// A failure here is fatal to the enclosing checkout; nothing is sent
    /// over the wire.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.parent_name.trim().is_empty() {
            return Err(SnapshotError::MissingParentName);
        }
        if self.child_name.trim().is_empty() {
            return Err(SnapshotError::MissingChildName);
        }
        if self.game_ids.is_empty() {
            return Err(SnapshotError::NoGamesSelected);
        }
        if !self.total_amount.is_positive() {
            return Err(SnapshotError::NonPositiveTotal {
                paise: self.total_amount.paise(),
            });
        }
        if let Some(add_on) = self.add_ons.iter().find(|a| a.quantity == 0) {
            return Err(SnapshotError::ZeroQuantityAddOn {
                add_on_id: add_on.add_on_id,
            });
        }
        Ok(())
    }
}

/// Errors that can occur when validating a booking snapshot.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// Parent name is required.
    #[error("Parent name is required")]
    MissingParentName,

    /// Child name is required.
    #[error("Child name is required")]
    MissingChildName,

    /// At least one game must be selected.
    #[error("No games selected")]
    NoGamesSelected,

    /// Total must be greater than zero.
    #[error("Invalid total: {paise} paise (must be greater than 0)")]
    NonPositiveTotal { paise: i64 },

    /// Add-on quantity must be greater than zero.
    #[error("Add-on {add_on_id} has zero quantity")]
    ZeroQuantityAddOn { add_on_id: i64 },
}
