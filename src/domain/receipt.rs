use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Receipt recorded after a successful payment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentReceipt {
    pub id: i32,
    /// Checkout reference the payment was made under.
    pub reference: String,
    /// Provider transaction identifier, when the widget reported one.
    pub transaction: Option<String>,
    pub payer_email: String,
    pub amount_minor_units: i64,
    pub currency: String,
    /// Application or purchase details captured by the checkout form.
    pub details: BTreeMap<String, String>,
    pub created_at: NaiveDateTime,
}

/// Payload required to insert a new receipt.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPaymentReceipt {
    pub reference: String,
    pub transaction: Option<String>,
    pub payer_email: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub details: BTreeMap<String, String>,
}

impl NewPaymentReceipt {
    /// Build a receipt payload; the payer email is stored lowercased.
    pub fn new(
        reference: impl Into<String>,
        payer_email: &str,
        amount_minor_units: i64,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            transaction: None,
            payer_email: payer_email.trim().to_lowercase(),
            amount_minor_units,
            currency: currency.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn with_transaction(mut self, transaction: impl Into<String>) -> Self {
        self.transaction = Some(transaction.into());
        self
    }

    pub fn with_details(mut self, details: BTreeMap<String, String>) -> Self {
        self.details = details;
        self
    }
}
