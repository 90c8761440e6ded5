use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::receipt::NewPaymentReceipt;

const REFERENCE_MAX_LEN_VALIDATOR: u64 = 128;
const CURRENCY_CODE_LEN_VALIDATOR: u64 = 3;

/// Result type returned by the receipt payload helpers.
pub type ReceiptFormResult<T> = Result<T, ReceiptFormError>;

/// Errors raised while validating a receipt notification.
#[derive(Debug, Error)]
pub enum ReceiptFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// The receipt and the envelope name different checkout references.
    #[error("receipt reference `{receipt}` does not match `{reference}`")]
    ReferenceMismatch { receipt: String, reference: String },
}

/// Payment details reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceiptPayload {
    /// Checkout reference echoed back by the provider, when present.
    #[serde(default)]
    pub reference: Option<String>,
    /// Provider-side transaction identifier.
    #[serde(default)]
    pub transaction: Option<String>,
    #[validate(range(min = 0))]
    pub amount_minor_units: i64,
    #[validate(length(equal = CURRENCY_CODE_LEN_VALIDATOR))]
    pub currency: String,
    #[validate(email)]
    pub payer_email: String,
}

/// Body accepted by the receipt-notification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptPayload {
    #[validate(nested)]
    pub payment_receipt: PaymentReceiptPayload,
    /// Application or purchase details captured by the checkout form.
    #[serde(default)]
    pub application_or_purchase_data: BTreeMap<String, String>,
    #[validate(length(min = 1, max = REFERENCE_MAX_LEN_VALIDATOR))]
    pub reference: String,
}

/// Response of the receipt-notification endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptAck {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ReceiptAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

impl ReceiptPayload {
    /// Validates the notification and converts it into a receipt record.
    pub fn into_new_receipt(self) -> ReceiptFormResult<NewPaymentReceipt> {
        self.validate()?;

        let reference = self.reference.trim().to_string();

        if let Some(receipt_reference) = self.payment_receipt.reference.as_deref() {
            let receipt_reference = receipt_reference.trim();
            if !receipt_reference.is_empty() && receipt_reference != reference {
                return Err(ReceiptFormError::ReferenceMismatch {
                    receipt: receipt_reference.to_string(),
                    reference,
                });
            }
        }

        let mut receipt = NewPaymentReceipt::new(
            reference,
            &self.payment_receipt.payer_email,
            self.payment_receipt.amount_minor_units,
            self.payment_receipt.currency.trim().to_ascii_uppercase(),
        )
        .with_details(self.application_or_purchase_data);

        if let Some(transaction) = self
            .payment_receipt
            .transaction
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            receipt = receipt.with_transaction(transaction);
        }

        Ok(receipt)
    }
}
