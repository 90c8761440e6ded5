use crate::domain::checkout::CheckoutAttempt;
use crate::forms::receipts::{PaymentReceiptPayload, ReceiptAck, ReceiptPayload};
use crate::repository::{DieselRepository, ReceiptReader, ReceiptWriter};
use crate::services::{ServiceError, ServiceResult};

/// Best-effort collaborator told about every successful payment.
pub trait ReceiptNotifier {
    fn send_receipt(&self, payload: &ReceiptPayload) -> ServiceResult<ReceiptAck>;
}

/// Records a payment receipt; repeated notifications for a reference are accepted once.
pub fn record_receipt<R>(repo: &R, payload: ReceiptPayload) -> ServiceResult<ReceiptAck>
where
    R: ReceiptReader + ReceiptWriter + ?Sized,
{
    let new_receipt = payload
        .into_new_receipt()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if repo
        .get_receipt_by_reference(&new_receipt.reference)
        .map_err(ServiceError::from)?
        .is_some()
    {
        log::info!("Receipt {} already recorded", new_receipt.reference);
        return Ok(ReceiptAck::ok("Receipt already recorded"));
    }

    let receipt = repo
        .create_receipt(&new_receipt)
        .map_err(ServiceError::from)?;

    log::info!(
        "Recorded receipt {} for {} ({} {})",
        receipt.reference,
        receipt.payer_email,
        receipt.amount_minor_units,
        receipt.currency
    );

    Ok(ReceiptAck::ok("Receipt recorded"))
}

/// Builds the receipt notification for a paid checkout attempt.
pub fn receipt_payload(attempt: &CheckoutAttempt) -> ReceiptPayload {
    ReceiptPayload {
        payment_receipt: PaymentReceiptPayload {
            reference: Some(attempt.reference.to_string()),
            transaction: attempt.transaction.clone(),
            amount_minor_units: attempt.amount_minor_units,
            currency: attempt.currency.clone(),
            payer_email: attempt.payer_email.clone(),
        },
        application_or_purchase_data: attempt.metadata.clone(),
        reference: attempt.reference.to_string(),
    }
}

impl ReceiptNotifier for DieselRepository {
    fn send_receipt(&self, payload: &ReceiptPayload) -> ServiceResult<ReceiptAck> {
        record_receipt(self, payload.clone())
    }
}
