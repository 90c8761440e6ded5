use mockall::mock;

use super::{CheckoutAttemptReader, CheckoutAttemptWriter, ReceiptReader, ReceiptWriter};
use crate::domain::{
    checkout::{AttemptResolution, CheckoutAttempt, NewCheckoutAttempt},
    receipt::{NewPaymentReceipt, PaymentReceipt},
};
use pushkind_common::repository::errors::RepositoryResult;

mock! {
    pub CheckoutAttemptReader {}

    impl CheckoutAttemptReader for CheckoutAttemptReader {
        fn get_checkout_attempt(&self, reference: &str) -> RepositoryResult<Option<CheckoutAttempt>>;
    }
}

mock! {
    pub CheckoutAttemptWriter {}

    impl CheckoutAttemptWriter for CheckoutAttemptWriter {
        fn create_checkout_attempt(&self, new_attempt: &NewCheckoutAttempt) -> RepositoryResult<CheckoutAttempt>;
        fn resolve_checkout_attempt(&self, reference: &str, resolution: &AttemptResolution) -> RepositoryResult<Option<CheckoutAttempt>>;
    }
}

mock! {
    pub CheckoutAttemptRepository {}

    impl CheckoutAttemptReader for CheckoutAttemptRepository {
        fn get_checkout_attempt(&self, reference: &str) -> RepositoryResult<Option<CheckoutAttempt>>;
    }

    impl CheckoutAttemptWriter for CheckoutAttemptRepository {
        fn create_checkout_attempt(&self, new_attempt: &NewCheckoutAttempt) -> RepositoryResult<CheckoutAttempt>;
        fn resolve_checkout_attempt(&self, reference: &str, resolution: &AttemptResolution) -> RepositoryResult<Option<CheckoutAttempt>>;
    }
}

mock! {
    pub ReceiptRepository {}

    impl ReceiptReader for ReceiptRepository {
        fn get_receipt_by_reference(&self, reference: &str) -> RepositoryResult<Option<PaymentReceipt>>;
    }

    impl ReceiptWriter for ReceiptRepository {
        fn create_receipt(&self, new_receipt: &NewPaymentReceipt) -> RepositoryResult<PaymentReceipt>;
    }
}
