use pushkind_common::db::{DbConnection, DbPool};
use pushkind_common::repository::errors::RepositoryResult;

use crate::domain::checkout::{AttemptResolution, CheckoutAttempt, NewCheckoutAttempt};
use crate::domain::receipt::{NewPaymentReceipt, PaymentReceipt};

pub mod checkout_attempt;
pub mod receipt;

#[cfg(test)]
pub mod mock;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over checkout attempts.
pub trait CheckoutAttemptReader {
    fn get_checkout_attempt(&self, reference: &str) -> RepositoryResult<Option<CheckoutAttempt>>;
}

/// Write operations over checkout attempts.
pub trait CheckoutAttemptWriter {
    fn create_checkout_attempt(
        &self,
        new_attempt: &NewCheckoutAttempt,
    ) -> RepositoryResult<CheckoutAttempt>;
    /// Stores the outcome of an open attempt.
    ///
    /// Returns `None` when the attempt was already resolved, leaving it untouched.
    fn resolve_checkout_attempt(
        &self,
        reference: &str,
        resolution: &AttemptResolution,
    ) -> RepositoryResult<Option<CheckoutAttempt>>;
}

/// Read-only operations over payment receipts.
pub trait ReceiptReader {
    fn get_receipt_by_reference(&self, reference: &str) -> RepositoryResult<Option<PaymentReceipt>>;
}

/// Write operations over payment receipts.
pub trait ReceiptWriter {
    fn create_receipt(&self, new_receipt: &NewPaymentReceipt) -> RepositoryResult<PaymentReceipt>;
}
