use diesel::prelude::*;
use pushkind_common::repository::errors::RepositoryResult;

use crate::{
    domain::receipt::{NewPaymentReceipt, PaymentReceipt},
    models::receipt::{
        NewPaymentReceipt as DbNewPaymentReceipt, PaymentReceipt as DbPaymentReceipt,
    },
    repository::{DieselRepository, ReceiptReader, ReceiptWriter},
};

impl ReceiptReader for DieselRepository {
    fn get_receipt_by_reference(&self, reference: &str) -> RepositoryResult<Option<PaymentReceipt>> {
        use crate::schema::payment_receipts;

        let mut conn = self.conn()?;
        let receipt = payment_receipts::table
            .filter(payment_receipts::reference.eq(reference))
            .first::<DbPaymentReceipt>(&mut conn)
            .optional()?;

        Ok(receipt.map(Into::into))
    }
}

impl ReceiptWriter for DieselRepository {
    fn create_receipt(&self, new_receipt: &NewPaymentReceipt) -> RepositoryResult<PaymentReceipt> {
        use crate::schema::payment_receipts;

        let mut conn = self.conn()?;
        let db_new: DbNewPaymentReceipt = new_receipt.into();

        let created = diesel::insert_into(payment_receipts::table)
            .values(&db_new)
            .get_result::<DbPaymentReceipt>(&mut conn)?;

        Ok(created.into())
    }
}
