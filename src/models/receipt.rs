use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::receipt::{
    NewPaymentReceipt as DomainNewPaymentReceipt, PaymentReceipt as DomainPaymentReceipt,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::payment_receipts)]
pub struct PaymentReceipt {
    pub id: i32,
    pub reference: String,
    pub transaction_ref: Option<String>,
    pub payer_email: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub details: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::payment_receipts)]
pub struct NewPaymentReceipt<'a> {
    pub reference: &'a str,
    pub transaction_ref: Option<&'a str>,
    pub payer_email: &'a str,
    pub amount_minor_units: i64,
    pub currency: &'a str,
    pub details: String,
}

impl From<PaymentReceipt> for DomainPaymentReceipt {
    fn from(value: PaymentReceipt) -> Self {
        let details: BTreeMap<String, String> =
            serde_json::from_str(&value.details).unwrap_or_default();

        Self {
            id: value.id,
            reference: value.reference,
            transaction: value.transaction_ref,
            payer_email: value.payer_email,
            amount_minor_units: value.amount_minor_units,
            currency: value.currency,
            details,
            created_at: value.created_at,
        }
    }
}

impl<'a> From<&'a DomainNewPaymentReceipt> for NewPaymentReceipt<'a> {
    fn from(value: &'a DomainNewPaymentReceipt) -> Self {
        Self {
            reference: value.reference.as_str(),
            transaction_ref: value.transaction.as_deref(),
            payer_email: value.payer_email.as_str(),
            amount_minor_units: value.amount_minor_units,
            currency: value.currency.as_str(),
            details: serde_json::to_string(&value.details).unwrap_or_else(|_| "{}".to_string()),
        }
    }
}
