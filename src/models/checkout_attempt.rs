use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::catalog::PurchaseKind;
use crate::domain::checkout::{
    AttemptResolution as DomainAttemptResolution, AttemptStatus,
    CheckoutAttempt as DomainCheckoutAttempt, NewCheckoutAttempt as DomainNewCheckoutAttempt,
    Reference,
};
use crate::domain::pricing::ApplicantKind;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::checkout_attempts)]
pub struct CheckoutAttempt {
    pub id: i32,
    pub reference: String,
    pub kind: String,
    pub applicant_kind: String,
    pub payer_email: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub metadata: String,
    pub status: String,
    pub transaction_ref: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::checkout_attempts)]
pub struct NewCheckoutAttempt<'a> {
    pub reference: &'a str,
    pub kind: &'a str,
    pub applicant_kind: &'a str,
    pub payer_email: &'a str,
    pub amount_minor_units: i64,
    pub currency: &'a str,
    pub metadata: String,
    pub status: &'a str,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::checkout_attempts)]
#[diesel(treat_none_as_null = true)]
pub struct ResolveCheckoutAttempt<'a> {
    pub status: &'a str,
    pub transaction_ref: Option<&'a str>,
    pub failure_reason: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

// Rows are only written through `NewCheckoutAttempt`; unknown enum values fall back to defaults.
impl From<CheckoutAttempt> for DomainCheckoutAttempt {
    fn from(value: CheckoutAttempt) -> Self {
        let kind = value.kind.parse().unwrap_or(PurchaseKind::Awards);
        let applicant_kind = value
            .applicant_kind
            .parse()
            .unwrap_or(ApplicantKind::Agency);
        let metadata: BTreeMap<String, String> =
            serde_json::from_str(&value.metadata).unwrap_or_default();

        Self {
            id: value.id,
            reference: Reference::from(value.reference),
            kind,
            applicant_kind,
            payer_email: value.payer_email,
            amount_minor_units: value.amount_minor_units,
            currency: value.currency,
            metadata,
            status: value.status.as_str().into(),
            transaction: value.transaction_ref,
            failure_reason: value.failure_reason,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewCheckoutAttempt> for NewCheckoutAttempt<'a> {
    fn from(value: &'a DomainNewCheckoutAttempt) -> Self {
        Self {
            reference: value.reference.as_str(),
            kind: value.kind.as_str(),
            applicant_kind: value.applicant_kind.as_str(),
            payer_email: value.payer_email.as_str(),
            amount_minor_units: value.amount_minor_units,
            currency: value.currency.as_str(),
            metadata: serde_json::to_string(&value.metadata).unwrap_or_else(|_| "{}".to_string()),
            status: AttemptStatus::Open.as_str(),
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainAttemptResolution> for ResolveCheckoutAttempt<'a> {
    fn from(value: &'a DomainAttemptResolution) -> Self {
        Self {
            status: value.status.as_str(),
            transaction_ref: value.transaction.as_deref(),
            failure_reason: value.failure_reason.as_deref(),
            updated_at: value.updated_at,
        }
    }
}
