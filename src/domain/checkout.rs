use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::catalog::PurchaseKind;
use crate::domain::pricing::ApplicantKind;

/// Reason recorded when the buyer closes the payment widget.
pub const CANCELLED_BY_USER: &str = "Payment cancelled by user";

/// Reason recorded when the provider declines without giving one.
pub const DECLINED_BY_PROVIDER: &str = "Payment was declined by the provider";

/// Unique identifier of one checkout attempt, shared with the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference(String);

impl Reference {
    /// Generates a fresh reference. Retries always get a new one.
    pub fn generate(kind: PurchaseKind) -> Self {
        Self(format!(
            "{}-{}",
            kind.reference_prefix(),
            Uuid::new_v4().simple()
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Reference {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Payment request handed to the provider widget. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutRequest {
    payer_email: String,
    amount_minor_units: i64,
    currency: String,
    reference: Reference,
    metadata: BTreeMap<String, String>,
}

impl CheckoutRequest {
    /// Builds the request for a new attempt with a freshly generated reference.
    pub fn new(
        kind: PurchaseKind,
        payer_email: impl Into<String>,
        amount_minor_units: i64,
        currency: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) -> Self {
        Self {
            payer_email: payer_email.into(),
            amount_minor_units,
            currency: currency.into(),
            reference: Reference::generate(kind),
            metadata,
        }
    }

    pub fn payer_email(&self) -> &str {
        &self.payer_email
    }

    pub fn amount_minor_units(&self) -> i64 {
        self.amount_minor_units
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

/// Phases of a single checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    Idle,
    Validating,
    AwaitingProviderReady,
    ProviderOpen,
    SendingReceipt,
    Redirecting,
}

/// Inputs driving [`CheckoutPhase::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutEvent {
    /// The buyer pressed "pay".
    Submit,
    /// Required fields and the verification token are present and well-formed.
    Validated,
    /// Validation or verification failed.
    Rejected,
    /// The payment widget reported ready within the bounded wait.
    ProviderReady,
    /// The payment widget failed or did not load in time.
    ProviderUnavailable,
    /// The provider confirmed the payment.
    PaymentSucceeded,
    /// The buyer closed the widget or the provider declined.
    PaymentAborted,
    /// The receipt notification was dispatched, successfully or not.
    ReceiptDispatched,
}

impl CheckoutPhase {
    /// Single transition function of the checkout flow.
    ///
    /// Events that do not apply to the current phase leave it unchanged, so a
    /// repeated provider callback after the redirect is a no-op.
    pub fn next(self, event: CheckoutEvent) -> CheckoutPhase {
        use CheckoutEvent as E;
        use CheckoutPhase as P;

        match (self, event) {
            (P::Idle, E::Submit) => P::Validating,
            (P::Validating, E::Validated) => P::AwaitingProviderReady,
            (P::Validating, E::Rejected) => P::Idle,
            (P::AwaitingProviderReady, E::ProviderReady) => P::ProviderOpen,
            (P::AwaitingProviderReady, E::ProviderUnavailable) => P::Idle,
            (P::ProviderOpen, E::PaymentSucceeded) => P::SendingReceipt,
            (P::ProviderOpen, E::PaymentAborted) => P::Redirecting,
            (P::SendingReceipt, E::ReceiptDispatched) => P::Redirecting,
            (phase, _) => phase,
        }
    }

    /// Whether the submit action is locked in this phase.
    pub fn is_submitting(self) -> bool {
        matches!(
            self,
            CheckoutPhase::Validating
                | CheckoutPhase::AwaitingProviderReady
                | CheckoutPhase::ProviderOpen
                | CheckoutPhase::SendingReceipt
        )
    }

    pub fn is_terminal(self) -> bool {
        self == CheckoutPhase::Redirecting
    }
}

/// Outcome reported by the payment widget for an opened session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// Payment confirmed; `transaction` is the provider's own identifier when supplied.
    Success { transaction: Option<String> },
    /// The buyer closed the widget before completing.
    Cancelled,
    /// The provider declined the payment.
    Failed { reason: Option<String> },
}

impl ProviderOutcome {
    pub fn event(&self) -> CheckoutEvent {
        match self {
            ProviderOutcome::Success { .. } => CheckoutEvent::PaymentSucceeded,
            ProviderOutcome::Cancelled | ProviderOutcome::Failed { .. } => {
                CheckoutEvent::PaymentAborted
            }
        }
    }
}

/// Persisted status of a checkout attempt.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// The widget was opened and no outcome has arrived yet.
    Open,
    Succeeded,
    Cancelled,
    Failed,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Open => "open",
            AttemptStatus::Succeeded => "succeeded",
            AttemptStatus::Cancelled => "cancelled",
            AttemptStatus::Failed => "failed",
        }
    }

    pub fn is_resolved(self) -> bool {
        self != AttemptStatus::Open
    }
}

impl From<&str> for AttemptStatus {
    fn from(value: &str) -> Self {
        match value {
            "succeeded" => AttemptStatus::Succeeded,
            "cancelled" => AttemptStatus::Cancelled,
            "failed" => AttemptStatus::Failed,
            _ => AttemptStatus::Open,
        }
    }
}

/// Checkout attempt stored between opening the widget and the provider callback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutAttempt {
    pub id: i32,
    pub reference: Reference,
    pub kind: PurchaseKind,
    pub applicant_kind: ApplicantKind,
    pub payer_email: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
    pub status: AttemptStatus,
    /// Provider-side transaction identifier, set on success.
    pub transaction: Option<String>,
    /// Reason shown on the failure page, set on cancellation or decline.
    pub failure_reason: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Terminal data written when an attempt is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResolution {
    pub status: AttemptStatus,
    pub transaction: Option<String>,
    pub failure_reason: Option<String>,
    pub updated_at: NaiveDateTime,
}

/// Result of feeding a provider outcome into an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptTransition {
    /// First outcome for this attempt; persist the resolution.
    Resolve(AttemptResolution),
    /// The attempt already has an outcome; nothing may change.
    AlreadyResolved,
}

impl CheckoutAttempt {
    /// Consumes a provider outcome. Only the first outcome is ever applied.
    pub fn apply(&self, outcome: &ProviderOutcome) -> AttemptTransition {
        if self.status.is_resolved() {
            return AttemptTransition::AlreadyResolved;
        }

        let now = chrono::Local::now().naive_utc();
        let resolution = match outcome {
            ProviderOutcome::Success { transaction } => AttemptResolution {
                status: AttemptStatus::Succeeded,
                transaction: transaction.clone(),
                failure_reason: None,
                updated_at: now,
            },
            ProviderOutcome::Cancelled => AttemptResolution {
                status: AttemptStatus::Cancelled,
                transaction: None,
                failure_reason: Some(CANCELLED_BY_USER.to_string()),
                updated_at: now,
            },
            ProviderOutcome::Failed { reason } => AttemptResolution {
                status: AttemptStatus::Failed,
                transaction: None,
                failure_reason: Some(
                    reason
                        .as_deref()
                        .map(str::trim)
                        .filter(|value| !value.is_empty())
                        .unwrap_or(DECLINED_BY_PROVIDER)
                        .to_string(),
                ),
                updated_at: now,
            },
        };

        AttemptTransition::Resolve(resolution)
    }

    /// Result page for a resolved attempt; `None` while it is still open.
    pub fn redirect(&self) -> Option<CheckoutRedirect> {
        match self.status {
            AttemptStatus::Open => None,
            AttemptStatus::Succeeded => Some(CheckoutRedirect::Success {
                reference: self.reference.clone(),
                kind: self.kind,
            }),
            AttemptStatus::Cancelled | AttemptStatus::Failed => Some(CheckoutRedirect::Failure {
                reason: self
                    .failure_reason
                    .clone()
                    .unwrap_or_else(|| DECLINED_BY_PROVIDER.to_string()),
                reference: Some(self.reference.clone()),
            }),
        }
    }
}

/// Payload required to insert a new checkout attempt.
#[derive(Debug, Clone)]
pub struct NewCheckoutAttempt {
    pub reference: Reference,
    pub kind: PurchaseKind,
    pub applicant_kind: ApplicantKind,
    pub payer_email: String,
    pub amount_minor_units: i64,
    pub currency: String,
    pub metadata: BTreeMap<String, String>,
    pub updated_at: NaiveDateTime,
}

impl NewCheckoutAttempt {
    /// Snapshot of an opened checkout request.
    pub fn from_request(
        kind: PurchaseKind,
        applicant_kind: ApplicantKind,
        request: &CheckoutRequest,
    ) -> Self {
        Self {
            reference: request.reference().clone(),
            kind,
            applicant_kind,
            payer_email: request.payer_email().to_string(),
            amount_minor_units: request.amount_minor_units(),
            currency: request.currency().to_string(),
            metadata: request.metadata().clone(),
            updated_at: chrono::Local::now().naive_utc(),
        }
    }
}

/// Navigation target once a checkout attempt ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutRedirect {
    Success {
        reference: Reference,
        kind: PurchaseKind,
    },
    Failure {
        reason: String,
        reference: Option<Reference>,
    },
}

#[derive(Serialize)]
struct SuccessQuery<'a> {
    reference: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Serialize)]
struct FailureQuery<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference: Option<&'a str>,
}

impl CheckoutRedirect {
    pub const SUCCESS_PATH: &'static str = "/payment/success";
    pub const FAILURE_PATH: &'static str = "/payment/failed";

    /// Relative URL of the result page, with an encoded query string.
    pub fn location(&self) -> String {
        let (path, query) = match self {
            CheckoutRedirect::Success { reference, kind } => (
                Self::SUCCESS_PATH,
                serde_qs::to_string(&SuccessQuery {
                    reference: reference.as_str(),
                    kind: kind.as_str(),
                }),
            ),
            CheckoutRedirect::Failure { reason, reference } => (
                Self::FAILURE_PATH,
                serde_qs::to_string(&FailureQuery {
                    error: reason,
                    reference: reference.as_ref().map(Reference::as_str),
                }),
            ),
        };

        match query {
            Ok(query) if !query.is_empty() => format!("{path}?{query}"),
            Ok(_) => path.to_string(),
            Err(err) => {
                log::error!("Failed to encode result page query: {err}");
                path.to_string()
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, CheckoutRedirect::Success { .. })
    }
}
