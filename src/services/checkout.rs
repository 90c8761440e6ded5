use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::catalog::PurchaseKind;
use crate::domain::checkout::{
    AttemptStatus, AttemptTransition, CheckoutAttempt, CheckoutEvent, CheckoutPhase,
    CheckoutRedirect, CheckoutRequest, NewCheckoutAttempt, ProviderOutcome,
};
use crate::domain::pricing::{PriceTable, PricingResult, compute_total};
use crate::forms::checkout::{CheckoutForm, CheckoutFormError};
use crate::payment_widget::{PaymentWidget, ReadinessPolicy, WidgetState, wait_until_ready};
use crate::repository::{CheckoutAttemptReader, CheckoutAttemptWriter};
use crate::services::receipts::{ReceiptNotifier, receipt_payload};
use crate::services::{ServiceError, ServiceResult};

/// Result type returned by [`submit_checkout`].
pub type CheckoutResult<T> = Result<T, CheckoutError>;

/// Reasons a submission never reaches the payment widget.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A required field is missing or malformed.
    #[error("{0}")]
    Validation(CheckoutFormError),
    /// The human-verification token is missing.
    #[error("human verification is required")]
    VerificationRequired,
    /// The payment widget is not ready within the bounded wait.
    #[error("payment system is unavailable ({state:?})")]
    ProviderUnavailable { state: WidgetState },
    /// The total cannot be expressed in minor units.
    #[error("checkout amount is out of range")]
    AmountOutOfRange,
    #[error("service error: {0}")]
    Service(ServiceError),
}

impl From<CheckoutFormError> for CheckoutError {
    fn from(value: CheckoutFormError) -> Self {
        match value {
            CheckoutFormError::MissingVerification => CheckoutError::VerificationRequired,
            other => CheckoutError::Validation(other),
        }
    }
}

impl From<ServiceError> for CheckoutError {
    fn from(value: ServiceError) -> Self {
        CheckoutError::Service(value)
    }
}

/// Settings the browser passes to the payment widget.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetSession {
    pub public_key: String,
    pub email: String,
    pub amount: i64,
    pub currency: String,
    pub reference: String,
    pub metadata: BTreeMap<String, String>,
    /// Checks the pay page makes for the widget script before giving up.
    pub ready_attempts: u32,
    pub ready_interval_ms: u64,
}

impl WidgetSession {
    /// JSON for an inline `<script type="application/json">` element.
    ///
    /// `<`, `>` and `&` are written as unicode escapes so submitted metadata
    /// cannot close the element.
    pub fn to_script_json(&self) -> serde_json::Result<String> {
        let json = serde_json::to_string(self)?;
        Ok(escape_script_json(&json))
    }
}

fn escape_script_json(json: &str) -> String {
    let mut escaped = String::with_capacity(json.len());
    for ch in json.chars() {
        match ch {
            '<' => escaped.push_str("\\u003c"),
            '>' => escaped.push_str("\\u003e"),
            '&' => escaped.push_str("\\u0026"),
            '\u{2028}' => escaped.push_str("\\u2028"),
            '\u{2029}' => escaped.push_str("\\u2029"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Public view of an attempt for support lookups; carries no payer details.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckoutStatusView {
    pub reference: String,
    pub kind: PurchaseKind,
    pub status: AttemptStatus,
    pub amount_minor_units: i64,
    pub currency: String,
    /// Result page once the attempt is resolved.
    pub redirect: Option<String>,
}

impl From<&CheckoutAttempt> for CheckoutStatusView {
    fn from(attempt: &CheckoutAttempt) -> Self {
        Self {
            reference: attempt.reference.to_string(),
            kind: attempt.kind,
            status: attempt.status,
            amount_minor_units: attempt.amount_minor_units,
            currency: attempt.currency.clone(),
            redirect: attempt.redirect().map(|target| target.location()),
        }
    }
}

/// Opened checkout, rendered as the pay page.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub kind: PurchaseKind,
    pub request: CheckoutRequest,
    pub pricing: PricingResult,
    pub widget: WidgetSession,
    pub phase: CheckoutPhase,
}

/// Query string the pay page sends back once the widget reports an outcome.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderCallback {
    pub reference: String,
    /// `success`, `cancelled`, or anything else for a decline.
    pub status: String,
    #[serde(default)]
    pub transaction: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl ProviderCallback {
    pub fn outcome(&self) -> ProviderOutcome {
        match self.status.trim().to_ascii_lowercase().as_str() {
            "success" => ProviderOutcome::Success {
                transaction: self
                    .transaction
                    .as_deref()
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string),
            },
            "cancelled" | "canceled" | "closed" => ProviderOutcome::Cancelled,
            _ => ProviderOutcome::Failed {
                reason: self.reason.clone(),
            },
        }
    }
}

/// Validates a checkout form, waits for the widget and opens a new attempt.
///
/// Nothing is persisted and no [`CheckoutRequest`] is built unless the form
/// is valid and the widget is ready.
pub fn submit_checkout<R, W>(
    repo: &R,
    widget: &W,
    policy: ReadinessPolicy,
    kind: PurchaseKind,
    form: CheckoutForm,
) -> CheckoutResult<CheckoutSession>
where
    R: CheckoutAttemptWriter + ?Sized,
    W: PaymentWidget + ?Sized,
{
    let mut phase = CheckoutPhase::Idle.next(CheckoutEvent::Submit);

    let submission = match form.into_submission(kind) {
        Ok(submission) => submission,
        Err(err) => {
            phase = phase.next(CheckoutEvent::Rejected);
            log::debug!("Rejected {kind} checkout ({phase:?}): {err}");
            return Err(err.into());
        }
    };
    phase = phase.next(CheckoutEvent::Validated);

    let pricing = compute_total(
        submission.applicant_kind,
        &submission.selection,
        PriceTable::for_purchase(kind),
    );
    let amount = pricing
        .amount_minor_units()
        .ok_or(CheckoutError::AmountOutOfRange)?;

    if let Err(state) = wait_until_ready(widget, policy) {
        phase = phase.next(CheckoutEvent::ProviderUnavailable);
        log::warn!("Payment widget unavailable for {kind} checkout ({phase:?}): {state:?}");
        return Err(CheckoutError::ProviderUnavailable { state });
    }
    phase = phase.next(CheckoutEvent::ProviderReady);

    let request = CheckoutRequest::new(
        kind,
        submission.email.as_str(),
        amount,
        pricing.currency,
        submission.metadata(),
    );

    let new_attempt = NewCheckoutAttempt::from_request(kind, submission.applicant_kind, &request);
    repo.create_checkout_attempt(&new_attempt)
        .map_err(ServiceError::from)?;

    log::info!(
        "Opened {kind} checkout {} for {} units ({} {})",
        request.reference(),
        pricing.unit_count,
        pricing.total,
        pricing.currency
    );

    let widget = WidgetSession {
        public_key: widget.public_key(),
        email: request.payer_email().to_string(),
        amount: request.amount_minor_units(),
        currency: request.currency().to_string(),
        reference: request.reference().to_string(),
        metadata: request.metadata().clone(),
        ready_attempts: policy.attempts.max(1),
        ready_interval_ms: u64::try_from(policy.interval.as_millis()).unwrap_or(u64::MAX),
    };

    Ok(CheckoutSession {
        kind,
        request,
        pricing,
        widget,
        phase,
    })
}

/// Applies the widget outcome to its attempt and picks the result page.
///
/// The receipt is sent only for a fresh success and its failure is logged,
/// never returned. Outcomes for an already resolved attempt change nothing
/// and lead to the same result page.
///
/// The outcome is taken from the browser as reported. Confirming it with the
/// payment provider (a signed webhook or a transaction lookup) is not done
/// here, so a caller holding a reference can report any outcome once.
pub fn resolve_checkout<R, N>(
    repo: &R,
    notifier: &N,
    callback: ProviderCallback,
) -> ServiceResult<CheckoutRedirect>
where
    R: CheckoutAttemptReader + CheckoutAttemptWriter + ?Sized,
    N: ReceiptNotifier + ?Sized,
{
    let outcome = callback.outcome();
    let attempt = load_attempt(repo, &callback.reference)?;

    let resolution = match attempt.apply(&outcome) {
        AttemptTransition::Resolve(resolution) => resolution,
        AttemptTransition::AlreadyResolved => {
            log::info!(
                "Ignoring repeated provider callback for {} ({:?})",
                attempt.reference,
                attempt.status
            );
            return attempt.redirect().ok_or(ServiceError::Conflict);
        }
    };

    let resolved = match repo
        .resolve_checkout_attempt(attempt.reference.as_str(), &resolution)
        .map_err(ServiceError::from)?
    {
        Some(resolved) => resolved,
        None => {
            // A concurrent callback resolved the attempt first.
            let current = load_attempt(repo, attempt.reference.as_str())?;
            return current.redirect().ok_or(ServiceError::Conflict);
        }
    };

    let mut phase = CheckoutPhase::ProviderOpen.next(outcome.event());
    if phase == CheckoutPhase::SendingReceipt {
        notify_receipt(notifier, &resolved);
        phase = phase.next(CheckoutEvent::ReceiptDispatched);
    } else {
        log::warn!(
            "Checkout {} ended as {:?}: {}",
            resolved.reference,
            resolved.status,
            resolved.failure_reason.as_deref().unwrap_or_default()
        );
    }
    log::debug!("Checkout {} is {phase:?}", resolved.reference);

    resolved.redirect().ok_or(ServiceError::Conflict)
}

/// Loads a checkout attempt for support lookups.
pub fn load_attempt<R>(repo: &R, reference: &str) -> ServiceResult<CheckoutAttempt>
where
    R: CheckoutAttemptReader + ?Sized,
{
    repo.get_checkout_attempt(reference.trim())
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

/// Status of a checkout attempt without payer details.
pub fn load_checkout_status<R>(repo: &R, reference: &str) -> ServiceResult<CheckoutStatusView>
where
    R: CheckoutAttemptReader + ?Sized,
{
    load_attempt(repo, reference).map(|attempt| CheckoutStatusView::from(&attempt))
}

/// Handles a pay page that gave up waiting for the widget script.
///
/// This is an availability problem, not a provider outcome: the attempt stays
/// open and the buyer goes back to the form of the returned kind.
pub fn report_widget_unavailable<R>(repo: &R, reference: &str) -> ServiceResult<PurchaseKind>
where
    R: CheckoutAttemptReader + ?Sized,
{
    let attempt = load_attempt(repo, reference)?;
    let phase = CheckoutPhase::AwaitingProviderReady.next(CheckoutEvent::ProviderUnavailable);
    log::warn!(
        "Payment widget did not load for checkout {} ({:?}); back to {phase:?}",
        attempt.reference,
        attempt.status
    );
    Ok(attempt.kind)
}

fn notify_receipt<N>(notifier: &N, attempt: &CheckoutAttempt)
where
    N: ReceiptNotifier + ?Sized,
{
    match notifier.send_receipt(&receipt_payload(attempt)) {
        Ok(ack) if ack.success => {
            log::info!("Receipt sent for {}", attempt.reference);
        }
        Ok(ack) => {
            log::error!(
                "Receipt for {} was not accepted: {}",
                attempt.reference,
                ack.message.unwrap_or_default()
            );
        }
        Err(err) => {
            log::error!("Failed to send receipt for {}: {err}", attempt.reference);
        }
    }
}
