use std::collections::BTreeMap;

use pushkind_common::routes::empty_string_as_none;
use serde::Deserialize;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::catalog::PurchaseKind;
use crate::domain::pricing::ApplicantKind;
use crate::domain::selection::SelectionSet;

/// Maximum length allowed for the payer's name.
const NAME_MAX_LEN: usize = 128;
const NAME_MAX_LEN_VALIDATOR: u64 = NAME_MAX_LEN as u64;

/// Maximum length allowed for the agency or company name.
const ORGANIZATION_MAX_LEN: usize = 256;
const ORGANIZATION_MAX_LEN_VALIDATOR: u64 = ORGANIZATION_MAX_LEN as u64;

const PHONE_MAX_LEN_VALIDATOR: u64 = 32;

/// Checkbox values browsers send for a ticked box.
const CHECKED_VALUES: &[&str] = &["on", "true", "1", "yes"];

/// Result type returned by the checkout form helpers.
pub type CheckoutFormResult<T> = Result<T, CheckoutFormError>;

/// Reasons a checkout form is rejected before any payment call.
#[derive(Debug, Error)]
pub enum CheckoutFormError {
    /// Validation failures from the `validator` crate.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    /// The name is empty after sanitization.
    #[error("full name cannot be empty")]
    EmptyName,
    /// The applicant kind is not one of the priced kinds.
    #[error("unknown applicant type `{value}`")]
    UnknownApplicantKind { value: String },
    /// Nothing was selected.
    #[error("select at least one {unit}")]
    NoUnitsSelected { unit: &'static str },
    /// A submitted unit is not part of the catalog.
    #[error("`{value}` is not an available {unit}")]
    UnknownUnit { unit: &'static str, value: String },
    /// A consent checkbox was left unticked.
    #[error("please accept the {label} to continue")]
    ConsentRequired {
        field: &'static str,
        label: &'static str,
    },
    /// The human-verification challenge was not completed.
    #[error("please complete the human verification")]
    MissingVerification,
}

impl CheckoutFormError {
    /// Form field the error belongs to, when it is field-scoped.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CheckoutFormError::Validation(errors) => {
                errors.field_errors().keys().next().and_then(|key| match key.as_ref() {
                    "full_name" => Some("full_name"),
                    "email" => Some("email"),
                    "phone" => Some("phone"),
                    "organization" => Some("organization"),
                    _ => None,
                })
            }
            CheckoutFormError::EmptyName => Some("full_name"),
            CheckoutFormError::UnknownApplicantKind { .. } => Some("applicant_kind"),
            CheckoutFormError::NoUnitsSelected { .. } | CheckoutFormError::UnknownUnit { .. } => {
                Some("units")
            }
            CheckoutFormError::ConsentRequired { field, .. } => Some(*field),
            CheckoutFormError::MissingVerification => None,
        }
    }
}

/// Form payload emitted by the awards and masterclass checkout pages.
///
/// Decoded with `serde_html_form` so repeated `units` keys collect into a list.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CheckoutForm {
    /// Payer's full name.
    #[serde(default)]
    #[validate(length(min = 1, max = NAME_MAX_LEN_VALIDATOR))]
    pub full_name: String,
    /// Payer's email, used for the receipt.
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = PHONE_MAX_LEN_VALIDATOR))]
    pub phone: Option<String>,
    /// Agency or company name.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(length(max = ORGANIZATION_MAX_LEN_VALIDATOR))]
    pub organization: Option<String>,
    /// `agency` or `freelancer`.
    #[serde(default)]
    pub applicant_kind: String,
    /// Selected award categories or masterclass sessions.
    #[serde(default)]
    pub units: Vec<String>,
    #[serde(default)]
    pub accept_terms: Option<String>,
    #[serde(default)]
    pub accept_privacy: Option<String>,
    /// Token issued by the human-verification widget.
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub verification_token: Option<String>,
}

/// Validated checkout form, ready to be priced.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSubmission {
    pub kind: PurchaseKind,
    pub applicant_kind: ApplicantKind,
    pub full_name: String,
    /// Lowercased payer email.
    pub email: String,
    pub phone: Option<String>,
    pub organization: Option<String>,
    pub selection: SelectionSet,
    pub verification_token: String,
}

impl CheckoutSubmission {
    /// Application data forwarded to the provider and the receipt.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut metadata = BTreeMap::new();
        metadata.insert("purchase_type".to_string(), self.kind.as_str().to_string());
        metadata.insert(
            "applicant_kind".to_string(),
            self.applicant_kind.as_str().to_string(),
        );
        metadata.insert("full_name".to_string(), self.full_name.clone());
        metadata.insert(
            "units".to_string(),
            self.selection.iter().collect::<Vec<_>>().join(", "),
        );
        if let Some(phone) = &self.phone {
            metadata.insert("phone".to_string(), phone.clone());
        }
        if let Some(organization) = &self.organization {
            metadata.insert("organization".to_string(), organization.clone());
        }
        metadata
    }
}

impl CheckoutForm {
    /// Validates and sanitizes the payload for the given purchase flow.
    pub fn into_submission(self, kind: PurchaseKind) -> CheckoutFormResult<CheckoutSubmission> {
        self.validate()?;

        let full_name = sanitize_inline_text(&self.full_name);
        if full_name.is_empty() {
            return Err(CheckoutFormError::EmptyName);
        }

        let applicant_kind = self.applicant_kind.parse::<ApplicantKind>().map_err(|_| {
            CheckoutFormError::UnknownApplicantKind {
                value: self.applicant_kind.trim().to_string(),
            }
        })?;

        let selection = select_units(kind, self.units)?;
        if selection.is_empty() {
            return Err(CheckoutFormError::NoUnitsSelected {
                unit: unit_label(kind),
            });
        }

        if !is_checked(self.accept_terms.as_deref()) {
            return Err(CheckoutFormError::ConsentRequired {
                field: "accept_terms",
                label: "terms and conditions",
            });
        }
        if !is_checked(self.accept_privacy.as_deref()) {
            return Err(CheckoutFormError::ConsentRequired {
                field: "accept_privacy",
                label: "privacy policy",
            });
        }

        let verification_token = self
            .verification_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or(CheckoutFormError::MissingVerification)?;

        Ok(CheckoutSubmission {
            kind,
            applicant_kind,
            full_name,
            email: self.email.trim().to_lowercase(),
            phone: self
                .phone
                .as_deref()
                .map(sanitize_inline_text)
                .filter(|value| !value.is_empty()),
            organization: self
                .organization
                .as_deref()
                .map(sanitize_inline_text)
                .filter(|value| !value.is_empty()),
            selection,
            verification_token,
        })
    }
}

/// Builds a selection from submitted unit identifiers, rejecting unknown ones.
///
/// Repeated identifiers collapse into one unit. The result may be empty.
pub fn select_units<I>(kind: PurchaseKind, units: I) -> CheckoutFormResult<SelectionSet>
where
    I: IntoIterator<Item = String>,
{
    let unit = unit_label(kind);
    let mut selection = SelectionSet::new();

    for value in units {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        match kind.find_unit(value) {
            Some(item) => {
                selection.insert(item.id);
            }
            None => {
                return Err(CheckoutFormError::UnknownUnit {
                    unit,
                    value: value.to_string(),
                });
            }
        }
    }

    Ok(selection)
}

/// Reactive pricing request sent by the checkout page on every change.
#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    pub kind: PurchaseKind,
    pub applicant_kind: ApplicantKind,
    /// Units currently selected on the requesting form.
    #[serde(default)]
    pub units: Vec<String>,
    /// Unit to toggle before pricing.
    #[serde(default)]
    pub toggle: Option<String>,
}

fn unit_label(kind: PurchaseKind) -> &'static str {
    match kind {
        PurchaseKind::Awards => "award category",
        PurchaseKind::Masterclass => "masterclass session",
    }
}

fn is_checked(value: Option<&str>) -> bool {
    value
        .map(|value| CHECKED_VALUES.contains(&value.trim().to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn sanitize_inline_text(input: &str) -> String {
    let mut sanitized = String::with_capacity(input.len());
    let mut previous_whitespace = false;

    for ch in input.trim().chars() {
        if ch.is_whitespace() {
            if !previous_whitespace {
                sanitized.push(' ');
                previous_whitespace = true;
            }
        } else if ch.is_control() {
            continue;
        } else {
            sanitized.push(ch);
            previous_whitespace = false;
        }
    }

    sanitized
}
