use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::domain::catalog::PurchaseKind;
use crate::domain::selection::SelectionSet;

/// Flat discount applied to multi-unit selections.
pub const DISCOUNT_RATE: Decimal = dec!(0.25);

/// Smallest selection that qualifies for [`DISCOUNT_RATE`].
pub const DISCOUNT_MIN_UNITS: usize = 2;

/// Number of decimal places kept for every monetary amount.
pub const CURRENCY_SCALE: u32 = 2;

/// Buyer category selecting the row of a [`PriceTable`].
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantKind {
    Agency,
    Freelancer,
}

impl ApplicantKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ApplicantKind::Agency => "agency",
            ApplicantKind::Freelancer => "freelancer",
        }
    }
}

impl fmt::Display for ApplicantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown applicant kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown applicant kind `{0}`")]
pub struct UnknownApplicantKind(pub String);

impl FromStr for ApplicantKind {
    type Err = UnknownApplicantKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "agency" => Ok(ApplicantKind::Agency),
            "freelancer" => Ok(ApplicantKind::Freelancer),
            _ => Err(UnknownApplicantKind(s.to_string())),
        }
    }
}

/// Price of a single unit for one applicant kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceEntry {
    pub price_per_unit: Decimal,
    /// ISO 4217 currency code.
    pub currency: &'static str,
}

/// Unit prices keyed by applicant kind.
///
/// Every [`ApplicantKind`] has a row, so a lookup can never miss.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceTable {
    pub agency: PriceEntry,
    pub freelancer: PriceEntry,
}

const AWARDS_PRICES: PriceTable = PriceTable {
    agency: PriceEntry {
        price_per_unit: dec!(200.00),
        currency: "USD",
    },
    freelancer: PriceEntry {
        price_per_unit: dec!(30.00),
        currency: "USD",
    },
};

const MASTERCLASS_PRICES: PriceTable = PriceTable {
    agency: PriceEntry {
        price_per_unit: dec!(100.00),
        currency: "USD",
    },
    freelancer: PriceEntry {
        price_per_unit: dec!(50.00),
        currency: "USD",
    },
};

impl PriceTable {
    /// Price table configured for the given purchase flow.
    pub fn for_purchase(kind: PurchaseKind) -> &'static PriceTable {
        match kind {
            PurchaseKind::Awards => &AWARDS_PRICES,
            PurchaseKind::Masterclass => &MASTERCLASS_PRICES,
        }
    }

    pub fn entry(&self, kind: ApplicantKind) -> &PriceEntry {
        match kind {
            ApplicantKind::Agency => &self.agency,
            ApplicantKind::Freelancer => &self.freelancer,
        }
    }
}

/// Derived totals for a selection. Recomputed on every read, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PricingResult {
    pub unit_count: usize,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub discount_rate: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub currency: &'static str,
}

impl PricingResult {
    /// Total expressed in the smallest currency unit (`total × 100`).
    ///
    /// Returns `None` only when the amount does not fit into `i64`.
    pub fn amount_minor_units(&self) -> Option<i64> {
        let mut scaled = round_currency(self.total);
        scaled.rescale(CURRENCY_SCALE);
        i64::try_from(scaled.mantissa()).ok()
    }

    /// Whether the multi-unit discount was applied.
    pub fn is_discounted(&self) -> bool {
        !self.discount_amount.is_zero()
    }
}

/// Prices a selection for the given applicant kind.
///
/// An empty selection is a valid state and yields zero amounts; blocking its
/// submission is the caller's job. The discount is a step function: it applies
/// from [`DISCOUNT_MIN_UNITS`] units upwards and never to a single unit.
pub fn compute_total(
    kind: ApplicantKind,
    selection: &SelectionSet,
    table: &PriceTable,
) -> PricingResult {
    let entry = table.entry(kind);
    let unit_count = selection.len();

    let subtotal = round_currency(entry.price_per_unit * Decimal::from(unit_count as u64));

    let discount_rate = if unit_count >= DISCOUNT_MIN_UNITS {
        DISCOUNT_RATE
    } else {
        Decimal::ZERO
    };
    let discount_amount = round_currency(subtotal * discount_rate);
    let total = subtotal - discount_amount;

    PricingResult {
        unit_count,
        unit_price: entry.price_per_unit,
        subtotal,
        discount_rate,
        discount_amount,
        total,
        currency: entry.currency,
    }
}

/// Rounds to cents, half away from zero.
pub fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Multi-unit discount as a percentage, e.g. `25`.
pub fn discount_percent() -> Decimal {
    (DISCOUNT_RATE * Decimal::ONE_HUNDRED).normalize()
}
