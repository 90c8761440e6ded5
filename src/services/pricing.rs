use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::catalog::{CatalogItem, PurchaseKind};
use crate::domain::pricing::{
    DISCOUNT_MIN_UNITS, DISCOUNT_RATE, PriceTable, PricingResult, compute_total, discount_percent,
};
use crate::domain::selection::SelectionSet;
use crate::forms::checkout::{QuoteRequest, select_units};
use crate::services::{ServiceError, ServiceResult};

/// Data required to render a checkout form.
#[derive(Debug, Serialize)]
pub struct CheckoutPageData {
    pub kind: PurchaseKind,
    pub catalog: &'static [CatalogItem],
    pub prices: &'static PriceTable,
    pub discount_rate: Decimal,
    pub discount_percent: Decimal,
    pub discount_min_units: usize,
}

/// Selection echoed back with its current price.
#[derive(Debug, Serialize)]
pub struct Quote {
    pub units: SelectionSet,
    pub pricing: PricingResult,
}

/// Loads the catalog and price table for a checkout form.
pub fn load_checkout_page(kind: PurchaseKind) -> CheckoutPageData {
    CheckoutPageData {
        kind,
        catalog: kind.catalog(),
        prices: PriceTable::for_purchase(kind),
        discount_rate: DISCOUNT_RATE,
        discount_percent: discount_percent(),
        discount_min_units: DISCOUNT_MIN_UNITS,
    }
}

/// Prices the selection held by the requesting form, after an optional toggle.
///
/// The selection belongs to the caller; nothing is kept between requests.
pub fn quote(request: QuoteRequest) -> ServiceResult<Quote> {
    let kind = request.kind;

    let mut units = select_units(kind, request.units)
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if let Some(toggle) = request.toggle.as_deref().map(str::trim) {
        match kind.find_unit(toggle) {
            Some(item) => {
                units.toggle(item.id);
            }
            None => {
                return Err(ServiceError::Form(format!(
                    "`{toggle}` is not available for {kind}"
                )));
            }
        }
    }

    let pricing = compute_total(request.applicant_kind, &units, PriceTable::for_purchase(kind));

    Ok(Quote { units, pricing })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use crate::domain::pricing::ApplicantKind;

    fn request(units: &[&str], toggle: Option<&str>) -> QuoteRequest {
        QuoteRequest {
            kind: PurchaseKind::Awards,
            applicant_kind: ApplicantKind::Agency,
            units: units.iter().map(|unit| unit.to_string()).collect(),
            toggle: toggle.map(str::to_string),
        }
    }

    #[test]
    fn empty_selection_quotes_zero() {
        let quote = quote(request(&[], None)).expect("expected quote");

        assert!(quote.units.is_empty());
        assert_eq!(quote.pricing.total, Decimal::ZERO);
    }

    #[test]
    fn toggle_adds_unit_and_applies_discount() {
        let quote = quote(request(&["film-craft"], Some("social-impact"))).expect("expected quote");

        assert_eq!(quote.units.len(), 2);
        assert_eq!(quote.pricing.subtotal, dec!(400));
        assert_eq!(quote.pricing.total, dec!(300));
    }

    #[test]
    fn toggle_removes_selected_unit() {
        let quote =
            quote(request(&["film-craft", "social-impact"], Some("film-craft"))).expect("quote");

        assert_eq!(quote.units.len(), 1);
        assert!(!quote.pricing.is_discounted());
    }

    #[test]
    fn unknown_toggle_is_a_form_error() {
        let result = quote(request(&[], Some("brand-strategy")));

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn checkout_page_exposes_price_table() {
        let data = load_checkout_page(PurchaseKind::Masterclass);

        assert_eq!(data.catalog, PurchaseKind::Masterclass.catalog());
        assert_eq!(data.prices.freelancer.price_per_unit, dec!(50));
    }
}
