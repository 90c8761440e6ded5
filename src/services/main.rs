use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::catalog::{CatalogItem, PurchaseKind};
use crate::domain::pricing::{DISCOUNT_MIN_UNITS, DISCOUNT_RATE, PriceTable, discount_percent};

/// One paid flow as listed on the index page.
#[derive(Debug, Serialize)]
pub struct OfferSummary {
    pub kind: PurchaseKind,
    pub prices: &'static PriceTable,
    pub catalog: &'static [CatalogItem],
}

/// Data required to render the main index template.
#[derive(Debug, Serialize)]
pub struct IndexPageData {
    pub offers: Vec<OfferSummary>,
    /// Discount applied from `discount_min_units` selected units.
    pub discount_rate: Decimal,
    /// `discount_rate` as a whole percentage, for display.
    pub discount_percent: Decimal,
    pub discount_min_units: usize,
}

/// Loads the offers shown on the index page.
pub fn load_index_page() -> IndexPageData {
    let offers = PurchaseKind::ALL
        .into_iter()
        .map(|kind| OfferSummary {
            kind,
            prices: PriceTable::for_purchase(kind),
            catalog: kind.catalog(),
        })
        .collect();

    IndexPageData {
        offers,
        discount_rate: DISCOUNT_RATE,
        discount_percent: discount_percent(),
        discount_min_units: DISCOUNT_MIN_UNITS,
    }
}
