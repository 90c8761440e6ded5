use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Paid flows offered by the network.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseKind {
    /// Entry into one or more award categories.
    Awards,
    /// Seats in one or more masterclass sessions.
    Masterclass,
}

/// Single selectable unit of a purchase: an award category or a masterclass session.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct CatalogItem {
    /// Stable identifier submitted by the checkout form.
    pub id: &'static str,
    /// Human-readable title shown next to the checkbox.
    pub title: &'static str,
}

const AWARD_CATEGORIES: &[CatalogItem] = &[
    CatalogItem {
        id: "agency-of-the-year",
        title: "Agency of the Year",
    },
    CatalogItem {
        id: "brand-campaign",
        title: "Brand Campaign of the Year",
    },
    CatalogItem {
        id: "digital-innovation",
        title: "Digital Innovation",
    },
    CatalogItem {
        id: "social-impact",
        title: "Social Impact Campaign",
    },
    CatalogItem {
        id: "film-craft",
        title: "Film & Motion Craft",
    },
    CatalogItem {
        id: "public-relations",
        title: "Public Relations Campaign",
    },
    CatalogItem {
        id: "integrated-marketing",
        title: "Integrated Marketing",
    },
    CatalogItem {
        id: "young-creative",
        title: "Young Creative of the Year",
    },
];

const MASTERCLASS_SESSIONS: &[CatalogItem] = &[
    CatalogItem {
        id: "brand-strategy",
        title: "Brand Strategy for African Markets",
    },
    CatalogItem {
        id: "creative-direction",
        title: "Creative Direction",
    },
    CatalogItem {
        id: "performance-marketing",
        title: "Performance Marketing",
    },
    CatalogItem {
        id: "new-business-pitching",
        title: "Pitching for New Business",
    },
];

impl PurchaseKind {
    /// Every purchase kind, in display order.
    pub const ALL: [PurchaseKind; 2] = [PurchaseKind::Awards, PurchaseKind::Masterclass];

    /// Identifier used in URLs and result-page query strings.
    pub fn as_str(self) -> &'static str {
        match self {
            PurchaseKind::Awards => "awards",
            PurchaseKind::Masterclass => "masterclass",
        }
    }

    /// Prefix of checkout references generated for this kind.
    pub fn reference_prefix(self) -> &'static str {
        match self {
            PurchaseKind::Awards => "AWD",
            PurchaseKind::Masterclass => "MCL",
        }
    }

    /// Units a buyer may select for this kind.
    pub fn catalog(self) -> &'static [CatalogItem] {
        match self {
            PurchaseKind::Awards => AWARD_CATEGORIES,
            PurchaseKind::Masterclass => MASTERCLASS_SESSIONS,
        }
    }

    /// Looks up a unit of this kind's catalog by identifier.
    pub fn find_unit(self, id: &str) -> Option<&'static CatalogItem> {
        self.catalog().iter().find(|item| item.id == id)
    }
}

impl fmt::Display for PurchaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown purchase kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown purchase kind `{0}`")]
pub struct UnknownPurchaseKind(pub String);

impl FromStr for PurchaseKind {
    type Err = UnknownPurchaseKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "awards" => Ok(PurchaseKind::Awards),
            "masterclass" => Ok(PurchaseKind::Masterclass),
            _ => Err(UnknownPurchaseKind(s.to_string())),
        }
    }
}
