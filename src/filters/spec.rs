use crate::models::{Accessibility, Feature, ListingKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Listing kind selector of the filter sheet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum KindSelector {
    #[default]
    Any,
    Sale,
    Rent,
}

impl KindSelector {
    pub fn admits(&self, kind: ListingKind) -> bool {
        match self {
            KindSelector::Any => true,
            KindSelector::Sale => kind == ListingKind::Sale,
            KindSelector::Rent => kind == ListingKind::Rent,
        }
    }
}

impl From<ListingKind> for KindSelector {
    fn from(kind: ListingKind) -> Self {
        match kind {
            ListingKind::Sale => KindSelector::Sale,
            ListingKind::Rent => KindSelector::Rent,
        }
    }
}

/// Accessibility selector of the filter sheet
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccessSelector {
    #[default]
    Any,
    Vehicle,
    NarrowWay,
}

impl AccessSelector {
    pub fn admits(&self, accessibility: Accessibility) -> bool {
        match self {
            AccessSelector::Any => true,
            AccessSelector::Vehicle => accessibility == Accessibility::Vehicle,
            AccessSelector::NarrowWay => accessibility == Accessibility::NarrowWay,
        }
    }
}

/// Constraints chosen in the filter sheet.
///
/// Numeric bounds keep the raw text the user typed. Empty or unparseable
/// text means "no constraint", never zero.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSpec {
    /// Minimum price
    pub min_price: String,
    /// Maximum price
    pub max_price: String,
    pub listing_type: KindSelector,
    /// Minimum number of bedrooms
    pub bedrooms: String,
    /// Minimum number of bathrooms
    pub bathrooms: String,
    pub garage: bool,
    pub negotiable: bool,
    pub accessibility: AccessSelector,
    pub water: bool,
    pub electricity: bool,
    /// Listing must carry every one of these
    pub selected_features: BTreeSet<Feature>,
    /// Case-insensitive substring of the address
    pub location: String,
}

impl FilterSpec {
    pub fn min_price_bound(&self) -> Option<f64> {
        parse_amount(&self.min_price)
    }

    pub fn max_price_bound(&self) -> Option<f64> {
        parse_amount(&self.max_price)
    }

    pub fn min_bedrooms(&self) -> Option<i64> {
        parse_count(&self.bedrooms)
    }

    pub fn min_bathrooms(&self) -> Option<i64> {
        parse_count(&self.bathrooms)
    }

    pub fn location_term(&self) -> Option<&str> {
        let term = self.location.trim();
        (!term.is_empty()).then_some(term)
    }

    /// True when no predicate would exclude anything.
    pub fn is_empty(&self) -> bool {
        self.min_price_bound().is_none()
            && self.max_price_bound().is_none()
            && self.listing_type == KindSelector::Any
            && self.min_bedrooms().is_none()
            && self.min_bathrooms().is_none()
            && !self.garage
            && !self.negotiable
            && self.accessibility == AccessSelector::Any
            && !self.water
            && !self.electricity
            && self.selected_features.is_empty()
            && self.location_term().is_none()
    }
}

/// Whole-field parse: "12abc" is not a number, so the bound stays unset.
fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Whole count; a fractional entry is truncated ("2.5" asks for 2).
fn parse_count(raw: &str) -> Option<i64> {
    parse_amount(raw).map(|v| v.trunc() as i64)
}
