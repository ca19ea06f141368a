//! Evaluates a listing against the search box and the filter sheet.
//!
//! Every active predicate must pass. An empty search term together with an
//! empty [`FilterSpec`] excludes nothing.

use crate::filters::spec::FilterSpec;
use crate::models::Listing;

/// Whether `listing` passes the search term and every active filter.
pub fn matches(listing: &Listing, filters: &FilterSpec, search_term: &str) -> bool {
    matches_search(listing, search_term)
        && within_price(listing, filters)
        && filters.listing_type.admits(listing.kind)
        && meets_room_minimums(listing, filters)
        && has_required_flags(listing, filters)
        && filters.accessibility.admits(listing.accessibility)
        && has_required_features(listing, filters)
        && matches_location(listing, filters)
}

/// Case-insensitive match on title, address or kind; any one suffices.
pub fn matches_search(listing: &Listing, search_term: &str) -> bool {
    let term = search_term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    listing.title.to_lowercase().contains(&term)
        || listing.address.to_lowercase().contains(&term)
        || listing.kind.as_str().contains(&term)
}

fn within_price(listing: &Listing, filters: &FilterSpec) -> bool {
    if let Some(min) = filters.min_price_bound() {
        if listing.price < min {
            return false;
        }
    }
    if let Some(max) = filters.max_price_bound() {
        if listing.price > max {
            return false;
        }
    }
    true
}

fn meets_room_minimums(listing: &Listing, filters: &FilterSpec) -> bool {
    let bedrooms_ok = filters
        .min_bedrooms()
        .map_or(true, |min| i64::from(listing.bedrooms) >= min);
    let bathrooms_ok = filters
        .min_bathrooms()
        .map_or(true, |min| i64::from(listing.bathrooms) >= min);
    bedrooms_ok && bathrooms_ok
}

fn has_required_flags(listing: &Listing, filters: &FilterSpec) -> bool {
    (!filters.garage || listing.garage)
        && (!filters.negotiable || listing.negotiable)
        && (!filters.water || listing.utilities.water)
        && (!filters.electricity || listing.utilities.electricity)
}

fn has_required_features(listing: &Listing, filters: &FilterSpec) -> bool {
    filters.selected_features.is_subset(&listing.features)
}

fn matches_location(listing: &Listing, filters: &FilterSpec) -> bool {
    match filters.location_term() {
        Some(term) => listing.address.to_lowercase().contains(&term.to_lowercase()),
        None => true,
    }
}
