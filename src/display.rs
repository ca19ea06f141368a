//! Builds the ordered list of listings shown on the home page.
//!
//! Filtering keeps catalog order. When the viewer location is resolved the
//! survivors are stable-sorted by distance, unknown distances last. The
//! result is a pure function of the inputs.

use crate::filters::{matches, FilterSpec};
use crate::geo;
use crate::geolocation::{LocationStatus, ViewerLocation};
use crate::models::{Coordinates, Listing};
use serde::Serialize;
use std::cmp::Ordering;
use tracing::debug;

/// Map center when there is nothing better to show (continental US).
pub const DEFAULT_CENTER: Coordinates = Coordinates::new(39.8283, -98.5795);
pub const DEFAULT_ZOOM: u8 = 4;
const RESULTS_ZOOM: u8 = 10;
const SELECTED_ZOOM: u8 = 14;

#[derive(Debug, Clone, Serialize)]
pub struct DisplayEntry {
    pub listing: Listing,
    /// Kilometers from the viewer; `None` when not sorted or unknown.
    pub distance_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DisplayList {
    pub entries: Vec<DisplayEntry>,
    pub status: LocationStatus,
    pub viewer: Option<Coordinates>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapMarker {
    pub id: String,
    pub title: String,
    pub position: Coordinates,
    pub price_label: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
    pub markers: Vec<MapMarker>,
}

pub fn compute_display_list(
    all_listings: &[Listing],
    filters: &FilterSpec,
    search_term: &str,
    viewer: &ViewerLocation,
) -> DisplayList {
    let mut entries: Vec<DisplayEntry> = all_listings
        .iter()
        .filter(|l| matches(l, filters, search_term))
        .map(|l| DisplayEntry {
            listing: l.clone(),
            distance_km: None,
        })
        .collect();

    let origin = viewer.coordinates();
    if let Some(origin) = origin {
        for entry in &mut entries {
            entry.distance_km = geo::known_distance_km(origin, entry.listing.coordinates);
        }
        // sort_by is stable, so ties keep catalog order
        entries.sort_by(|a, b| compare_distance(a.distance_km, b.distance_km));
    }

    debug!(
        total = all_listings.len(),
        shown = entries.len(),
        by_distance = origin.is_some(),
        "Computed display list"
    );

    DisplayList {
        entries,
        status: viewer.status(),
        viewer: origin,
    }
}

fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl DisplayList {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn listings(&self) -> impl Iterator<Item = &Listing> {
        self.entries.iter().map(|e| &e.listing)
    }

    /// Markers and camera for the results map.
    pub fn map_view(&self, selected: Option<&str>) -> MapView {
        let markers: Vec<MapMarker> = self
            .listings()
            .filter(|l| l.coordinates.is_valid())
            .map(|l| MapMarker {
                id: l.id.clone(),
                title: l.title.clone(),
                position: l.coordinates,
                price_label: l.price_label(),
            })
            .collect();

        let selected = selected.and_then(|id| markers.iter().find(|m| m.id == id));

        let (center, zoom) = match (selected, self.viewer, markers.first()) {
            (Some(m), _, _) => (m.position, SELECTED_ZOOM),
            (None, Some(viewer), Some(_)) => (viewer, RESULTS_ZOOM),
            (None, None, Some(first)) => (first.position, RESULTS_ZOOM),
            (None, Some(viewer), None) => (viewer, DEFAULT_ZOOM),
            (None, None, None) => (DEFAULT_CENTER, DEFAULT_ZOOM),
        };

        MapView {
            center,
            zoom,
            markers,
        }
    }
}
