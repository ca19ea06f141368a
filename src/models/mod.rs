use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Whether the property is offered for sale or for rent
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    Sale,
    Rent,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Sale => "sale",
            ListingKind::Rent => "rent",
        }
    }
}

impl fmt::Display for ListingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListingKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sale" => Ok(ListingKind::Sale),
            "rent" => Ok(ListingKind::Rent),
            other => Err(format!("unknown listing kind '{other}' (expected sale or rent)")),
        }
    }
}

/// How the property can be reached
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    Vehicle,
    NarrowWay,
    #[default]
    Unspecified,
}

impl Accessibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accessibility::Vehicle => "vehicle",
            Accessibility::NarrowWay => "narrow_way",
            Accessibility::Unspecified => "unspecified",
        }
    }
}

/// Amenity tags a listing can carry. The vocabulary is closed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Feature {
    #[serde(rename = "Attached Washroom")]
    AttachedWashroom,
    #[serde(rename = "Garden")]
    Garden,
    #[serde(rename = "Balcony")]
    Balcony,
    #[serde(rename = "Swimming Pool")]
    SwimmingPool,
    #[serde(rename = "Gym Access")]
    GymAccess,
    #[serde(rename = "Pet Friendly")]
    PetFriendly,
    #[serde(rename = "Furnished")]
    Furnished,
    #[serde(rename = "Air Conditioning")]
    AirConditioning,
    #[serde(rename = "Security System")]
    SecuritySystem,
    #[serde(rename = "Parking")]
    Parking,
}

impl Feature {
    pub const ALL: [Feature; 10] = [
        Feature::AttachedWashroom,
        Feature::Garden,
        Feature::Balcony,
        Feature::SwimmingPool,
        Feature::GymAccess,
        Feature::PetFriendly,
        Feature::Furnished,
        Feature::AirConditioning,
        Feature::SecuritySystem,
        Feature::Parking,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::AttachedWashroom => "Attached Washroom",
            Feature::Garden => "Garden",
            Feature::Balcony => "Balcony",
            Feature::SwimmingPool => "Swimming Pool",
            Feature::GymAccess => "Gym Access",
            Feature::PetFriendly => "Pet Friendly",
            Feature::Furnished => "Furnished",
            Feature::AirConditioning => "Air Conditioning",
            Feature::SecuritySystem => "Security System",
            Feature::Parking => "Parking",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Feature::ALL
            .iter()
            .copied()
            .find(|f| f.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown feature '{wanted}'"))
    }
}

/// Latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Finite and within [-90, 90] x [-180, 180].
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// Utility hookups available at the property
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Utilities {
    pub water: bool,
    pub electricity: bool,
}

/// Core listing data model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ListingKind,
    pub price: f64,
    pub address: String,
    #[serde(default)]
    pub image_url: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub negotiable: bool,
    #[serde(default)]
    pub accessibility: Accessibility,
    #[serde(default)]
    pub utilities: Utilities,
    #[serde(default)]
    pub garage: bool,
    #[serde(default)]
    pub features: BTreeSet<Feature>,
}

impl Listing {
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Price as shown on cards and map markers: `$750,000` or `$2,200/mo`.
    pub fn price_label(&self) -> String {
        let amount = group_thousands(self.price.round().max(0.0) as u64);
        match self.kind {
            ListingKind::Sale => format!("${amount}"),
            ListingKind::Rent => format!("${amount}/mo"),
        }
    }
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Metadata recorded when an upload passes validation and is submitted
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSubmission {
    pub listing: Listing,
    pub validated_address: String,
    pub video_clip: Option<String>,
    pub submitted_at: DateTime<Utc>,
}
