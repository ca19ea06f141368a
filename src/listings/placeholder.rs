use crate::listings::traits::ListingSource;
use crate::models::{Accessibility, Coordinates, Feature, Listing, ListingKind, Utilities};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::debug;

/// Built-in in-memory catalog used when no listings file is given
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderCatalog;

#[async_trait]
impl ListingSource for PlaceholderCatalog {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let listings = Self::listings();
        debug!(count = listings.len(), "Loaded placeholder listings");
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "placeholder"
    }
}

impl PlaceholderCatalog {
    pub fn listings() -> Vec<Listing> {
        vec![
            Listing {
                id: "1".to_string(),
                title: "Spacious Modern Villa".to_string(),
                kind: ListingKind::Sale,
                price: 750_000.0,
                address: "123 Sunshine Ave, Miami, FL".to_string(),
                image_url: "https://picsum.photos/400/300?random=1".to_string(),
                bedrooms: 4,
                bathrooms: 3,
                area: 2500.0,
                coordinates: Coordinates::new(25.7617, -80.1918),
                description: "A beautiful and spacious modern villa with a private pool and stunning city views. Perfect for families.".to_string(),
                negotiable: true,
                accessibility: Accessibility::Vehicle,
                utilities: Utilities { water: true, electricity: true },
                garage: true,
                features: BTreeSet::from([
                    Feature::SwimmingPool,
                    Feature::Garden,
                    Feature::AirConditioning,
                    Feature::SecuritySystem,
                    Feature::Parking,
                ]),
            },
            Listing {
                id: "2".to_string(),
                title: "Cozy Downtown Apartment".to_string(),
                kind: ListingKind::Rent,
                price: 2200.0,
                address: "456 Urban St, New York, NY".to_string(),
                image_url: "https://picsum.photos/400/300?random=2".to_string(),
                bedrooms: 2,
                bathrooms: 1,
                area: 900.0,
                coordinates: Coordinates::new(40.7128, -74.0060),
                description: "A cozy apartment in the heart of downtown, close to all amenities and public transport. Ideal for young professionals.".to_string(),
                negotiable: false,
                accessibility: Accessibility::NarrowWay,
                utilities: Utilities { water: true, electricity: true },
                garage: false,
                features: BTreeSet::from([Feature::Furnished, Feature::AirConditioning, Feature::GymAccess]),
            },
            Listing {
                id: "3".to_string(),
                title: "Suburban Family Home".to_string(),
                kind: ListingKind::Sale,
                price: 450_000.0,
                address: "789 Maple Dr, Chicago, IL".to_string(),
                image_url: "https://picsum.photos/400/300?random=3".to_string(),
                bedrooms: 3,
                bathrooms: 2,
                area: 1800.0,
                coordinates: Coordinates::new(41.8781, -87.6298),
                description: "Charming suburban home with a large backyard, perfect for families with children. Quiet neighborhood.".to_string(),
                negotiable: true,
                accessibility: Accessibility::Vehicle,
                utilities: Utilities { water: true, electricity: true },
                garage: true,
                features: BTreeSet::from([Feature::Garden, Feature::PetFriendly, Feature::Parking]),
            },
            Listing {
                id: "4".to_string(),
                title: "Luxury Penthouse Suite".to_string(),
                kind: ListingKind::Rent,
                price: 5500.0,
                address: "101 Sky High Rd, Los Angeles, CA".to_string(),
                image_url: "https://picsum.photos/400/300?random=4".to_string(),
                bedrooms: 3,
                bathrooms: 3,
                area: 2200.0,
                coordinates: Coordinates::new(34.0522, -118.2437),
                description: "Stunning penthouse suite with panoramic views of the city. Includes access to rooftop pool and gym.".to_string(),
                negotiable: false,
                accessibility: Accessibility::Vehicle,
                utilities: Utilities { water: true, electricity: true },
                garage: true,
                features: BTreeSet::from([
                    Feature::AttachedWashroom,
                    Feature::Balcony,
                    Feature::SwimmingPool,
                    Feature::GymAccess,
                    Feature::Furnished,
                    Feature::SecuritySystem,
                ]),
            },
            Listing {
                id: "5".to_string(),
                title: "Beachfront Condo".to_string(),
                kind: ListingKind::Sale,
                price: 1_200_000.0,
                address: "222 Ocean Blvd, San Diego, CA".to_string(),
                image_url: "https://picsum.photos/400/300?random=5".to_string(),
                bedrooms: 2,
                bathrooms: 2,
                area: 1500.0,
                coordinates: Coordinates::new(32.7157, -117.1611),
                description: "Luxurious beachfront condo with direct access to the sand and breathtaking ocean views.".to_string(),
                negotiable: false,
                accessibility: Accessibility::Unspecified,
                utilities: Utilities { water: true, electricity: false },
                garage: false,
                features: BTreeSet::from([Feature::Balcony, Feature::AirConditioning]),
            },
            Listing {
                id: "6".to_string(),
                title: "Chic Studio Loft".to_string(),
                kind: ListingKind::Rent,
                price: 1800.0,
                address: "333 Artist Ln, San Francisco, CA".to_string(),
                image_url: "https://picsum.photos/400/300?random=6".to_string(),
                bedrooms: 1,
                bathrooms: 1,
                area: 750.0,
                coordinates: Coordinates::new(37.7749, -122.4194),
                description: "A stylish studio loft in a vibrant neighborhood, featuring high ceilings and industrial-chic design.".to_string(),
                negotiable: true,
                accessibility: Accessibility::NarrowWay,
                utilities: Utilities { water: false, electricity: true },
                garage: false,
                features: BTreeSet::from([Feature::PetFriendly, Feature::AttachedWashroom]),
            },
        ]
    }
}
