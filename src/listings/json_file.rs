use crate::listings::traits::ListingSource;
use crate::models::Listing;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{info, warn};

/// Catalog backed by a JSON array of listings on disk
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse a JSON array of listings.
    pub fn parse(json: &str) -> Result<Vec<Listing>> {
        let listings: Vec<Listing> =
            serde_json::from_str(json).context("Listings file is not a valid listing array")?;

        for listing in listings.iter().filter(|l| !l.coordinates.is_valid()) {
            warn!(
                id = %listing.id,
                lat = listing.coordinates.lat,
                lng = listing.coordinates.lng,
                "Listing has out-of-range coordinates; its distance will be unknown"
            );
        }

        Ok(listings)
    }
}

#[async_trait]
impl ListingSource for JsonFileCatalog {
    async fn fetch(&self) -> Result<Vec<Listing>> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read listings from {}", self.path.display()))?;

        let listings = Self::parse(&json)?;
        info!("Loaded {} listings from {}", listings.len(), self.path.display());
        Ok(listings)
    }

    fn source_name(&self) -> &'static str {
        "json-file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::PlaceholderCatalog;

    #[test]
    fn test_parse_round_trips_catalog() {
        let json = serde_json::to_string(&PlaceholderCatalog::listings()).unwrap();
        let parsed = JsonFileCatalog::parse(&json).unwrap();
        assert_eq!(parsed, PlaceholderCatalog::listings());
    }

    #[test]
    fn test_parse_rejects_unknown_feature() {
        let json = r#"[{
            "id": "x", "title": "t", "type": "sale", "price": 1, "address": "a",
            "bedrooms": 1, "bathrooms": 1, "area": 1,
            "coordinates": { "lat": 0, "lng": 0 },
            "features": ["Helipad"]
        }]"#;
        assert!(JsonFileCatalog::parse(json).is_err());
    }

    #[tokio::test]
    async fn test_fetch_missing_file_errors() {
        let catalog = JsonFileCatalog::new("/nonexistent/listings.json");
        let err = catalog.fetch().await.unwrap_err();
        assert!(err.to_string().contains("Failed to read listings"));
    }
}
