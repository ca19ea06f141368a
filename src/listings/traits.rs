use crate::models::Listing;
use anyhow::Result;
use async_trait::async_trait;

/// Common trait for all listing catalogs
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Load every listing the source holds
    async fn fetch(&self) -> Result<Vec<Listing>>;

    /// Get the name of the listing source
    fn source_name(&self) -> &'static str;
}
