use crate::models::Coordinates;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const GOOGLE_MAPS_API_URL: &str = "https://maps.googleapis.com/maps/api";

/// Reverse geocoding: coordinates to a formatted address
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn formatted_address(&self, at: Coordinates) -> Result<String>;

    fn provider_name(&self) -> &'static str;
}

/// Google Maps Geocoding API
pub struct GoogleGeocoder {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: GOOGLE_MAPS_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Turn the provider envelope into an address or an error carrying its status.
fn address_from_response(body: GeocodeResponse) -> Result<String> {
    match body.status.as_str() {
        "OK" => match body.results.into_iter().next() {
            Some(first) => Ok(first.formatted_address),
            None => bail!("Geocoding returned OK without results"),
        },
        "ZERO_RESULTS" => bail!("Geocoding found no address for these coordinates"),
        status => bail!(
            "Geocoding failed: {} {}",
            status,
            body.error_message.unwrap_or_default()
        ),
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn formatted_address(&self, at: Coordinates) -> Result<String> {
        let url = format!("{}/geocode/json", self.base_url);
        let latlng = format!("{},{}", at.lat, at.lng);

        debug!(%latlng, "Reverse geocoding request");

        let response = self
            .client
            .get(&url)
            .query(&[("latlng", latlng.as_str()), ("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to reach geocoding service")?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            bail!("Geocoding API error ({}): {}", status, text);
        }

        let body: GeocodeResponse = response
            .json()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to decode geocoding response")?;

        address_from_response(body)
    }

    fn provider_name(&self) -> &'static str {
        "google-maps"
    }
}

/// Offline stand-in used when no maps key is configured
pub struct PlaceholderGeocoder;

#[async_trait]
impl Geocoder for PlaceholderGeocoder {
    async fn formatted_address(&self, at: Coordinates) -> Result<String> {
        Ok(format!("Formatted Address for: {}, {}", at.lat, at.lng))
    }

    fn provider_name(&self) -> &'static str {
        "placeholder"
    }
}
