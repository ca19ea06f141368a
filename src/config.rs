//! Runtime configuration from the environment (and an optional `.env`).

use crate::validation::{
    gemini, AiClient, GeminiModel, Geocoder, GoogleGeocoder, LocationValidator, PlaceholderGeocoder,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub google_api_key: Option<String>,
    pub maps_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: Option<String>,
    pub geocoding_base_url: Option<String>,
    pub http_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        // A missing .env is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let google_api_key = lookup("GOOGLE_API_KEY").and_then(real_value);
        let maps_api_key = lookup("MAPS_API_KEY")
            .and_then(real_value)
            .or_else(|| google_api_key.clone());

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    warn!(value = %raw, "Ignoring invalid HTTP_TIMEOUT_SECS");
                    Duration::from_secs(DEFAULT_TIMEOUT_SECS)
                }
            },
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        Self {
            google_api_key,
            maps_api_key,
            gemini_model: lookup("GEMINI_MODEL")
                .and_then(real_value)
                .unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            gemini_base_url: lookup("GEMINI_BASE_URL").and_then(real_value),
            geocoding_base_url: lookup("GEOCODING_BASE_URL").and_then(real_value),
            http_timeout,
        }
    }

    pub fn geocoder(&self) -> Arc<dyn Geocoder> {
        let Some(key) = &self.maps_api_key else {
            warn!("MAPS_API_KEY not set; using placeholder addresses");
            return Arc::new(PlaceholderGeocoder);
        };

        match GoogleGeocoder::new(key, self.http_timeout) {
            Ok(geocoder) => match &self.geocoding_base_url {
                Some(url) => Arc::new(geocoder.with_base_url(url)),
                None => Arc::new(geocoder),
            },
            Err(e) => {
                error!(error = %e, "Failed to set up geocoder; using placeholder addresses");
                Arc::new(PlaceholderGeocoder)
            }
        }
    }

    pub fn ai_client(&self) -> AiClient {
        let Some(key) = &self.google_api_key else {
            warn!("GOOGLE_API_KEY not set; AI location validation is unavailable");
            return AiClient::unavailable("GOOGLE_API_KEY is not set");
        };

        match GeminiModel::new(key, &self.gemini_model, self.http_timeout) {
            Ok(model) => {
                info!(model = %self.gemini_model, "AI client initialized");
                match &self.gemini_base_url {
                    Some(url) => AiClient::available(model.with_base_url(url)),
                    None => AiClient::available(model),
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to initialize AI client");
                AiClient::unavailable(format!("AI client setup failed: {e}"))
            }
        }
    }

    pub fn location_validator(&self) -> LocationValidator {
        LocationValidator::new(self.geocoder(), self.ai_client())
    }
}

/// Empty strings and template placeholders count as unset.
fn real_value(raw: String) -> Option<String> {
    let value = raw.trim();
    if value.is_empty() || (value.starts_with("YOUR_") && value.ends_with("_HERE")) {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[]);
        assert_eq!(c.google_api_key, None);
        assert_eq!(c.maps_api_key, None);
        assert_eq!(c.gemini_model, "gemini-1.5-flash");
        assert_eq!(c.http_timeout, Duration::from_secs(30));
        assert!(!c.ai_client().is_available());
    }

    #[test]
    fn test_placeholder_keys_are_unset() {
        let c = config(&[
            ("GOOGLE_API_KEY", "YOUR_GOOGLE_API_KEY_HERE"),
            ("MAPS_API_KEY", "  "),
        ]);
        assert_eq!(c.google_api_key, None);
        assert_eq!(c.maps_api_key, None);
    }

    #[test]
    fn test_maps_key_falls_back_to_google_key() {
        let c = config(&[("GOOGLE_API_KEY", "AIza-test")]);
        assert_eq!(c.maps_api_key.as_deref(), Some("AIza-test"));

        let c = config(&[("GOOGLE_API_KEY", "AIza-test"), ("MAPS_API_KEY", "AIza-maps")]);
        assert_eq!(c.maps_api_key.as_deref(), Some("AIza-maps"));
    }

    #[test]
    fn test_invalid_timeout_uses_default() {
        assert_eq!(config(&[("HTTP_TIMEOUT_SECS", "abc")]).http_timeout, Duration::from_secs(30));
        assert_eq!(config(&[("HTTP_TIMEOUT_SECS", "0")]).http_timeout, Duration::from_secs(30));
        assert_eq!(config(&[("HTTP_TIMEOUT_SECS", "5")]).http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_key_makes_client_available() {
        let c = config(&[("GOOGLE_API_KEY", "AIza-test"), ("GEMINI_MODEL", "gemini-2.0-flash")]);
        assert!(c.ai_client().is_available());
        assert_eq!(c.geocoder().provider_name(), "google-maps");
        assert!(c.location_validator().is_available());
    }
}
