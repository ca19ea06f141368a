//! Checks that an uploaded photo plausibly shows the place at its coordinates.
//!
//! Each run geocodes the coordinates, then asks the reasoning model to judge
//! the photo against that address. Nothing is cached. Every failure ends as
//! an invalid [`ValidationResult`] carrying a readable message.

pub mod errors;
pub mod gemini;
pub mod geocoding;
pub mod photo;
pub mod reasoning;
pub mod upload;

pub use errors::{classify_failure, FailureClass, ValidationError};
pub use gemini::GeminiModel;
pub use geocoding::{Geocoder, GoogleGeocoder, PlaceholderGeocoder};
pub use photo::PhotoData;
pub use reasoning::{AiClient, GeocodeTool, ReasoningModel, ReasoningPrompt, Tool};
pub use upload::{SubmitError, UploadForm, ValidationState, ValidationTicket};

use crate::models::Coordinates;
use reasoning::strip_code_blocks;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// What the caller hands over for one check
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationInput {
    /// `data:image/<type>;base64,<payload>`
    pub photo_data_uri: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl ValidationInput {
    pub fn new(photo_data_uri: impl Into<String>, coordinates: Coordinates) -> Self {
        Self {
            photo_data_uri: Some(photo_data_uri.into()),
            coordinates: Some(coordinates),
        }
    }

    /// Presence first, then format. No external call happens before this.
    fn require(&self) -> Result<(PhotoData, Coordinates), ValidationError> {
        let uri = self
            .photo_data_uri
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ValidationError::MissingInput)?;
        let coords = self.coordinates.ok_or(ValidationError::MissingInput)?;

        let photo = PhotoData::from_data_uri(uri)?;
        if !coords.is_valid() {
            return Err(ValidationError::InvalidInputFormat(format!(
                "coordinates out of range: {}, {}",
                coords.lat, coords.lng
            )));
        }
        Ok((photo, coords))
    }
}

/// Verdict plus the address, or an error message in its place
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid_location: bool,
    pub formatted_address: String,
}

impl ValidationResult {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            is_valid_location: false,
            formatted_address: message.into(),
        }
    }
}

impl From<&ValidationError> for ValidationResult {
    fn from(err: &ValidationError) -> Self {
        ValidationResult::invalid(err.user_message())
    }
}

/// Parse the model's final answer; `None` when it is not the expected shape.
fn parse_verdict(text: Option<&str>) -> Option<ValidationResult> {
    let text = text?;
    serde_json::from_str(strip_code_blocks(text)).ok()
}

fn instructions(at: Coordinates, address: &str) -> String {
    format!(
        "You are an expert real estate assistant. A seller uploaded the attached photo of a property \
         located at latitude {lat}, longitude {lng}.\n\
         The geocoded address for these coordinates is: {address}\n\
         You may use the {tool} tool to look up the address again.\n\
         Based on the photo and the formatted address, decide whether the photographed scene is \
         plausible for that address.\n\
         Reply with only a JSON object in the following format:\n\
         {{\"isValidLocation\": true or false, \"formattedAddress\": \"the formatted address\"}}",
        lat = at.lat,
        lng = at.lng,
        tool = GeocodeTool::NAME,
    )
}

/// The location check, wired to its providers at startup
pub struct LocationValidator {
    geocoder: Arc<dyn Geocoder>,
    ai: AiClient,
}

impl LocationValidator {
    pub fn new(geocoder: Arc<dyn Geocoder>, ai: AiClient) -> Self {
        Self { geocoder, ai }
    }

    pub fn is_available(&self) -> bool {
        self.ai.is_available()
    }

    /// Run the check. Never fails; errors come back as invalid results.
    pub async fn validate(&self, input: &ValidationInput) -> ValidationResult {
        match self.check(input).await {
            Ok(result) => result,
            Err(err) => {
                warn!(error = %err, class = ?err.class(), "Location validation failed");
                ValidationResult::from(&err)
            }
        }
    }

    /// Same as [`validate`](Self::validate) but keeps the typed error.
    pub async fn check(&self, input: &ValidationInput) -> Result<ValidationResult, ValidationError> {
        let (photo, at) = input.require()?;

        let model = match &self.ai {
            AiClient::Available(model) => model.clone(),
            AiClient::Unavailable { reason } => {
                return Err(ValidationError::Unavailable(reason.clone()))
            }
        };

        info!(lat = at.lat, lng = at.lng, geocoder = self.geocoder.provider_name(), "Validating location");

        let address = self
            .geocoder
            .formatted_address(at)
            .await
            .map_err(|e| ValidationError::from_provider(&e))?;

        let prompt = ReasoningPrompt {
            instructions: instructions(at, &address),
            photo,
            tools: vec![Arc::new(GeocodeTool::new(self.geocoder.clone()))],
        };

        let answer = model
            .generate(&prompt)
            .await
            .map_err(|e| ValidationError::from_provider(&e))?;

        let result = parse_verdict(answer.as_deref()).ok_or(ValidationError::NoStructuredOutput)?;

        info!(
            valid = result.is_valid_location,
            address = %result.formatted_address,
            model = model.model_name(),
            "Location validation finished"
        );
        Ok(result)
    }
}
