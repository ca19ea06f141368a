use anyhow::{anyhow, Result};
use async_trait::async_trait;
use property_scout::models::{Coordinates, ListingKind};
use property_scout::validation::upload::ListingDraft;
use property_scout::validation::{
    AiClient, FailureClass, Geocoder, LocationValidator, PhotoData, ReasoningModel,
    ReasoningPrompt, SubmitError, UploadForm, ValidationState,
};
use std::sync::Arc;

const PHOTO: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRgABAQAAAQABAAD/2wBDAA==";
const LA: Coordinates = Coordinates::new(34.05, -118.24);

struct MainStreetGeocoder;

#[async_trait]
impl Geocoder for MainStreetGeocoder {
    async fn formatted_address(&self, _at: Coordinates) -> Result<String> {
        Ok("123 Main St".to_string())
    }

    fn provider_name(&self) -> &'static str {
        "test"
    }
}

/// Calls the geocoding tool like a real model would, then answers.
struct ToolUsingModel;

#[async_trait]
impl ReasoningModel for ToolUsingModel {
    async fn generate(&self, prompt: &ReasoningPrompt) -> Result<Option<String>> {
        let tool = prompt
            .tool("getFormattedAddress")
            .ok_or_else(|| anyhow!("tool missing"))?;
        let address = tool
            .call_json(serde_json::json!({ "latitude": 34.05, "longitude": -118.24 }))
            .await?;
        Ok(Some(format!(
            r#"{{"isValidLocation": true, "formattedAddress": {address}}}"#
        )))
    }

    fn model_name(&self) -> &str {
        "tool-using"
    }
}

struct RejectingKeyModel;

#[async_trait]
impl ReasoningModel for RejectingKeyModel {
    async fn generate(&self, _prompt: &ReasoningPrompt) -> Result<Option<String>> {
        Err(anyhow!(
            "Gemini API error (400 Bad Request): {{\"error\": {{\"status\": \"INVALID_ARGUMENT\", \"reason\": \"API_KEY_INVALID\"}}}}"
        ))
    }

    fn model_name(&self) -> &str {
        "rejecting"
    }
}

fn form() -> UploadForm {
    let mut form = UploadForm::new();
    form.draft = ListingDraft {
        title: "Downtown Loft".to_string(),
        description: "Open-plan loft with exposed brick and city views.".to_string(),
        price: 3200.0,
        kind: Some(ListingKind::Rent),
        address: "123 Main St, Los Angeles, CA".to_string(),
        bedrooms: 1,
        bathrooms: 1,
        area: 850.0,
        ..Default::default()
    };
    form.set_photo(PhotoData::from_data_uri(PHOTO).unwrap());
    form.set_coordinates(LA);
    form
}

#[tokio::test]
async fn valid_location_allows_submission() {
    let validator = LocationValidator::new(
        Arc::new(MainStreetGeocoder),
        AiClient::available(ToolUsingModel),
    );
    let mut form = form();

    let result = form.validate_with(&validator).await.unwrap();
    assert!(result.is_valid_location);
    assert_eq!(result.formatted_address, "123 Main St");
    assert!(form.can_submit());

    let submission = form.submit().unwrap();
    assert_eq!(submission.validated_address, "123 Main St");
    assert_eq!(submission.listing.kind, ListingKind::Rent);
}

#[tokio::test]
async fn invalid_api_key_blocks_submission() {
    let validator = LocationValidator::new(
        Arc::new(MainStreetGeocoder),
        AiClient::available(RejectingKeyModel),
    );
    let mut form = form();

    let result = form.validate_with(&validator).await.unwrap();
    assert!(!result.is_valid_location);
    assert!(result.formatted_address.contains("API key"));
    assert!(matches!(form.state(), ValidationState::Invalid(_)));
    assert_eq!(form.submit().unwrap_err(), SubmitError::LocationNotValidated);

    let (_, input) = form.begin_validation().unwrap();
    let err = validator.check(&input).await.unwrap_err();
    assert_eq!(err.class(), Some(FailureClass::AuthOrQuota));
}

#[tokio::test]
async fn changing_photo_requires_revalidation() {
    let validator = LocationValidator::new(
        Arc::new(MainStreetGeocoder),
        AiClient::available(ToolUsingModel),
    );
    let mut form = form();
    form.validate_with(&validator).await.unwrap();
    assert!(form.can_submit());

    form.set_photo(PhotoData::from_bytes("image/png", b"different photo"));
    assert_eq!(form.state(), &ValidationState::Idle);
    assert_eq!(form.submit().unwrap_err(), SubmitError::LocationNotValidated);

    form.validate_with(&validator).await.unwrap();
    assert!(form.submit().is_ok());
}
