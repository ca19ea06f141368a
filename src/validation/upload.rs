//! Upload form state: the draft, its photo and coordinates, and the latest
//! location verdict that gates submission.

use crate::models::{
    Accessibility, Coordinates, Feature, Listing, ListingKind, ListingSubmission, Utilities,
};
use crate::validation::{LocationValidator, PhotoData, ValidationError, ValidationInput, ValidationResult};
use chrono::Utc;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValidationState {
    #[default]
    Idle,
    Validating,
    Valid(ValidationResult),
    Invalid(ValidationResult),
}

impl ValidationState {
    pub fn result(&self) -> Option<&ValidationResult> {
        match self {
            ValidationState::Valid(r) | ValidationState::Invalid(r) => Some(r),
            _ => None,
        }
    }
}

/// Identifies one validation run; results from an older run are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationTicket(u64);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubmitError {
    #[error("{field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("Please validate the location before submitting.")]
    LocationNotValidated,
    #[error("Location validation is still running.")]
    ValidationInProgress,
}

/// Listing attributes typed into the form
#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub kind: Option<ListingKind>,
    pub address: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub negotiable: bool,
    pub accessibility: Accessibility,
    pub utilities: Utilities,
    pub garage: bool,
    pub features: BTreeSet<Feature>,
    pub video_clip: Option<String>,
}

/// Holds the form while a check runs; cancels it unless settled.
struct InFlight<'a> {
    form: &'a mut UploadForm,
    ticket: ValidationTicket,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, result: ValidationResult) {
        self.settled = true;
        self.form.complete_validation(self.ticket, result);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.form.cancel_validation(self.ticket);
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadForm {
    pub draft: ListingDraft,
    photo: Option<PhotoData>,
    coordinates: Option<Coordinates>,
    state: ValidationState,
    generation: u64,
}

impl UploadForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ValidationState {
        &self.state
    }

    pub fn photo(&self) -> Option<&PhotoData> {
        self.photo.as_ref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// A new photo always voids the previous verdict.
    pub fn set_photo(&mut self, photo: PhotoData) {
        self.photo = Some(photo);
        self.invalidate();
    }

    pub fn clear_photo(&mut self) {
        self.photo = None;
        self.invalidate();
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) {
        if self.coordinates != Some(coordinates) {
            self.coordinates = Some(coordinates);
            self.invalidate();
        }
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        if self.state != ValidationState::Idle {
            debug!("Inputs changed, location must be validated again");
        }
        self.state = ValidationState::Idle;
    }

    /// Enter `Validating`, or fail without touching the state.
    pub fn begin_validation(&mut self) -> Result<(ValidationTicket, ValidationInput), ValidationError> {
        if self.state == ValidationState::Validating {
            return Err(ValidationError::AlreadyValidating);
        }
        let (Some(photo), Some(coordinates)) = (&self.photo, self.coordinates) else {
            return Err(ValidationError::MissingInput);
        };

        let input = ValidationInput::new(photo.to_data_uri(), coordinates);
        self.state = ValidationState::Validating;
        Ok((ValidationTicket(self.generation), input))
    }

    /// Record a finished run. Returns false if the inputs changed meanwhile.
    pub fn complete_validation(&mut self, ticket: ValidationTicket, result: ValidationResult) -> bool {
        if ticket.0 != self.generation || self.state != ValidationState::Validating {
            debug!("Discarding stale validation result");
            return false;
        }
        self.state = if result.is_valid_location {
            ValidationState::Valid(result)
        } else {
            ValidationState::Invalid(result)
        };
        true
    }

    /// Abandon a running check, e.g. after the caller's timeout fired. Any
    /// result later reported for `ticket` is discarded.
    pub fn cancel_validation(&mut self, ticket: ValidationTicket) -> bool {
        if ticket.0 != self.generation || self.state != ValidationState::Validating {
            return false;
        }
        debug!("Location validation abandoned");
        self.generation += 1;
        self.state = ValidationState::Idle;
        true
    }

    /// Run one check against this form. Dropping the future before it
    /// finishes returns the form to `Idle`.
    pub async fn validate_with(
        &mut self,
        validator: &LocationValidator,
    ) -> Result<ValidationResult, ValidationError> {
        let (ticket, input) = self.begin_validation()?;
        let run = InFlight {
            form: self,
            ticket,
            settled: false,
        };
        let result = validator.validate(&input).await;
        run.settle(result.clone());
        Ok(result)
    }

    pub fn can_submit(&self) -> bool {
        matches!(self.state, ValidationState::Valid(_))
    }

    fn check_fields(&self) -> Result<Coordinates, SubmitError> {
        let invalid = |field: &'static str, reason: &str| SubmitError::InvalidField {
            field,
            reason: reason.to_string(),
        };
        let d = &self.draft;

        if d.title.trim().chars().count() < 5 {
            return Err(invalid("title", "Title must be at least 5 characters."));
        }
        if d.description.trim().chars().count() < 20 {
            return Err(invalid("description", "Description must be at least 20 characters."));
        }
        if !(d.price.is_finite() && d.price > 0.0) {
            return Err(invalid("price", "Price must be a positive number."));
        }
        if d.kind.is_none() {
            return Err(invalid("type", "You need to select a property type."));
        }
        if d.address.trim().chars().count() < 5 {
            return Err(invalid("address", "Address is required."));
        }
        let coords = self
            .coordinates
            .ok_or_else(|| invalid("latitude", "Coordinates are required."))?;
        if !(coords.lat.is_finite() && (-90.0..=90.0).contains(&coords.lat)) {
            return Err(invalid("latitude", "Latitude must be between -90 and 90."));
        }
        if !(coords.lng.is_finite() && (-180.0..=180.0).contains(&coords.lng)) {
            return Err(invalid("longitude", "Longitude must be between -180 and 180."));
        }
        if self.photo.is_none() {
            return Err(invalid("photo", "Photo is required."));
        }
        Ok(coords)
    }

    /// Turn the form into a listing. Only allowed while the verdict is valid;
    /// the form is reset afterwards.
    pub fn submit(&mut self) -> Result<ListingSubmission, SubmitError> {
        let coordinates = self.check_fields()?;
        let validated_address = match &self.state {
            ValidationState::Valid(result) => result.formatted_address.clone(),
            ValidationState::Validating => return Err(SubmitError::ValidationInProgress),
            _ => return Err(SubmitError::LocationNotValidated),
        };

        let form = std::mem::take(self);
        let d = form.draft;
        let photo_uri = form.photo.map(|p| p.to_data_uri()).unwrap_or_default();
        let listing = Listing {
            id: Uuid::new_v4().to_string(),
            title: d.title.trim().to_string(),
            kind: d.kind.unwrap_or(ListingKind::Sale),
            price: d.price,
            address: d.address.trim().to_string(),
            image_url: photo_uri,
            bedrooms: d.bedrooms,
            bathrooms: d.bathrooms,
            area: d.area,
            coordinates,
            description: d.description.trim().to_string(),
            negotiable: d.negotiable,
            accessibility: d.accessibility,
            utilities: d.utilities,
            garage: d.garage,
            features: d.features,
        };

        info!(id = %listing.id, title = %listing.title, "Listing submitted");

        Ok(ListingSubmission {
            listing,
            validated_address,
            video_clip: d.video_clip,
            submitted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::testing::{FixedGeocoder, ScriptedModel, PHOTO};
    use crate::validation::AiClient;
    use std::sync::Arc;
    use std::time::Duration;

    const LA: Coordinates = Coordinates::new(34.05, -118.24);

    fn filled_form() -> UploadForm {
        let mut form = UploadForm::new();
        form.draft = ListingDraft {
            title: "Craftsman Bungalow".to_string(),
            description: "Restored 1920s bungalow near the arts district.".to_string(),
            price: 890_000.0,
            kind: Some(ListingKind::Sale),
            address: "123 Main St, Los Angeles, CA".to_string(),
            bedrooms: 3,
            bathrooms: 2,
            area: 1600.0,
            ..Default::default()
        };
        form.set_photo(PhotoData::from_data_uri(PHOTO).unwrap());
        form.set_coordinates(LA);
        form
    }

    fn valid() -> ValidationResult {
        ValidationResult {
            is_valid_location: true,
            formatted_address: "123 Main St".to_string(),
        }
    }

    #[test]
    fn test_begin_requires_photo_and_coordinates() {
        let mut form = UploadForm::new();
        assert_eq!(form.begin_validation().unwrap_err(), ValidationError::MissingInput);
        assert_eq!(form.state(), &ValidationState::Idle);

        form.set_coordinates(LA);
        assert_eq!(form.begin_validation().unwrap_err(), ValidationError::MissingInput);
    }

    #[test]
    fn test_second_trigger_while_validating_is_refused() {
        let mut form = filled_form();
        form.begin_validation().unwrap();
        assert_eq!(form.begin_validation().unwrap_err(), ValidationError::AlreadyValidating);
        assert_eq!(form.state(), &ValidationState::Validating);
    }

    #[test]
    fn test_photo_change_resets_verdict() {
        let mut form = filled_form();
        let (ticket, _) = form.begin_validation().unwrap();
        assert!(form.complete_validation(ticket, valid()));
        assert!(form.can_submit());

        form.set_photo(PhotoData::from_bytes("image/png", b"another"));
        assert_eq!(form.state(), &ValidationState::Idle);
        assert!(!form.can_submit());
        assert_eq!(form.submit().unwrap_err(), SubmitError::LocationNotValidated);
    }

    #[test]
    fn test_same_coordinates_keep_verdict() {
        let mut form = filled_form();
        let (ticket, _) = form.begin_validation().unwrap();
        form.complete_validation(ticket, valid());

        form.set_coordinates(LA);
        assert!(form.can_submit());

        form.set_coordinates(Coordinates::new(34.06, -118.24));
        assert!(!form.can_submit());
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut form = filled_form();
        let (ticket, _) = form.begin_validation().unwrap();
        form.set_coordinates(Coordinates::new(40.0, -74.0));

        assert!(!form.complete_validation(ticket, valid()));
        assert_eq!(form.state(), &ValidationState::Idle);
    }

    #[test]
    fn test_invalid_verdict_blocks_submit() {
        let mut form = filled_form();
        let (ticket, _) = form.begin_validation().unwrap();
        form.complete_validation(ticket, ValidationResult::invalid("AI Error: nope"));

        assert!(matches!(form.state(), ValidationState::Invalid(_)));
        assert_eq!(form.submit().unwrap_err(), SubmitError::LocationNotValidated);
    }

    #[test]
    fn test_submit_while_validating() {
        let mut form = filled_form();
        form.begin_validation().unwrap();
        assert_eq!(form.submit().unwrap_err(), SubmitError::ValidationInProgress);
    }

    #[test]
    fn test_field_rules() {
        let mut form = filled_form();
        let (ticket, _) = form.begin_validation().unwrap();
        form.complete_validation(ticket, valid());

        form.draft.title = "Hut".to_string();
        assert!(matches!(
            form.submit().unwrap_err(),
            SubmitError::InvalidField { field: "title", .. }
        ));

        form.draft.title = "Craftsman Bungalow".to_string();
        form.draft.price = 0.0;
        assert!(matches!(
            form.submit().unwrap_err(),
            SubmitError::InvalidField { field: "price", .. }
        ));

        form.draft.price = 10.0;
        form.draft.description = "too short".to_string();
        assert!(matches!(
            form.submit().unwrap_err(),
            SubmitError::InvalidField { field: "description", .. }
        ));
    }

    #[test]
    fn test_submit_builds_listing_and_resets() {
        let mut form = filled_form();
        form.draft.video_clip = Some("tour.mp4".to_string());
        let (ticket, _) = form.begin_validation().unwrap();
        form.complete_validation(ticket, valid());

        let submission = form.submit().unwrap();
        assert_eq!(submission.validated_address, "123 Main St");
        assert_eq!(submission.listing.coordinates, LA);
        assert_eq!(submission.listing.kind, ListingKind::Sale);
        assert_eq!(submission.listing.image_url, PHOTO);
        assert_eq!(submission.video_clip.as_deref(), Some("tour.mp4"));
        assert!(Uuid::parse_str(&submission.listing.id).is_ok());

        assert_eq!(form.state(), &ValidationState::Idle);
        assert!(form.photo().is_none());
        assert!(form.draft.title.is_empty());
    }

    /// Never answers within a test's patience.
    struct StalledModel;

    #[async_trait::async_trait]
    impl crate::validation::ReasoningModel for StalledModel {
        async fn generate(
            &self,
            _prompt: &crate::validation::ReasoningPrompt,
        ) -> anyhow::Result<Option<String>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(None)
        }

        fn model_name(&self) -> &str {
            "stalled"
        }
    }

    #[test]
    fn test_cancel_returns_to_idle_and_drops_late_result() {
        let mut form = filled_form();
        let (ticket, _) = form.begin_validation().unwrap();

        assert!(form.cancel_validation(ticket));
        assert_eq!(form.state(), &ValidationState::Idle);
        assert!(!form.cancel_validation(ticket));

        assert!(!form.complete_validation(ticket, valid()));
        assert_eq!(form.state(), &ValidationState::Idle);
        assert!(form.begin_validation().is_ok());
    }

    #[tokio::test]
    async fn test_timed_out_validation_releases_form() {
        let validator = LocationValidator::new(
            Arc::new(FixedGeocoder::ok("123 Main St")),
            AiClient::Available(Arc::new(StalledModel)),
        );
        let mut form = filled_form();

        let outcome =
            tokio::time::timeout(Duration::from_millis(50), form.validate_with(&validator)).await;
        assert!(outcome.is_err());

        assert_eq!(form.state(), &ValidationState::Idle);
        assert_eq!(form.submit().unwrap_err(), SubmitError::LocationNotValidated);
        assert!(form.begin_validation().is_ok());
    }

    #[tokio::test]
    async fn test_validate_with_drives_state() {
        let validator = LocationValidator::new(
            Arc::new(FixedGeocoder::ok("123 Main St")),
            AiClient::Available(Arc::new(ScriptedModel::failing("quota exceeded"))),
        );
        let mut form = filled_form();

        let result = form.validate_with(&validator).await.unwrap();
        assert!(!result.is_valid_location);
        assert!(matches!(form.state(), ValidationState::Invalid(_)));
        assert!(!form.can_submit());
    }
}
