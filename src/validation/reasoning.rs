use crate::models::Coordinates;
use crate::validation::geocoding::Geocoder;
use crate::validation::photo::PhotoData;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

// =============================================================================
// Tools
// =============================================================================

/// A named callable offered to the model. Whether the model calls it is up
/// to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema of the arguments object.
    fn parameters(&self) -> Value;
    async fn call_json(&self, args: Value) -> Result<Value>;
}

#[derive(Debug, Deserialize)]
struct GeocodeArgs {
    latitude: f64,
    longitude: f64,
}

/// The geocoder exposed to the model as `getFormattedAddress`
pub struct GeocodeTool {
    geocoder: Arc<dyn Geocoder>,
}

impl GeocodeTool {
    pub const NAME: &'static str = "getFormattedAddress";

    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }
}

#[async_trait]
impl Tool for GeocodeTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Returns the formatted address of a given latitude and longitude using Google Maps."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "latitude": { "type": "number", "description": "The latitude of the location." },
                "longitude": { "type": "number", "description": "The longitude of the location." }
            },
            "required": ["latitude", "longitude"]
        })
    }

    async fn call_json(&self, args: Value) -> Result<Value> {
        let args: GeocodeArgs =
            serde_json::from_value(args).context("Invalid getFormattedAddress arguments")?;
        debug!(lat = args.latitude, lng = args.longitude, "Model requested geocoding");
        let address = self
            .geocoder
            .formatted_address(Coordinates::new(args.latitude, args.longitude))
            .await?;
        Ok(Value::String(address))
    }
}

// =============================================================================
// Model
// =============================================================================

/// One multimodal request: instructions, the photo, and the tools on offer
#[derive(Clone)]
pub struct ReasoningPrompt {
    pub instructions: String,
    pub photo: PhotoData,
    pub tools: Vec<Arc<dyn Tool>>,
}

impl ReasoningPrompt {
    pub fn tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }
}

/// Multimodal model judging the photo against the address
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    /// Final text of the model, or `None` when it produced nothing.
    async fn generate(&self, prompt: &ReasoningPrompt) -> Result<Option<String>>;

    fn model_name(&self) -> &str;
}

/// Handle to the reasoning model, built once at startup
#[derive(Clone)]
pub enum AiClient {
    Available(Arc<dyn ReasoningModel>),
    Unavailable { reason: String },
}

impl AiClient {
    pub fn available(model: impl ReasoningModel + 'static) -> Self {
        AiClient::Available(Arc::new(model))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        AiClient::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, AiClient::Available(_))
    }
}

impl std::fmt::Debug for AiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiClient::Available(model) => write!(f, "Available({})", model.model_name()),
            AiClient::Unavailable { reason } => write!(f, "Unavailable({reason})"),
        }
    }
}

/// Strip markdown code fences and surrounding prose from a JSON answer.
pub fn strip_code_blocks(response: &str) -> &str {
    let trimmed = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
