//! Failure taxonomy of the location check.
//!
//! Provider errors arrive as free text. [`classify_failure`] is the single
//! place that maps that text to a [`FailureClass`]; adjust the rule tables
//! below when a provider changes its wording.

use thiserror::Error;

const AUTH_OR_QUOTA_MARKERS: &[&str] = &[
    "api key",
    "api_key",
    "permission",
    "quota",
    "billing",
    "unauthenticated",
    "request_denied",
    "over_query_limit",
    "resource_exhausted",
];

const TIMEOUT_MARKERS: &[&str] = &["deadline", "timeout", "timed out"];

const CONTENT_FILTER_MARKERS: &[&str] = &["safety", "content filtered", "prohibited_content"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    AuthOrQuota,
    Timeout,
    ContentFiltered,
    Unknown,
}

/// Map a provider failure message to its class. First matching table wins.
pub fn classify_failure(message: &str) -> FailureClass {
    let lower = message.to_lowercase();
    let hit = |markers: &[&str]| markers.iter().any(|m| lower.contains(m));

    if hit(AUTH_OR_QUOTA_MARKERS) {
        FailureClass::AuthOrQuota
    } else if hit(TIMEOUT_MARKERS) {
        FailureClass::Timeout
    } else if hit(CONTENT_FILTER_MARKERS) {
        FailureClass::ContentFiltered
    } else {
        FailureClass::Unknown
    }
}

/// Context chain joined with ": ", skipping causes the previous link
/// already spells out.
fn chain_message(err: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in err.chain() {
        let text = cause.to_string();
        if text.is_empty() || parts.last().is_some_and(|prev| prev.contains(&text)) {
            continue;
        }
        parts.push(text);
    }
    parts.join(": ")
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("photo or coordinates missing")]
    MissingInput,
    #[error("invalid input: {0}")]
    InvalidInputFormat(String),
    #[error("a location check is already running")]
    AlreadyValidating,
    #[error("AI service unavailable: {0}")]
    Unavailable(String),
    #[error("AI model returned no structured output")]
    NoStructuredOutput,
    #[error("auth or quota failure: {0}")]
    AuthOrQuota(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("content filtered: {0}")]
    ContentFiltered(String),
    #[error("{0}")]
    Unknown(String),
}

impl ValidationError {
    /// Build the classified variant for a failed provider call.
    pub fn from_provider(err: &anyhow::Error) -> Self {
        let message = chain_message(err);
        match classify_failure(&message) {
            FailureClass::AuthOrQuota => ValidationError::AuthOrQuota(message),
            FailureClass::Timeout => ValidationError::Timeout(message),
            FailureClass::ContentFiltered => ValidationError::ContentFiltered(message),
            FailureClass::Unknown => ValidationError::Unknown(message),
        }
    }

    pub fn class(&self) -> Option<FailureClass> {
        match self {
            ValidationError::AuthOrQuota(_) => Some(FailureClass::AuthOrQuota),
            ValidationError::Timeout(_) => Some(FailureClass::Timeout),
            ValidationError::ContentFiltered(_) => Some(FailureClass::ContentFiltered),
            ValidationError::Unknown(_) => Some(FailureClass::Unknown),
            _ => None,
        }
    }

    /// Text shown to the seller in place of an address.
    pub fn user_message(&self) -> String {
        match self {
            ValidationError::MissingInput => {
                "Please upload a photo and enter latitude and longitude before validating the location."
                    .to_string()
            }
            ValidationError::InvalidInputFormat(detail) => format!("Invalid input data: {detail}"),
            ValidationError::AlreadyValidating => {
                "A location check is already running. Please wait for it to finish.".to_string()
            }
            ValidationError::Unavailable(_) => {
                "AI Error: The AI service is not configured on the server. Please check the GOOGLE_API_KEY setting."
                    .to_string()
            }
            ValidationError::NoStructuredOutput => {
                "Error: AI model returned no output for location validation.".to_string()
            }
            ValidationError::AuthOrQuota(_) => {
                "AI Error: The API key for the AI service might be invalid, missing permissions or over quota. Please check your server configuration."
                    .to_string()
            }
            ValidationError::Timeout(_) => {
                "AI Error: The location check took too long. Please try again later.".to_string()
            }
            ValidationError::ContentFiltered(_) => {
                "AI Error: The photo was rejected by the AI content policy. Please upload a different photo."
                    .to_string()
            }
            ValidationError::Unknown(raw) => format!("AI Error: {raw}"),
        }
    }
}
