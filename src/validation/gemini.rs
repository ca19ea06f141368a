use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use crate::validation::reasoning::{ReasoningModel, ReasoningPrompt};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const MAX_TURNS: usize = 4;

/// Finish reasons meaning the answer was withheld by content policy
const POLICY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
    "SPII",
    "IMAGE_SAFETY",
];

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDeclarations>,
    generation_config: Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// What one turn of the conversation produced
#[derive(Debug)]
enum Turn {
    Calls(Content, Vec<FunctionCall>),
    Text(Option<String>),
}

fn read_turn(response: GenerateResponse) -> Result<Turn> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        bail!("Request content filtered by safety settings: {}", reason);
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Ok(Turn::Text(None));
    };

    if let Some(reason) = candidate
        .finish_reason
        .as_deref()
        .filter(|r| POLICY_FINISH_REASONS.contains(r))
    {
        bail!("Response content filtered: finish reason {}", reason);
    }

    let Some(content) = candidate.content else {
        return Ok(Turn::Text(None));
    };

    let calls: Vec<FunctionCall> = content
        .parts
        .iter()
        .filter_map(|p| p.function_call.clone())
        .collect();
    if !calls.is_empty() {
        return Ok(Turn::Calls(content, calls));
    }

    let text: String = content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect();
    Ok(Turn::Text((!text.trim().is_empty()).then_some(text)))
}

// =============================================================================
// Client
// =============================================================================

/// Gemini `generateContent` with function calling
pub struct GeminiModel {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            model: model.into(),
            base_url: GEMINI_API_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn send(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        debug!(model = %self.model, turns = request.contents.len(), "Gemini request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(request)
            .send()
            .await
            .map_err(|e| e.without_url())
            .context("Gemini request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error ({}): {}", status, error_text));
        }

        response
            .json()
            .await
            .map_err(|e| e.without_url())
            .context("Failed to decode Gemini response")
    }
}

fn build_request(prompt: &ReasoningPrompt) -> GenerateRequest {
    let user = Content {
        role: Some("user".to_string()),
        parts: vec![
            Part {
                text: Some(prompt.instructions.clone()),
                ..Default::default()
            },
            Part {
                inline_data: Some(InlineData {
                    mime_type: prompt.photo.mime_type().to_string(),
                    data: prompt.photo.base64_data().to_string(),
                }),
                ..Default::default()
            },
        ],
    };

    let declarations: Vec<FunctionDeclaration> = prompt
        .tools
        .iter()
        .map(|t| FunctionDeclaration {
            name: t.name().to_string(),
            description: t.description().to_string(),
            parameters: t.parameters(),
        })
        .collect();

    GenerateRequest {
        contents: vec![user],
        tools: if declarations.is_empty() {
            Vec::new()
        } else {
            vec![ToolDeclarations {
                function_declarations: declarations,
            }]
        },
        generation_config: json!({ "temperature": 0.0 }),
    }
}

#[async_trait]
impl ReasoningModel for GeminiModel {
    async fn generate(&self, prompt: &ReasoningPrompt) -> Result<Option<String>> {
        let mut request = build_request(prompt);

        for _ in 0..MAX_TURNS {
            let response = self.send(&request).await?;

            match read_turn(response)? {
                Turn::Text(text) => return Ok(text),
                Turn::Calls(model_content, calls) => {
                    request.contents.push(Content {
                        role: Some("model".to_string()),
                        parts: model_content.parts,
                    });

                    let mut parts = Vec::with_capacity(calls.len());
                    for call in calls {
                        let tool = prompt
                            .tool(&call.name)
                            .ok_or_else(|| anyhow!("Tool not found: {}", call.name))?;

                        debug!(tool = %call.name, "Executing tool call");

                        let output = match tool.call_json(call.args).await {
                            Ok(v) => json!({ "result": v }),
                            Err(e) => json!({ "error": e.to_string() }),
                        };
                        parts.push(Part {
                            function_response: Some(FunctionResponse {
                                name: call.name,
                                response: output,
                            }),
                            ..Default::default()
                        });
                    }

                    request.contents.push(Content {
                        role: Some("user".to_string()),
                        parts,
                    });
                }
            }
        }

        Err(anyhow!("Max turns ({}) exceeded", MAX_TURNS))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::errors::{classify_failure, FailureClass};
    use crate::validation::geocoding::PlaceholderGeocoder;
    use crate::validation::photo::PhotoData;
    use crate::validation::reasoning::GeocodeTool;
    use std::sync::Arc;

    fn parse(json: Value) -> Result<Turn> {
        read_turn(serde_json::from_value(json).unwrap())
    }

    #[test]
    fn test_request_wire_shape() {
        let prompt = ReasoningPrompt {
            instructions: "judge this".to_string(),
            photo: PhotoData::from_bytes("image/png", b"img"),
            tools: vec![Arc::new(GeocodeTool::new(Arc::new(PlaceholderGeocoder)))],
        };
        let body = serde_json::to_value(build_request(&prompt)).unwrap();

        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "judge this");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(
            body["tools"][0]["functionDeclarations"][0]["name"],
            "getFormattedAddress"
        );
        assert!(body["contents"][0]["parts"][0].get("inlineData").is_none());
    }

    #[test]
    fn test_text_turn() {
        let turn = parse(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "{\"isValidLocation\": true," },
                    { "text": " \"formattedAddress\": \"x\"}" }
                ] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        match turn {
            Turn::Text(Some(text)) => assert!(text.contains("formattedAddress")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_function_call_turn() {
        let turn = parse(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "functionCall": { "name": "getFormattedAddress",
                                        "args": { "latitude": 1.0, "longitude": 2.0 } } }
                ] }
            }]
        }))
        .unwrap();
        match turn {
            Turn::Calls(_, calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "getFormattedAddress");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_empty_response_has_no_output() {
        assert!(matches!(parse(json!({})).unwrap(), Turn::Text(None)));
        assert!(matches!(
            parse(json!({ "candidates": [{ "finishReason": "STOP" }] })).unwrap(),
            Turn::Text(None)
        ));
    }

    #[test]
    fn test_blocked_prompt_is_safety_error() {
        let err = parse(json!({ "promptFeedback": { "blockReason": "SAFETY" } })).unwrap_err();
        assert!(err.to_string().contains("safety"));

        let err = parse(json!({ "candidates": [{ "finishReason": "SAFETY" }] })).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_policy_stops_are_content_filtered() {
        for reason in ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII", "IMAGE_SAFETY"] {
            let err = parse(json!({ "candidates": [{ "finishReason": reason }] })).unwrap_err();
            assert!(err.to_string().contains(reason));
            assert_eq!(
                classify_failure(&err.to_string()),
                FailureClass::ContentFiltered,
                "{reason}"
            );
        }

        // a length stop is not a policy stop
        assert!(matches!(
            parse(json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] })).unwrap(),
            Turn::Text(None)
        ));
    }
}
