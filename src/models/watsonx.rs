use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended generation parameters, forwarded to watsonx.ai untouched
pub type Parameters = Map<String, Value>;

// ==================================================================================================
// Caller-facing request
// ==================================================================================================

/// A text generation request.
///
/// `project_id` may be set by callers but is always replaced by the client's
/// configured project before sending.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub model_id: String,
    pub input: String,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
}

impl GenerationRequest {
    pub fn new(model_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            input: input.into(),
            parameters: Parameters::new(),
            project_id: None,
        }
    }

    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set a single parameter
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Error message when a required field is empty
    pub fn validate(&self) -> Result<(), String> {
        if self.model_id.trim().is_empty() {
            return Err("model_id must not be empty".to_string());
        }
        if self.input.is_empty() {
            return Err("input must not be empty".to_string());
        }
        Ok(())
    }
}

// ==================================================================================================
// Wire format for /ml/v1/text/generation and /ml/v1/text/generation_stream
// ==================================================================================================

/// Body sent to the generation endpoints
#[derive(Debug, Serialize)]
pub struct TextGenerationPayload<'a> {
    pub model_id: &'a str,
    pub input: &'a str,
    pub parameters: &'a Parameters,
    pub project_id: &'a str,
}

impl<'a> TextGenerationPayload<'a> {
    /// Build the payload, forcing the given project id
    pub fn new(request: &'a GenerationRequest, project_id: &'a str) -> Self {
        Self {
            model_id: &request.model_id,
            input: &request.input,
            parameters: &request.parameters,
            project_id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextGenerationResult {
    pub generated_text: String,
    #[serde(default)]
    pub generated_token_count: Option<u64>,
    #[serde(default)]
    pub input_token_count: Option<u64>,
    #[serde(default)]
    pub stop_reason: Option<String>,
}

/// Result envelope from /ml/v1/text/generation
#[derive(Debug, Clone, Deserialize)]
pub struct TextGenerationResponse {
    #[serde(default)]
    pub model_id: Option<String>,
    #[serde(default)]
    pub results: Vec<TextGenerationResult>,
}
