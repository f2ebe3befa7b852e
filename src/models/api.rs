use serde::{Deserialize, Serialize};

use super::watsonx::{GenerationRequest, Parameters};

/// Body accepted by /generate-text and /generate-text/stream.
/// Every field is required; presence is checked by `into_generation_request`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateTextRequest {
    pub model_id: Option<String>,
    pub input: Option<String>,
    pub parameters: Option<Parameters>,
}

impl GenerateTextRequest {
    /// Convert into a generation request, or `None` if a field is missing or
    /// fails `GenerationRequest::validate`
    pub fn into_generation_request(self) -> Option<GenerationRequest> {
        let request = GenerationRequest::new(self.model_id?, self.input?)
            .with_parameters(self.parameters?);

        request.validate().ok().map(|_| request)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateTextResponse {
    pub generated_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_complete_request_converts() {
        let request: GenerateTextRequest = serde_json::from_value(json!({
            "model_id": "google/flan-ul2",
            "input": "Translate: hello",
            "parameters": {}
        }))
        .unwrap();

        let generation = request.into_generation_request().unwrap();
        assert_eq!(generation.model_id, "google/flan-ul2");
        assert!(generation.parameters.is_empty());
        assert!(generation.project_id.is_none());
    }

    #[test]
    fn test_missing_fields_are_rejected() {
        let missing_parameters: GenerateTextRequest =
            serde_json::from_value(json!({"model_id": "m", "input": "i"})).unwrap();
        assert!(missing_parameters.into_generation_request().is_none());

        let null_parameters: GenerateTextRequest =
            serde_json::from_value(json!({"model_id": "m", "input": "i", "parameters": null}))
                .unwrap();
        assert!(null_parameters.into_generation_request().is_none());

        let empty_model: GenerateTextRequest =
            serde_json::from_value(json!({"model_id": "", "input": "i", "parameters": {}}))
                .unwrap();
        assert!(empty_model.into_generation_request().is_none());

        let blank_model: GenerateTextRequest =
            serde_json::from_value(json!({"model_id": "   ", "input": "i", "parameters": {}}))
                .unwrap();
        assert!(blank_model.into_generation_request().is_none());
    }
}
