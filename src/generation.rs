use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::CredentialManager;
use crate::config::ClientConfig;
use crate::error::{ClientError, ConfigError, RequestError};
use crate::models::watsonx::{GenerationRequest, TextGenerationPayload, TextGenerationResponse};
use crate::streaming::{self, GenerationStream};

const GENERATION_PATH: &str = "/ml/v1/text/generation?version=2023-05-29";
const GENERATION_STREAM_PATH: &str = "/ml/v1/text/generation_stream?version=2023-05-02";

/// watsonx.ai text generation client.
///
/// Cheap to share behind an `Arc`; concurrent calls only serialize on the
/// credential check, never on the generation request itself.
pub struct GenerationClient {
    /// Shared HTTP client with connection pooling
    client: Client,

    /// Token lifecycle
    credentials: Arc<CredentialManager>,

    config: ClientConfig,
}

impl GenerationClient {
    /// Validate the configuration and build the client. No network call is made.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .build()
            .map_err(|e| ConfigError::Transport(e.to_string()))?;

        let credentials = Arc::new(CredentialManager::new(
            client.clone(),
            config.iam_url.clone(),
            config.api_key.clone(),
        ));

        Ok(Self {
            client,
            credentials,
            config,
        })
    }

    /// Build the client and fetch the first token, so that a bad API key is
    /// reported at start-up instead of on the first request.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let client = Self::new(config)?;
        let token = client.credentials.ensure_valid().await?;
        tracing::info!("Authenticated with IAM (token: {}...)", token.preview());
        Ok(client)
    }

    /// Credential manager backing this client
    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// Project id forced onto every request
    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    /// Generate text and return the first result's text
    pub async fn generate(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        let response = self.send(request, GENERATION_PATH).await?;

        let bytes = response.bytes().await.map_err(RequestError::Transport)?;
        let envelope: TextGenerationResponse =
            serde_json::from_slice(&bytes).map_err(|e| RequestError::Decode(e.to_string()))?;

        let served_by = envelope.model_id;
        let result = envelope
            .results
            .into_iter()
            .next()
            .ok_or(RequestError::Empty)?;

        tracing::debug!(
            model_id = %request.model_id,
            served_by = ?served_by,
            input_token_count = ?result.input_token_count,
            generated_token_count = ?result.generated_token_count,
            stop_reason = ?result.stop_reason,
            "Generation complete"
        );

        Ok(result.generated_text)
    }

    /// Generate text and forward the raw response body as it arrives
    pub async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationStream, ClientError> {
        let response = self.send(request, GENERATION_STREAM_PATH).await?;
        tracing::debug!(model_id = %request.model_id, "Generation stream opened");
        Ok(streaming::forward_chunks(response))
    }

    /// Validate, authorize and POST a generation payload. Returns the
    /// response only for success statuses.
    async fn send(
        &self,
        request: &GenerationRequest,
        path: &str,
    ) -> Result<Response, ClientError> {
        request.validate().map_err(RequestError::Invalid)?;

        // Credential lock is released when this returns
        let token = self.credentials.ensure_valid().await?;

        let url = self.config.endpoint_url(path);
        let payload = TextGenerationPayload::new(request, &self.config.project_id);

        tracing::debug!(
            url = %url,
            model_id = %request.model_id,
            "Sending generation request"
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", token.bearer())
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(url = %url, error = %e, "Generation request error");
                RequestError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                status = status.as_u16(),
                url = %url,
                response_body = %body,
                "Generation request failed with error response"
            );
            return Err(RequestError::Status {
                status: status.as_u16(),
                body,
            }
            .into());
        }

        Ok(response)
    }
}
