use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};

use crate::config::AzureConfig;
use crate::error::{BridgeError, Result};
use crate::models::azure::{ChatCompletion, ProviderRequest};
use crate::provider::{CompletionFuture, Provider, UpstreamBody};

pub struct AzureOpenAiClient {
    client: Client,
    config: AzureConfig,
}

impl AzureOpenAiClient {
    /// The client itself only bounds connecting and the silence between two
    /// reads, so a streamed answer may run as long as it keeps producing.
    /// Batch requests additionally get the total `timeout_secs` limit.
    pub fn new(config: AzureConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.idle_timeout_secs))
            .build()
            .map_err(|e| {
                BridgeError::InternalError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Chat completions URL; retrieval-augmented requests go to the extensions route
    pub fn completions_url(&self, with_data_sources: bool) -> String {
        let base = if self.config.endpoint.starts_with("http://")
            || self.config.endpoint.starts_with("https://")
        {
            self.config.endpoint.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", self.config.endpoint.trim_end_matches('/'))
        };
        let extensions = if with_data_sources { "/extensions" } else { "" };

        format!(
            "{}/openai/deployments/{}{}/chat/completions?api-version={}",
            base, self.config.deployment, extensions, self.config.api_version
        )
    }
}

impl Provider for AzureOpenAiClient {
    fn complete(&self, request: ProviderRequest) -> CompletionFuture {
        let url = self.completions_url(request.data_sources.is_some());
        let client = self.client.clone();
        let api_key = self.config.api_key.clone();
        let total = Duration::from_secs(self.config.timeout_secs);

        Box::pin(async move { Self::complete_impl(url, request, client, api_key, total).await })
    }

    fn name(&self) -> &str {
        "Azure OpenAI"
    }
}

impl AzureOpenAiClient {
    async fn complete_impl(
        url: String,
        request: ProviderRequest,
        client: Client,
        api_key: String,
        total: Duration,
    ) -> Result<UpstreamBody> {
        let body = serde_json::to_vec(&request)?;
        info!(
            bytes = body.len(),
            messages = request.messages.len(),
            stream = request.stream,
            "Azure OpenAI: Sending request to: {}",
            url.split('?').next().unwrap_or(&url)
        );

        let mut builder = client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("api-key", &api_key)
            .body(body);
        if !request.stream {
            builder = builder.timeout(total);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| {
                BridgeError::UpstreamUnavailable(format!("Azure OpenAI request failed: {}", e))
            })?;

        let status = response.status();
        info!("Azure OpenAI responded with status: {}", status);

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = status.as_u16(), body = %error_body, "Error response from Azure OpenAI");
            return Err(BridgeError::UpstreamStatus {
                status: status.as_u16(),
                body: error_body,
            });
        }

        if request.stream {
            let stream = response.bytes_stream().map(|chunk| {
                chunk.map_err(|e| BridgeError::UpstreamInterrupted(e.to_string()))
            });
            return Ok(UpstreamBody::Stream(Box::pin(stream)));
        }

        let bytes = response.bytes().await.map_err(|e| {
            BridgeError::UpstreamUnavailable(format!("Failed to read Azure OpenAI response: {}", e))
        })?;
        let document: ChatCompletion = serde_json::from_slice(&bytes).map_err(|e| {
            BridgeError::InvalidUpstreamResponse(format!("Azure OpenAI returned invalid JSON: {}", e))
        })?;

        Ok(UpstreamBody::Document(document))
    }
}
