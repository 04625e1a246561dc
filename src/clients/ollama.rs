use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::traits::{GenerateResponse, GenerationBackend, GeneratePayload};
use crate::config::GenerationConfig;
use crate::error::{RelayError, Result};

/// Client for an Ollama-compatible `/api/generate` endpoint
#[derive(Clone, Debug)]
pub struct OllamaClient {
    endpoint: String,
    timeout: Duration,
    client: Client,
}

impl OllamaClient {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Config {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: config.url.clone(),
            timeout,
            client,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> RelayError {
        if err.is_timeout() {
            RelayError::Timeout {
                operation: "generation request".to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            RelayError::from(err)
        }
    }
}

#[async_trait]
impl GenerationBackend for OllamaClient {
    async fn generate(&self, payload: &GeneratePayload) -> Result<String> {
        let res = self
            .client
            .post(&self.endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(RelayError::Upstream {
                message: format!("generation service returned {}: {}", status, text),
            });
        }

        let body: GenerateResponse = res.json().await.map_err(|e| {
            if e.is_timeout() {
                self.map_send_error(e)
            } else {
                RelayError::Upstream {
                    message: format!("failed to decode generation response: {}", e),
                }
            }
        })?;

        Ok(body.response)
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
