use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const TEMPERATURE: f64 = 0.2;
pub const TOP_P: f64 = 0.9;
pub const NUM_PREDICT: u32 = 1200;

/// Sampling options sent with every generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub temperature: f64,
    pub top_p: f64,
    pub num_predict: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            top_p: TOP_P,
            num_predict: NUM_PREDICT,
        }
    }
}

/// Body of one outbound `/api/generate` call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratePayload {
    pub model: String,
    pub prompt: String,
    pub format: String,
    pub options: GenerationOptions,
    pub stream: bool,
}

impl GeneratePayload {
    /// Non-streaming, JSON-formatted request with the fixed sampling options
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            format: "json".to_string(),
            options: GenerationOptions::default(),
            stream: false,
        }
    }
}

/// The part of the remote reply we read; other fields are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub response: String,
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Send one payload and return the model's raw `response` text
    async fn generate(&self, payload: &GeneratePayload) -> Result<String>;

    /// Where requests are sent, for diagnostics
    fn endpoint(&self) -> &str;
}
