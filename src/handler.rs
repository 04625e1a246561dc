//! Request handler: resolve model and framework, render the prompt, call the
//! generation backend and recover JSON from its reply.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::catalog::{self, DEFAULT_FRAMEWORK};
use crate::clients::{GenerationBackend, GeneratePayload};
use crate::error::{RelayError, Result};
use crate::extract::{ExtractedOutput, extract_output};
use crate::prompts::render_prompt;

fn default_framework() -> String {
    DEFAULT_FRAMEWORK.to_string()
}

/// Body of `POST /api/generate`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub requirement: String,
    #[serde(default = "default_framework")]
    pub framework: String,
    #[serde(default)]
    pub model: Option<String>,
}

impl GenerationRequest {
    pub fn new(requirement: impl Into<String>) -> Self {
        Self {
            requirement: requirement.into(),
            framework: default_framework(),
            model: None,
        }
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = framework.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Reply of `POST /api/generate`
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub model_used: String,
    pub target_framework: String,
    /// Parsed model output, or an error descriptor when it was unusable
    pub result: Value,
    /// Which descriptor `result` holds, if any
    #[serde(skip)]
    pub malformed: Option<&'static str>,
}

#[derive(Clone)]
pub struct Generator {
    backend: Arc<dyn GenerationBackend>,
}

impl Generator {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &dyn GenerationBackend {
        self.backend.as_ref()
    }

    /// Run one generation round trip.
    ///
    /// Only backend failures are errors; malformed model output is reported
    /// inside `result`.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        if request.requirement.is_empty() {
            return Err(RelayError::Validation {
                message: "requirement must not be empty".to_string(),
            });
        }

        let request_id = uuid::Uuid::new_v4();
        let model = catalog::resolve_model(request.model.as_deref());
        let framework = catalog::resolve_framework(&request.framework);
        info!(
            %request_id,
            model,
            framework = %framework.slug,
            fallback_example = framework.is_fallback(),
            "generate request"
        );

        let prompt = render_prompt(&framework, &request.requirement);
        let payload = GeneratePayload::new(model, prompt);
        debug!(
            %request_id,
            endpoint = self.backend.endpoint(),
            prompt_chars = payload.prompt.chars().count(),
            "calling generation backend"
        );

        let raw = self.backend.generate(&payload).await.map_err(|e| {
            error!(%request_id, "generation backend failed: {}", e);
            e
        })?;

        let output = extract_output(&raw);
        let malformed = match &output {
            ExtractedOutput::Parsed(_) => None,
            ExtractedOutput::Malformed(m) => {
                warn!(%request_id, kind = m.kind(), "model output was not usable JSON");
                Some(m.kind())
            }
        };

        Ok(GenerationResult {
            model_used: model.to_string(),
            target_framework: framework.slug,
            result: output.into_value(),
            malformed,
        })
    }
}
