/// LLM Client — the single point of entry for all language-model calls in the screener.
///
/// ARCHITECTURAL RULE: No other module may talk to a model backend directly.
/// All LLM interactions go through `LlmClient`, which carries the backend handle and the
/// model identifier explicitly. There is no process-wide client.
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub mod ollama;
pub mod prompts;
#[cfg(test)]
pub mod testing;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model backend unavailable after {attempts} attempts")]
    Exhausted { attempts: u32 },

    #[error("Model backend error: {0}")]
    Backend(String),
}

/// Output format the backend is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    Json,
}

/// Sampling knobs forwarded to the backend. `None` means "backend default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl SamplingOptions {
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
        }
    }
}

/// One request/response exchange with a model.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub options: SamplingOptions,
    pub format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub response: String,
}

/// The narrow contract every model backend implements: prompt in, text out.
///
/// Production wiring injects `OllamaBackend`; tests inject a scripted stub.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError>;
}

/// Cheap-to-clone handle: backend + model identifier.
#[derive(Clone)]
pub struct LlmClient {
    backend: Arc<dyn LanguageModel>,
    model: String,
}

impl LlmClient {
    pub fn new(backend: Arc<dyn LanguageModel>, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a plain-text call and returns the raw response text.
    pub async fn call(&self, prompt: &str, options: SamplingOptions) -> Result<String, LlmError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            options,
            format: None,
        };
        let response = self.backend.generate(&request).await?;
        Ok(response.response)
    }

    /// Calls the model in JSON mode and deserializes the response text.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        options: SamplingOptions,
    ) -> Result<T, LlmError> {
        let request = GenerateRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            options,
            format: Some(ResponseFormat::Json),
        };
        let response = self.backend.generate(&request).await?;

        // Some models wrap JSON in markdown fences even in JSON mode
        let text = strip_json_fences(&response.response);

        serde_json::from_str(text).map_err(LlmError::Parse)
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
    {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedModel;
    use super::*;

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "  {\"key\": \"value\"} ";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[tokio::test]
    async fn test_call_sends_model_and_options_without_format() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("python, rust".to_string())]));
        let client = LlmClient::new(model.clone(), "llama3");

        let text = client
            .call("prompt text", SamplingOptions::with_temperature(0.1))
            .await
            .unwrap();
        assert_eq!(text, "python, rust");

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "llama3");
        assert_eq!(requests[0].prompt, "prompt text");
        assert_eq!(requests[0].options.temperature, Some(0.1));
        assert_eq!(requests[0].format, None);
    }

    #[tokio::test]
    async fn test_call_json_requests_json_format_and_parses() {
        let model = Arc::new(ScriptedModel::new(vec![Ok(
            "```json\n{\"bias_score\": 12}\n```".to_string()
        )]));
        let client = LlmClient::new(model.clone(), "llama3");

        let value: serde_json::Value = client
            .call_json("audit", SamplingOptions::default())
            .await
            .unwrap();
        assert_eq!(value["bias_score"], 12);
        assert_eq!(model.requests()[0].format, Some(ResponseFormat::Json));
    }

    #[tokio::test]
    async fn test_call_json_malformed_is_parse_error() {
        let model = Arc::new(ScriptedModel::new(vec![Ok("not json at all".to_string())]));
        let client = LlmClient::new(model, "llama3");

        let result = client
            .call_json::<serde_json::Value>("audit", SamplingOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::Parse(_))));
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let model = Arc::new(ScriptedModel::new(vec![Err("connection refused".to_string())]));
        let client = LlmClient::new(model, "llama3");

        let err = client
            .call("prompt", SamplingOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_sampling_options_skip_unset_temperature() {
        let json = serde_json::to_value(SamplingOptions::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
        let json = serde_json::to_value(SamplingOptions::with_temperature(0.5)).unwrap();
        assert_eq!(json, serde_json::json!({"temperature": 0.5}));
    }
}
