//! Ollama backend — `POST {host}/api/generate` with streaming disabled.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{
    GenerateRequest, GenerateResponse, LanguageModel, LlmError, ResponseFormat, SamplingOptions,
};

const MAX_RETRIES: u32 = 3;

#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

#[derive(Clone)]
pub struct OllamaBackend {
    client: Client,
    base_url: String,
}

impl OllamaBackend {
    pub fn new(host: &str, timeout: Duration) -> Result<Self, LlmError> {
        if host.trim().is_empty() {
            return Err(LlmError::Backend("Ollama host is empty".to_string()));
        }

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: host.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

#[async_trait]
impl LanguageModel for OllamaBackend {
    /// Retries on transport errors, 429 and 5xx with exponential backoff.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        let body = wire_request(request);
        let endpoint = self.endpoint();

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // 1s, 2s
                let delay = Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Model call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&endpoint).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let text = response.text().await.unwrap_or_default();
                warn!("Ollama returned {}: {}", status, text);
                last_error = Some(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(text),
                });
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message: error_message(text),
                });
            }

            let parsed: OllamaGenerateResponse = response.json().await?;

            debug!(
                model = %request.model,
                prompt_tokens = parsed.prompt_eval_count.unwrap_or_default(),
                output_tokens = parsed.eval_count.unwrap_or_default(),
                "Model call succeeded"
            );

            return Ok(GenerateResponse {
                response: parsed.response,
            });
        }

        Err(last_error.unwrap_or(LlmError::Exhausted {
            attempts: MAX_RETRIES,
        }))
    }
}

fn wire_request(request: &GenerateRequest) -> OllamaGenerateRequest<'_> {
    OllamaGenerateRequest {
        model: &request.model,
        prompt: &request.prompt,
        stream: false,
        options: request.options,
        format: request.format,
    }
}

/// Ollama reports failures as `{"error": "..."}`; fall back to the raw body.
fn error_message(body: String) -> String {
    serde_json::from_str::<OllamaError>(&body)
        .map(|e| e.error)
        .unwrap_or(body)
}
