//! Deterministic model stub for tests. Replays scripted responses in order and records
//! every request it receives.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{GenerateRequest, GenerateResponse, LanguageModel, LlmError};

pub struct ScriptedModel {
    responses: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedModel {
    /// `Ok(text)` is returned as the response body, `Err(msg)` as a backend error.
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(GenerateResponse { response }),
            Some(Err(message)) => Err(LlmError::Backend(message)),
            None => Err(LlmError::Backend("script exhausted".to_string())),
        }
    }
}
