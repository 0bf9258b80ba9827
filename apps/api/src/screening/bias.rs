//! Bias Auditor — asks the model (JSON mode) to rate biased phrasing in a JD and
//! validates the untrusted answer into a fixed schema.
//!
//! The model output is coerced, clamped and truncated field by field:
//! - `bias_score`: integer-coerced, missing → 0, clamped to 0..=100
//! - `biased_phrases` / `alternatives`: sequence-coerced, missing → [], at most 5 entries
//!
//! Any failure (model, JSON, coercion) yields the error shape instead. No retry.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::{LlmClient, SamplingOptions};
use crate::screening::normalizer::normalize;
use crate::screening::prompts::BIAS_PROMPT_TEMPLATE;

pub const MAX_BIAS_SCORE: i64 = 100;
pub const MAX_PHRASES: usize = 5;

/// Either a validated audit or an error, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BiasReport {
    Audit {
        bias_score: u8,
        biased_phrases: Vec<String>,
        alternatives: Vec<String>,
    },
    Error {
        error: String,
    },
}

impl BiasReport {
    pub fn is_error(&self) -> bool {
        matches!(self, BiasReport::Error { .. })
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum BiasValidationError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("'{field}' cannot be converted to an integer: {value}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("'{field}' is not a sequence: {value}")]
    NotASequence { field: &'static str, value: String },
}

pub fn build_bias_prompt(text: &str) -> String {
    BIAS_PROMPT_TEMPLATE
        .replace("{json_only}", JSON_ONLY_INSTRUCTION)
        .replace("{text}", &normalize(text))
}

/// Audits `text` for biased language.
pub async fn detect_bias(text: &str, llm: &LlmClient) -> BiasReport {
    let prompt = build_bias_prompt(text);

    let raw: Value = match llm.call_json(&prompt, SamplingOptions::default()).await {
        Ok(value) => value,
        Err(e) => {
            warn!("Bias audit failed: {e}");
            return BiasReport::Error {
                error: e.to_string(),
            };
        }
    };

    match validate_bias_response(&raw) {
        Ok(report) => {
            if let BiasReport::Audit { bias_score, .. } = &report {
                info!("Bias audit complete: score={bias_score}");
            }
            report
        }
        Err(e) => {
            warn!("Bias audit response rejected: {e}");
            BiasReport::Error {
                error: e.to_string(),
            }
        }
    }
}

/// Validates a parsed model response into a `BiasReport::Audit`.
pub fn validate_bias_response(raw: &Value) -> Result<BiasReport, BiasValidationError> {
    let object = raw
        .as_object()
        .ok_or_else(|| BiasValidationError::NotAnObject(json_type(raw)))?;

    let score = coerce_integer("bias_score", object.get("bias_score"))?;
    let biased_phrases = coerce_sequence("biased_phrases", object.get("biased_phrases"))?;
    let alternatives = coerce_sequence("alternatives", object.get("alternatives"))?;

    Ok(BiasReport::Audit {
        bias_score: score.clamp(0, MAX_BIAS_SCORE) as u8,
        biased_phrases: biased_phrases.into_iter().take(MAX_PHRASES).collect(),
        alternatives: alternatives.into_iter().take(MAX_PHRASES).collect(),
    })
}

/// Missing → 0. Floats truncate toward zero, numeric strings parse, booleans are 0/1.
fn coerce_integer(field: &'static str, value: Option<&Value>) -> Result<i64, BiasValidationError> {
    let Some(value) = value else {
        return Ok(0);
    };

    let coerced = match value {
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_u64().map(|_| i64::MAX))
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    };

    coerced.ok_or_else(|| BiasValidationError::NotAnInteger {
        field,
        value: value.to_string(),
    })
}

/// Missing → empty. Arrays as-is, objects → keys, strings → characters.
fn coerce_sequence(
    field: &'static str,
    value: Option<&Value>,
) -> Result<Vec<String>, BiasValidationError> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    match value {
        Value::Array(items) => Ok(items.iter().map(element_text).collect()),
        Value::Object(map) => Ok(map.keys().cloned().collect()),
        Value::String(s) => Ok(s.chars().map(String::from).collect()),
        Value::Null | Value::Bool(_) | Value::Number(_) => Err(BiasValidationError::NotASequence {
            field,
            value: value.to_string(),
        }),
    }
}

fn element_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use crate::llm_client::ResponseFormat;

    fn audit(raw: Value) -> BiasReport {
        validate_bias_response(&raw).unwrap()
    }

    fn score_of(report: &BiasReport) -> u8 {
        match report {
            BiasReport::Audit { bias_score, .. } => *bias_score,
            BiasReport::Error { error } => panic!("unexpected error report: {error}"),
        }
    }

    async fn run(response: Result<&str, &str>) -> (Arc<ScriptedModel>, BiasReport) {
        let model = Arc::new(ScriptedModel::new(vec![response
            .map(String::from)
            .map_err(String::from)]));
        let llm = LlmClient::new(model.clone(), "llama3");
        let report = detect_bias("Young graduates encouraged to apply", &llm).await;
        (model, report)
    }

    #[test]
    fn test_well_formed_response() {
        let report = audit(json!({
            "bias_score": 40,
            "biased_phrases": ["young graduates"],
            "alternatives": ["early-career candidates"]
        }));
        assert_eq!(
            report,
            BiasReport::Audit {
                bias_score: 40,
                biased_phrases: vec!["young graduates".to_string()],
                alternatives: vec!["early-career candidates".to_string()],
            }
        );
    }

    #[test]
    fn test_score_clamps_high() {
        assert_eq!(score_of(&audit(json!({"bias_score": 150}))), 100);
    }

    #[test]
    fn test_score_clamps_low() {
        assert_eq!(score_of(&audit(json!({"bias_score": -5}))), 0);
    }

    #[test]
    fn test_score_coercions() {
        assert_eq!(score_of(&audit(json!({"bias_score": 42.9}))), 42);
        assert_eq!(score_of(&audit(json!({"bias_score": " 73 "}))), 73);
        assert_eq!(score_of(&audit(json!({"bias_score": true}))), 1);
        assert_eq!(score_of(&audit(json!({"bias_score": 18446744073709551615u64}))), 100);
        assert_eq!(score_of(&audit(json!({}))), 0);
    }

    #[test]
    fn test_uncoercible_score_is_error() {
        assert!(matches!(
            validate_bias_response(&json!({"bias_score": null})),
            Err(BiasValidationError::NotAnInteger { .. })
        ));
        assert!(validate_bias_response(&json!({"bias_score": "high"})).is_err());
        assert!(validate_bias_response(&json!({"bias_score": [10]})).is_err());
    }

    #[test]
    fn test_alternatives_truncate_to_five() {
        let report = audit(json!({
            "bias_score": 10,
            "alternatives": ["a", "b", "c", "d", "e", "f", "g", "h"]
        }));
        match report {
            BiasReport::Audit {
                alternatives,
                biased_phrases,
                ..
            } => {
                assert_eq!(alternatives, vec!["a", "b", "c", "d", "e"]);
                assert!(biased_phrases.is_empty());
            }
            BiasReport::Error { error } => panic!("{error}"),
        }
    }

    #[test]
    fn test_sequence_coercions() {
        assert_eq!(
            coerce_sequence("alternatives", Some(&json!([1, "two", null]))).unwrap(),
            vec!["1", "two", "null"]
        );
        assert_eq!(
            coerce_sequence("alternatives", Some(&json!({"x": 1, "y": 2}))).unwrap(),
            vec!["x", "y"]
        );
        assert_eq!(
            coerce_sequence("alternatives", Some(&json!("ab"))).unwrap(),
            vec!["a", "b"]
        );
        assert!(coerce_sequence("alternatives", Some(&json!(3))).is_err());
        assert!(coerce_sequence("alternatives", Some(&Value::Null)).is_err());
    }

    #[test]
    fn test_non_object_is_error() {
        assert_eq!(
            validate_bias_response(&json!([1, 2])),
            Err(BiasValidationError::NotAnObject("array"))
        );
    }

    #[test]
    fn test_error_shape_serializes_single_key() {
        let report = BiasReport::Error {
            error: "boom".to_string(),
        };
        assert_eq!(serde_json::to_value(&report).unwrap(), json!({"error": "boom"}));
    }

    #[test]
    fn test_audit_shape_serializes_without_error_key() {
        let report = audit(json!({"bias_score": 5}));
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["bias_score"], 5);
        assert_eq!(value["biased_phrases"], json!([]));
    }

    #[test]
    fn test_prompt_lists_schema_and_normalized_text() {
        let prompt = build_bias_prompt("Looking for YOUNG, energetic salesmen!");
        assert!(prompt.contains("\"bias_score\""));
        assert!(prompt.contains("\"biased_phrases\""));
        assert!(prompt.contains("\"alternatives\""));
        assert!(prompt.contains("Text: looking young energetic salesmen"));
    }

    #[tokio::test]
    async fn test_detect_bias_requests_json_mode() {
        let (model, report) =
            run(Ok(r#"{"bias_score": 150, "biased_phrases": ["young graduates"]}"#)).await;
        assert_eq!(score_of(&report), 100);
        assert_eq!(model.requests()[0].format, Some(ResponseFormat::Json));
    }

    #[tokio::test]
    async fn test_detect_bias_malformed_json_yields_error_only() {
        let (_, report) = run(Ok("{bias_score: oops")).await;
        assert!(report.is_error());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
        assert!(value.get("error").is_some());
    }

    #[tokio::test]
    async fn test_detect_bias_model_failure_yields_error() {
        let (_, report) = run(Err("model not loaded")).await;
        match report {
            BiasReport::Error { error } => assert!(error.contains("model not loaded")),
            other => panic!("expected error, got {other:?}"),
        }
    }
}
