//! Keyword Extractor — asks the model for the top technical skills of a JD or CV and
//! parses the comma-separated answer into a deduplicated lowercase set.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm_client::prompts::LIST_ONLY_INSTRUCTION;
use crate::llm_client::{LlmClient, LlmError, SamplingOptions};
use crate::screening::normalizer::normalize;
use crate::screening::prompts::KEYWORD_PROMPT_TEMPLATE;

/// Low temperature keeps the extraction literal.
pub const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Lowercase, deduplicated skill keywords. Iteration order carries no meaning.
pub type KeywordSet = BTreeSet<String>;

/// Which kind of document is being analyzed. Only affects prompt wording.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocType {
    #[default]
    Jd,
    Cv,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Jd => "jd",
            DocType::Cv => "cv",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("keyword extraction for {doc_type} failed: {source}")]
    Model {
        doc_type: DocType,
        #[source]
        source: LlmError,
    },
}

pub fn build_keyword_prompt(text: &str, doc_type: DocType) -> String {
    KEYWORD_PROMPT_TEMPLATE
        .replace("{doc_label}", doc_type.as_str())
        .replace("{doc_tag}", &doc_type.as_str().to_uppercase())
        .replace("{list_only}", LIST_ONLY_INSTRUCTION)
        .replace("{text}", &normalize(text))
}

/// Parses a raw `a, b,,c` model answer. Newlines are removed before splitting.
pub fn parse_keyword_list(raw: &str) -> KeywordSet {
    canonical_keywords(raw.replace('\n', "").split(','))
}

/// Trims and lowercases each entry, dropping empty ones.
pub fn canonical_keywords<'a>(raw: impl IntoIterator<Item = &'a str>) -> KeywordSet {
    raw.into_iter()
        .map(|keyword| keyword.trim().to_lowercase())
        .filter(|keyword| !keyword.is_empty())
        .collect()
}

/// Extracts keywords, reporting model failures to the caller.
pub async fn try_extract_keywords(
    text: &str,
    doc_type: DocType,
    llm: &LlmClient,
) -> Result<KeywordSet, ExtractionError> {
    let prompt = build_keyword_prompt(text, doc_type);
    let raw = llm
        .call(&prompt, SamplingOptions::with_temperature(EXTRACTION_TEMPERATURE))
        .await
        .map_err(|source| ExtractionError::Model { doc_type, source })?;

    let keywords = parse_keyword_list(&raw);
    debug!("Extracted {} {} keywords", keywords.len(), doc_type);
    Ok(keywords)
}

/// Extracts keywords, degrading to an empty set on failure. The failure is only logged,
/// so an empty result may mean "no skills" or "extraction broke".
pub async fn extract_keywords(text: &str, doc_type: DocType, llm: &LlmClient) -> KeywordSet {
    match try_extract_keywords(text, doc_type, llm).await {
        Ok(keywords) => keywords,
        Err(e) => {
            warn!("Keyword extraction failed: {e}");
            KeywordSet::new()
        }
    }
}

/// Display form used for persistence: entries joined with `", "`.
pub fn keywords_display(keywords: &KeywordSet) -> String {
    keywords.iter().map(String::as_str).collect::<Vec<_>>().join(", ")
}
