// All LLM prompt constants for the screening module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Keyword extraction prompt. Replace `{doc_label}`, `{doc_tag}`, `{text}` and
/// `{list_only}` before sending.
pub const KEYWORD_PROMPT_TEMPLATE: &str = r#"Extract the top 10 most important TECHNICAL SKILLS from this {doc_label}.
Return ONLY a comma-separated list of exactly 10 specific technologies/tools in lowercase.
Example: python,django,aws,postgresql
{list_only}

{doc_tag}: {text}"#;

/// Bias audit prompt. Replace `{text}` and `{json_only}` before sending.
pub const BIAS_PROMPT_TEMPLATE: &str = r#"Analyze this job description for biased language (gender, age, race).
Return a JSON object with exactly these keys:
- "bias_score": integer 0-100 (100 = most biased)
- "biased_phrases": array of problematic phrases
- "alternatives": array of neutral alternatives, one per biased phrase
{json_only}

Example:
{"bias_score": 40, "biased_phrases": ["young graduates"], "alternatives": ["early-career candidates"]}

Text: {text}"#;
