//! Text Normalizer — turns raw JD/CV text into a compact, lowercase, lemmatized token
//! stream suitable for prompting.
//!
//! Pipeline: strip URLs and emails → drop characters outside `[a-zA-Z0-9\s+&/-]` →
//! lowercase/trim → tokenize → drop stopwords and non-alphabetic tokens → lemmatize →
//! join with single spaces.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("normalizer pattern failed to compile: {0}")]
    Pattern(#[from] regex::Error),
}

struct Patterns {
    url: Regex,
    email: Regex,
    disallowed: Regex,
}

impl Patterns {
    fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            url: Regex::new(r"(?i)\b(?:https?://|www\.)\S+")?,
            email: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+")?,
            disallowed: Regex::new(r"[^a-zA-Z0-9\s+&/-]")?,
        })
    }
}

static PATTERNS: LazyLock<Result<Patterns, regex::Error>> = LazyLock::new(Patterns::compile);

static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "about", "above", "after", "again", "against", "all", "almost", "alone", "along",
        "already", "also", "although", "always", "am", "among", "an", "and", "another", "any",
        "anyone", "anything", "anywhere", "are", "around", "as", "at", "be", "became", "because",
        "become", "been", "before", "being", "below", "between", "both", "but", "by", "can",
        "cannot", "could", "did", "do", "does", "doing", "done", "down", "due", "during", "each",
        "either", "else", "enough", "etc", "even", "ever", "every", "few", "for", "from",
        "further", "get", "give", "go", "had", "has", "have", "having", "he", "her", "here",
        "hers", "herself", "him", "himself", "his", "how", "however", "i", "if", "in", "into",
        "is", "it", "its", "itself", "just", "keep", "last", "least", "less", "made", "make",
        "many", "may", "me", "might", "more", "most", "mostly", "much", "must", "my", "myself",
        "namely", "neither", "never", "nevertheless", "next", "no", "nobody", "none", "nor",
        "not", "nothing", "now", "of", "off", "often", "on", "once", "one", "only", "onto", "or",
        "other", "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part",
        "per", "perhaps", "please", "put", "quite", "rather", "really", "regarding", "same",
        "say", "see", "seem", "seemed", "seems", "several", "she", "should", "show", "since",
        "so", "some", "someone", "something", "sometimes", "somewhere", "still", "such", "take",
        "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
        "therefore", "these", "they", "this", "those", "though", "through", "throughout", "thus",
        "to", "together", "too", "toward", "towards", "under", "until", "up", "upon", "us",
        "used", "using", "various", "very", "via", "was", "we", "well", "were", "what",
        "whatever", "when", "whenever", "where", "whereas", "wherever", "whether", "which",
        "while", "who", "whoever", "whole", "whom", "whose", "why", "will", "with", "within",
        "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
    ]
    .into_iter()
    .collect()
});

/// Words ending in `s` that are already in base form.
const PROTECTED: &[&str] = &[
    "analytics", "aws", "css", "devops", "economics", "ethics", "express", "gitops", "graphics",
    "jenkins", "kubernetes", "mathematics", "mlops", "news", "pandas", "physics", "postgres",
    "rails", "redis", "sass", "series", "species", "statistics", "windows", "axis", "tennis",
];

/// Singular endings that look plural (`business`, `status`, `analysis`, `nodejs`).
const KEEPS_S_SUFFIXES: &[&str] = &["ss", "us", "sis", "os", "js"];

const IRREGULAR: &[(&str, &str)] = &[
    ("analyses", "analysis"),
    ("children", "child"),
    ("criteria", "criterion"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("men", "man"),
    ("people", "person"),
    ("women", "woman"),
];

/// Normalizes arbitrary text. Never fails: on internal error it falls back to a plain
/// lowercase-and-trim of the input.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    match try_normalize(text) {
        Ok(normalized) => normalized,
        Err(e) => {
            warn!("Text normalization failed, using minimal cleaning: {e}");
            fallback_clean(text)
        }
    }
}

fn try_normalize(text: &str) -> Result<String, NormalizeError> {
    let patterns = (*PATTERNS).as_ref().map_err(|e| e.clone())?;

    let text = patterns.url.replace_all(text, " ");
    let text = patterns.email.replace_all(&text, " ");
    let text = patterns.disallowed.replace_all(&text, "");
    let text = text.to_lowercase();

    let lemmas: Vec<String> = tokenize(text.trim())
        .into_iter()
        .filter(|token| token.chars().all(|c| c.is_ascii_alphabetic()))
        .filter(|token| !STOP_WORDS.contains(token))
        .map(lemmatize)
        .filter(|lemma| !STOP_WORDS.contains(lemma.as_str()))
        .collect();

    Ok(lemmas.join(" "))
}

fn fallback_clean(text: &str) -> String {
    text.to_lowercase().trim().to_string()
}

/// Runs of ASCII letters/digits form one token; every other non-space character is a
/// token of its own (so `ci/cd` yields `ci`, `/`, `cd`).
fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in text.char_indices() {
        if c.is_ascii_alphanumeric() {
            if start.is_none() {
                start = Some(i);
            }
            continue;
        }
        if let Some(s) = start.take() {
            tokens.push(&text[s..i]);
        }
        if !c.is_whitespace() {
            tokens.push(&text[i..i + c.len_utf8()]);
        }
    }
    if let Some(s) = start {
        tokens.push(&text[s..]);
    }

    tokens
}

/// Rule-based plural → singular, applied until the token stops changing so that a lemma
/// always maps to itself (`womens` → `women` → `woman`).
fn lemmatize(token: &str) -> String {
    let mut current = token.to_string();
    // Every rule either shortens the token or lands on a fixed point.
    loop {
        let next = lemmatize_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn lemmatize_once(token: &str) -> String {
    if PROTECTED.contains(&token) {
        return token.to_string();
    }
    if let Some((_, lemma)) = IRREGULAR.iter().find(|(form, _)| *form == token) {
        return lemma.to_string();
    }

    if token.len() > 4 {
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{stem}y");
        }
        if let Some(stem) = token.strip_suffix("sses") {
            return format!("{stem}ss");
        }
    }

    let keeps_s = KEEPS_S_SUFFIXES
        .iter()
        .any(|suffix| token.ends_with(suffix));
    if token.len() > 3 && !keeps_s {
        if let Some(stem) = token.strip_suffix('s') {
            return stem.to_string();
        }
    }

    token.to_string()
}
