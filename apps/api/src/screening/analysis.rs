//! Analysis run — one request-scoped pass over a JD/CV pair.
//!
//! Flow: extract JD keywords → extract CV keywords → score → audit JD for bias.
//! The three model calls run sequentially. Extraction failures degrade to an empty set
//! (and therefore a zero score) but are recorded in `warnings`; bias failures come back
//! as the error-shaped report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};

use crate::db;
use crate::llm_client::LlmClient;
use crate::screening::bias::{detect_bias, BiasReport};
use crate::screening::keywords::{keywords_display, try_extract_keywords, DocType, KeywordSet};
use crate::screening::scoring::{score, MatchResult};

#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub jd_keywords: KeywordSet,
    pub cv_keywords: KeywordSet,
    pub match_result: MatchResult,
    pub bias: BiasReport,
    /// Extraction failures, one line per failed document. Empty on a clean run.
    pub warnings: Vec<String>,
    pub analyzed_at: DateTime<Utc>,
}

pub async fn run_analysis(jd_text: &str, cv_text: &str, llm: &LlmClient) -> Analysis {
    let mut warnings = Vec::new();

    let jd_keywords = extract_or_warn(jd_text, DocType::Jd, llm, &mut warnings).await;
    let cv_keywords = extract_or_warn(cv_text, DocType::Cv, llm, &mut warnings).await;

    let match_result = score(&jd_keywords, &cv_keywords);
    info!(
        "ATS score {:.2} ({} of {} JD keywords matched)",
        match_result.score,
        match_result.matched.len(),
        jd_keywords.len()
    );

    let bias = detect_bias(jd_text, llm).await;
    if bias.is_error() {
        warn!("Analysis finished without a bias report");
    }

    Analysis {
        jd_keywords,
        cv_keywords,
        match_result,
        bias,
        warnings,
        analyzed_at: Utc::now(),
    }
}

/// Identifiers assigned to one persisted analysis.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoredAnalysis {
    pub jd_id: i64,
    pub cv_id: i64,
    pub match_id: i64,
}

/// Stores the JD, the CV and their match in one transaction. Nothing is kept if any
/// insert fails.
pub async fn persist_analysis(
    pool: &PgPool,
    jd_text: &str,
    cv_text: &str,
    analysis: &Analysis,
) -> Result<StoredAnalysis, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let jd_id = db::insert_jd(&mut *tx, jd_text, &keywords_display(&analysis.jd_keywords)).await?;
    let cv_id = db::insert_cv(&mut *tx, cv_text, &keywords_display(&analysis.cv_keywords)).await?;
    let match_id = db::insert_match(&mut *tx, jd_id, cv_id, analysis.match_result.score).await?;

    tx.commit().await?;
    info!("Analysis saved (jd {jd_id}, cv {cv_id}, match {match_id})");

    Ok(StoredAnalysis {
        jd_id,
        cv_id,
        match_id,
    })
}

async fn extract_or_warn(
    text: &str,
    doc_type: DocType,
    llm: &LlmClient,
    warnings: &mut Vec<String>,
) -> KeywordSet {
    match try_extract_keywords(text, doc_type, llm).await {
        Ok(keywords) => keywords,
        Err(e) => {
            warn!("{e}");
            warnings.push(e.to_string());
            KeywordSet::new()
        }
    }
}
