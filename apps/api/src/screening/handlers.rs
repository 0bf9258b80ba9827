//! Axum route handlers for the Screening API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};

use crate::db::{self, TableCounts};
use crate::errors::AppError;
use crate::models::screening::{CvRow, JdRow, MatchRow};
use crate::screening::analysis::{persist_analysis, run_analysis, Analysis, StoredAnalysis};
use crate::screening::bias::{detect_bias, BiasReport};
use crate::screening::keywords::{canonical_keywords, extract_keywords, DocType, KeywordSet};
use crate::screening::scoring::{score, MatchResult};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 100;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AnalysisRequest {
    pub jd_text: String,
    pub cv_text: String,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    #[serde(flatten)]
    pub stored: StoredAnalysis,
    #[serde(flatten)]
    pub analysis: Analysis,
}

#[derive(Debug, Deserialize)]
pub struct KeywordsRequest {
    pub text: String,
    #[serde(default)]
    pub doc_type: DocType,
}

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub doc_type: DocType,
    pub keywords: KeywordSet,
}

#[derive(Debug, Deserialize)]
pub struct BiasRequest {
    pub text: String,
}

/// Client-supplied sets are canonicalized on the way in, so `" Python"` and `"python"`
/// count once.
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    #[serde(deserialize_with = "canonical_keyword_set")]
    pub jd_keywords: KeywordSet,
    #[serde(deserialize_with = "canonical_keyword_set")]
    pub cv_keywords: KeywordSet,
}

fn canonical_keyword_set<'de, D>(deserializer: D) -> Result<KeywordSet, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(canonical_keywords(raw.iter().map(String::as_str)))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses
///
/// Full run: extract JD and CV keywords, score, audit the JD, then persist all three rows.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    if request.jd_text.trim().is_empty() || request.cv_text.trim().is_empty() {
        return Err(AppError::Validation(
            "Both jd_text and cv_text are required".to_string(),
        ));
    }

    let analysis = run_analysis(&request.jd_text, &request.cv_text, &state.llm).await;
    let stored = persist_analysis(&state.db, &request.jd_text, &request.cv_text, &analysis).await?;

    Ok(Json(AnalysisResponse { stored, analysis }))
}

/// POST /api/v1/keywords
///
/// Keyword preview for a single document. Nothing is stored.
pub async fn handle_extract_keywords(
    State(state): State<AppState>,
    Json(request): Json<KeywordsRequest>,
) -> Result<Json<KeywordsResponse>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    let keywords = extract_keywords(&request.text, request.doc_type, &state.llm).await;

    Ok(Json(KeywordsResponse {
        doc_type: request.doc_type,
        keywords,
    }))
}

/// POST /api/v1/bias
///
/// Returns the report as-is; an audit failure is a 200 with the `error` shape.
pub async fn handle_detect_bias(
    State(state): State<AppState>,
    Json(request): Json<BiasRequest>,
) -> Result<Json<BiasReport>, AppError> {
    if request.text.trim().is_empty() {
        return Err(AppError::Validation("text cannot be empty".to_string()));
    }

    Ok(Json(detect_bias(&request.text, &state.llm).await))
}

/// POST /api/v1/match
pub async fn handle_match(Json(request): Json<MatchRequest>) -> Json<MatchResult> {
    Json(score(&request.jd_keywords, &request.cv_keywords))
}

/// GET /api/v1/stats
pub async fn handle_stats(State(state): State<AppState>) -> Result<Json<TableCounts>, AppError> {
    Ok(Json(db::table_counts(&state.db).await?))
}

/// GET /api/v1/matches?limit=N
pub async fn handle_recent_matches(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MatchRow>>, AppError> {
    let limit = history_limit(query.limit)?;
    Ok(Json(db::recent_matches(&state.db, limit).await?))
}

/// GET /api/v1/jds/:id
pub async fn handle_get_jd(
    State(state): State<AppState>,
    Path(jd_id): Path<i64>,
) -> Result<Json<JdRow>, AppError> {
    db::get_jd(&state.db, jd_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("JD {jd_id} not found")))
}

/// GET /api/v1/cvs/:id
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Path(cv_id): Path<i64>,
) -> Result<Json<CvRow>, AppError> {
    db::get_cv(&state.db, cv_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("CV {cv_id} not found")))
}

fn history_limit(requested: Option<i64>) -> Result<i64, AppError> {
    match requested {
        None => Ok(DEFAULT_HISTORY_LIMIT),
        Some(n) if (1..=MAX_HISTORY_LIMIT).contains(&n) => Ok(n),
        Some(n) => Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_HISTORY_LIMIT}, got {n}"
        ))),
    }
}
