use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JdRow {
    pub jd_id: i64,
    pub jd_text: String,
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvRow {
    pub cv_id: i64,
    pub cv_text: String,
    pub keywords: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MatchRow {
    pub match_id: i64,
    pub jd_id: i64,
    pub cv_id: i64,
    pub ats_score: f64,
}
