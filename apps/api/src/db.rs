use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::models::screening::{CvRow, JdRow, MatchRow};

/// Creates and returns a PostgreSQL connection pool.
pub async fn create_pool(database_url: &str) -> Result<PgPool> {
    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS jds (
        jd_id BIGSERIAL PRIMARY KEY,
        jd_text TEXT NOT NULL,
        keywords TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cvs (
        cv_id BIGSERIAL PRIMARY KEY,
        cv_text TEXT NOT NULL,
        keywords TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS matches (
        match_id BIGSERIAL PRIMARY KEY,
        jd_id BIGINT NOT NULL REFERENCES jds (jd_id),
        cv_id BIGINT NOT NULL REFERENCES cvs (cv_id),
        ats_score DOUBLE PRECISION NOT NULL
    )
    "#,
];

/// Creates the `jds`, `cvs` and `matches` tables if they do not exist yet.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    // One statement per query: prepared statements cannot hold several commands
    for statement in SCHEMA {
        sqlx::query(*statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}

pub async fn insert_jd(
    conn: &mut PgConnection,
    jd_text: &str,
    keywords: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("INSERT INTO jds (jd_text, keywords) VALUES ($1, $2) RETURNING jd_id")
        .bind(jd_text)
        .bind(keywords)
        .fetch_one(conn)
        .await
}

pub async fn insert_cv(
    conn: &mut PgConnection,
    cv_text: &str,
    keywords: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("INSERT INTO cvs (cv_text, keywords) VALUES ($1, $2) RETURNING cv_id")
        .bind(cv_text)
        .bind(keywords)
        .fetch_one(conn)
        .await
}

pub async fn insert_match(
    conn: &mut PgConnection,
    jd_id: i64,
    cv_id: i64,
    ats_score: f64,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO matches (jd_id, cv_id, ats_score) VALUES ($1, $2, $3) RETURNING match_id",
    )
    .bind(jd_id)
    .bind(cv_id)
    .bind(ats_score)
    .fetch_one(conn)
    .await
}

pub async fn get_jd(pool: &PgPool, jd_id: i64) -> Result<Option<JdRow>, sqlx::Error> {
    sqlx::query_as::<_, JdRow>("SELECT jd_id, jd_text, keywords FROM jds WHERE jd_id = $1")
        .bind(jd_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_cv(pool: &PgPool, cv_id: i64) -> Result<Option<CvRow>, sqlx::Error> {
    sqlx::query_as::<_, CvRow>("SELECT cv_id, cv_text, keywords FROM cvs WHERE cv_id = $1")
        .bind(cv_id)
        .fetch_optional(pool)
        .await
}

pub async fn recent_matches(pool: &PgPool, limit: i64) -> Result<Vec<MatchRow>, sqlx::Error> {
    sqlx::query_as::<_, MatchRow>(
        "SELECT match_id, jd_id, cv_id, ats_score FROM matches ORDER BY match_id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct TableCounts {
    pub jd_count: i64,
    pub cv_count: i64,
    pub match_count: i64,
}

pub async fn table_counts(pool: &PgPool) -> Result<TableCounts, sqlx::Error> {
    let (jd_count, cv_count, match_count): (i64, i64, i64) = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM jds),
            (SELECT COUNT(*) FROM cvs),
            (SELECT COUNT(*) FROM matches)
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(TableCounts {
        jd_count,
        cv_count,
        match_count,
    })
}
