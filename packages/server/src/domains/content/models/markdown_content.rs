use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::kernel::jobs::JobStatus;

/// Per-URL markdown output for a markdown_extraction job.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MarkdownContent {
    #[serde(skip)]
    pub id: i64,
    pub org_id: Uuid,
    pub job_id: Uuid,
    pub url: String,
    pub markdown_text: Option<String>,
    pub html: Option<String>,
    pub screenshot: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl MarkdownContent {
    /// Seed one pending row per declared URL at job creation.
    pub async fn seed_many(
        org_id: Uuid,
        job_id: Uuid,
        urls: &[String],
        conn: &mut PgConnection,
    ) -> sqlx::Result<u64> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO markdown_content (org_id, job_id, url, status)
            SELECT $1, $2, url, 'pending'::processing_job_status
            FROM UNNEST($3::text[]) AS url
            "#,
        )
        .bind(org_id)
        .bind(job_id)
        .bind(urls)
        .execute(conn)
        .await?
        .rows_affected();

        Ok(inserted)
    }

    /// Record a worker's result on the seeded row for one URL.
    ///
    /// Returns None when no row exists for this job/url pair.
    pub async fn mark_result(
        job_id: Uuid,
        org_id: Uuid,
        url: &str,
        markdown_text: Option<&str>,
        html: Option<&str>,
        screenshot: Option<&str>,
        metadata: Option<&serde_json::Value>,
        status: JobStatus,
        conn: &mut PgConnection,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE markdown_content
            SET markdown_text = COALESCE($4, markdown_text),
                html = COALESCE($5, html),
                screenshot = COALESCE($6, screenshot),
                metadata = COALESCE($7, metadata),
                status = $8,
                updated_at = NOW()
            WHERE job_id = $1 AND org_id = $2 AND url = $3
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(org_id)
        .bind(url)
        .bind(markdown_text)
        .bind(html)
        .bind(screenshot)
        .bind(metadata)
        .bind(status)
        .fetch_optional(conn)
        .await
    }

    /// All rows for a job, tenant-scoped.
    pub async fn find_by_job(
        job_id: Uuid,
        org_id: Uuid,
        pool: &PgPool,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM markdown_content WHERE job_id = $1 AND org_id = $2 ORDER BY id",
        )
        .bind(job_id)
        .bind(org_id)
        .fetch_all(pool)
        .await
    }
}
