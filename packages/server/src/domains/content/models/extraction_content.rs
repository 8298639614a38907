use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::kernel::jobs::JobStatus;

/// Structured extraction output for a website_extraction job.
///
/// `color_palette` is written later by the external color-extraction
/// collaborator, not by the worker that completes the row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExtractionContent {
    #[serde(skip)]
    pub id: i64,
    pub org_id: Uuid,
    pub job_id: Uuid,
    pub url: String,
    pub extraction_data: Option<serde_json::Value>,
    pub color_palette: Option<serde_json::Value>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ExtractionContent {
    /// Seed a pending row at job creation.
    pub async fn seed(
        org_id: Uuid,
        job_id: Uuid,
        url: &str,
        conn: &mut PgConnection,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO extraction_content (org_id, job_id, url, status)
            VALUES ($1, $2, $3, 'pending')
            RETURNING *
            "#,
        )
        .bind(org_id)
        .bind(job_id)
        .bind(url)
        .fetch_one(conn)
        .await
    }

    /// Record a worker's result on the seeded row.
    ///
    /// Returns None when no row exists for this job/url pair.
    pub async fn mark_result(
        job_id: Uuid,
        org_id: Uuid,
        url: &str,
        extraction_data: Option<&serde_json::Value>,
        status: JobStatus,
        conn: &mut PgConnection,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE extraction_content
            SET extraction_data = COALESCE($4, extraction_data),
                status = $5,
                updated_at = NOW()
            WHERE job_id = $1 AND org_id = $2 AND url = $3
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(org_id)
        .bind(url)
        .bind(extraction_data)
        .bind(status)
        .fetch_optional(conn)
        .await
    }

    /// Attach a color palette produced by the external palette collaborator.
    pub async fn set_color_palette(
        job_id: Uuid,
        org_id: Uuid,
        colors: &serde_json::Value,
        pool: &PgPool,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE extraction_content
            SET color_palette = $3,
                updated_at = NOW()
            WHERE job_id = $1 AND org_id = $2
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(org_id)
        .bind(colors)
        .fetch_optional(pool)
        .await
    }

    /// All rows for a job, tenant-scoped.
    pub async fn find_by_job(
        job_id: Uuid,
        org_id: Uuid,
        pool: &PgPool,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM extraction_content WHERE job_id = $1 AND org_id = $2 ORDER BY id",
        )
        .bind(job_id)
        .bind(org_id)
        .fetch_all(pool)
        .await
    }
}
