use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::kernel::jobs::JobStatus;

/// Per-file markdown output for a document_conversion job.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DocumentContent {
    #[serde(skip)]
    pub id: i64,
    pub org_id: Uuid,
    pub job_id: Uuid,
    pub filename: String,
    pub markdown_text: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl DocumentContent {
    /// Seed one pending row per declared filename at job creation.
    pub async fn seed_many(
        org_id: Uuid,
        job_id: Uuid,
        filenames: &[String],
        conn: &mut PgConnection,
    ) -> sqlx::Result<u64> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO document_content (org_id, job_id, filename, status)
            SELECT $1, $2, filename, 'pending'::processing_job_status
            FROM UNNEST($3::text[]) AS filename
            "#,
        )
        .bind(org_id)
        .bind(job_id)
        .bind(filenames)
        .execute(conn)
        .await?
        .rows_affected();

        Ok(inserted)
    }

    /// Record a worker's result on the seeded row for one file.
    ///
    /// Returns None when no row exists for this job/filename pair.
    pub async fn mark_result(
        job_id: Uuid,
        org_id: Uuid,
        filename: &str,
        markdown_text: Option<&str>,
        metadata: Option<&serde_json::Value>,
        status: JobStatus,
        conn: &mut PgConnection,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE document_content
            SET markdown_text = COALESCE($4, markdown_text),
                metadata = COALESCE($5, metadata),
                status = $6,
                updated_at = NOW()
            WHERE job_id = $1 AND org_id = $2 AND filename = $3
            RETURNING *
            "#,
        )
        .bind(job_id)
        .bind(org_id)
        .bind(filename)
        .bind(markdown_text)
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
            "SELECT * FROM document_content WHERE job_id = $1 AND org_id = $2 ORDER BY id",
        )
        .bind(job_id)
        .bind(org_id)
        .fetch_all(pool)
        .await
    }
}
