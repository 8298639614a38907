use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::kernel::jobs::JobStatus;

/// Structured output for one content source of a content_library job.
///
/// Not seeded at creation; the structuring worker inserts rows as it goes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContentLibraryResult {
    #[serde(skip)]
    pub id: i64,
    pub org_id: Uuid,
    pub job_id: Uuid,
    pub source_id: Uuid,
    pub content: Option<serde_json::Value>,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ContentLibraryResult {
    /// Insert a result row for one processed content source.
    pub async fn insert(
        org_id: Uuid,
        job_id: Uuid,
        source_id: Uuid,
        content: Option<&serde_json::Value>,
        status: JobStatus,
        conn: &mut PgConnection,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO content_library_results (org_id, job_id, source_id, content, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(org_id)
        .bind(job_id)
        .bind(source_id)
        .bind(content)
        .bind(status)
        .fetch_one(conn)
        .await
    }

    /// All rows for a job, tenant-scoped.
    pub async fn find_by_job(
        job_id: Uuid,
        org_id: Uuid,
        pool: &PgPool,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM content_library_results WHERE job_id = $1 AND org_id = $2 ORDER BY id",
        )
        .bind(job_id)
        .bind(org_id)
        .fetch_all(pool)
        .await
    }
}
