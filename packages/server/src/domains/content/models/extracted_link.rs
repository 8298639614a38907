use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// A link discovered on a page during markdown extraction.
///
/// Children of a markdown_content row; carry no status of their own.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExtractedLink {
    #[serde(skip)]
    pub id: i64,
    pub org_id: Uuid,
    pub job_id: Uuid,
    pub url: String,
    pub link: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl ExtractedLink {
    /// Store the links found on one URL.
    pub async fn insert_many(
        org_id: Uuid,
        job_id: Uuid,
        url: &str,
        links: &[String],
        conn: &mut PgConnection,
    ) -> sqlx::Result<u64> {
        let inserted = sqlx::query(
            r#"
            INSERT INTO extracted_links (org_id, job_id, url, link)
            SELECT $1, $2, $3, link
            FROM UNNEST($4::text[]) AS link
            "#,
        )
        .bind(org_id)
        .bind(job_id)
        .bind(url)
        .bind(links)
        .execute(conn)
        .await?
        .rows_affected();

        Ok(inserted)
    }

    /// All links for a job, tenant-scoped.
    pub async fn find_by_job(
        job_id: Uuid,
        org_id: Uuid,
        pool: &PgPool,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM extracted_links WHERE job_id = $1 AND org_id = $2 ORDER BY id",
        )
        .bind(job_id)
        .bind(org_id)
        .fetch_all(pool)
        .await
    }
}
