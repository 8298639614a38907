//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use server_core::domains::organization::models::Organization;
use server_core::kernel::jobs::{Job, JobKind, JobPayload, JobTracker};

/// Create a test organization
pub async fn create_test_org(pool: &PgPool, name: &str) -> Result<Uuid> {
    let org = Organization {
        id: Uuid::new_v4(),
        name: name.to_string(),
        domain: None,
        website: None,
        logo: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    let org = org.insert(pool).await?;
    Ok(org.id)
}

/// Create a markdown extraction job for the given URLs
pub async fn create_markdown_job(pool: &PgPool, org_id: Uuid, urls: &[&str]) -> Result<Job> {
    let tracker = JobTracker::new(pool.clone());
    let job = tracker
        .create(
            org_id,
            JobKind::MarkdownExtraction,
            JobPayload::Urls(urls.iter().map(|url| url.to_string()).collect()),
            None,
            None,
        )
        .await?;

    Ok(job)
}

/// Count the processing jobs visible for an organization
pub async fn count_jobs_for_org(pool: &PgPool, org_id: Uuid) -> Result<i64> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM processing_jobs WHERE org_id = $1")
            .bind(org_id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}
