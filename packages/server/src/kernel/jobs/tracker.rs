//! Single authority for job existence, status, and progress.

use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::JobError;
use crate::domains::content::models::{
    ContentLibraryResult, DocumentContent, ExtractedLink, ExtractionContent, MarkdownContent,
};
use crate::domains::organization::models::Organization;

use super::job::{Job, JobKind, JobPayload, JobStatus};

// ============================================================================
// Operation inputs
// ============================================================================

/// Partial lifecycle update applied by `JobTracker::update`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub increment_completed: Option<i32>,
    pub error_message: Option<String>,
    pub metadata: Option<JsonValue>,
}

/// Per-item terminal status a worker reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemOutcome {
    Completed,
    Failed,
}

impl ItemOutcome {
    fn as_row_status(self) -> JobStatus {
        match self {
            ItemOutcome::Completed => JobStatus::Completed,
            ItemOutcome::Failed => JobStatus::Failed,
        }
    }
}

/// Kind-specific result content for one item of a job.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum ItemResult {
    Extraction {
        url: String,
        extraction_data: Option<JsonValue>,
    },
    Markdown {
        url: String,
        markdown_text: Option<String>,
        html: Option<String>,
        screenshot: Option<String>,
        metadata: Option<JsonValue>,
        links: Option<Vec<String>>,
    },
    Document {
        filename: String,
        markdown_text: Option<String>,
        metadata: Option<JsonValue>,
    },
    ContentLibrary {
        source_id: Uuid,
        content: Option<JsonValue>,
    },
}

impl ItemResult {
    /// Whether this item shape is valid for the given job kind.
    ///
    /// vector_processing jobs have no result rows here (chunks live in an
    /// external store); their progress advances via `update` increments.
    pub fn matches_kind(&self, kind: JobKind) -> bool {
        matches!(
            (self, kind),
            (ItemResult::Extraction { .. }, JobKind::WebsiteExtraction)
                | (ItemResult::Markdown { .. }, JobKind::MarkdownExtraction)
                | (ItemResult::Document { .. }, JobKind::DocumentConversion)
                | (ItemResult::ContentLibrary { .. }, JobKind::ContentLibrary)
        )
    }
}

// ============================================================================
// Job Tracker
// ============================================================================

/// The only writer of job lifecycle fields.
///
/// Every operation is scoped by `(job_id, org_id)`; a job belonging to
/// another organization is indistinguishable from a nonexistent one.
#[derive(Clone)]
pub struct JobTracker {
    pool: PgPool,
}

impl JobTracker {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Register a new unit of asynchronous work.
    ///
    /// The job is persisted as `pending` with its per-item result rows seeded
    /// in the same transaction; the actual work happens out-of-band.
    pub async fn create(
        &self,
        org_id: Uuid,
        kind: JobKind,
        payload: JobPayload,
        created_by: Option<Uuid>,
        metadata: Option<JsonValue>,
    ) -> Result<Job, JobError> {
        if payload.item_count() == 0 {
            return Err(JobError::Validation(
                "payload declares no items".to_string(),
            ));
        }
        if !payload.matches_kind(kind) {
            return Err(JobError::Validation(format!(
                "payload shape does not match job type {}",
                kind.as_str()
            )));
        }
        let metadata = metadata.unwrap_or_else(|| serde_json::json!({}));
        if !metadata.is_object() {
            return Err(JobError::Validation(
                "metadata must be an object".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        if !Organization::exists(org_id, &mut tx).await? {
            return Err(JobError::NotFound);
        }

        let job = Job::for_payload(org_id, kind, &payload, created_by, metadata);
        let job = job.insert(&mut tx).await?;

        match &payload {
            JobPayload::Url(url) => {
                ExtractionContent::seed(org_id, job.job_id, url, &mut tx).await?;
            }
            JobPayload::Urls(urls) => {
                MarkdownContent::seed_many(org_id, job.job_id, urls, &mut tx).await?;
            }
            JobPayload::Files(files) => {
                DocumentContent::seed_many(org_id, job.job_id, files, &mut tx).await?;
            }
            JobPayload::Sources(_) => {}
        }

        tx.commit().await?;

        tracing::info!(
            job_id = %job.job_id,
            job_type = kind.as_str(),
            total_items = job.total_items,
            "created processing job"
        );

        Ok(job)
    }

    /// Read a job's current state as a single consistent snapshot.
    pub async fn get(&self, job_id: Uuid, org_id: Uuid) -> Result<Job, JobError> {
        Job::find_for_org(job_id, org_id, &self.pool)
            .await?
            .ok_or(JobError::NotFound)
    }

    /// Apply a partial lifecycle update.
    ///
    /// Transition preconditions are re-validated under a row lock, so racing
    /// finalizers cannot both succeed; a retry of the job's current status is
    /// an idempotent no-op.
    pub async fn update(
        &self,
        job_id: Uuid,
        org_id: Uuid,
        update: JobUpdate,
    ) -> Result<Job, JobError> {
        let increment = update.increment_completed.unwrap_or(0);
        if increment < 0 {
            return Err(JobError::Validation(
                "increment_completed must be non-negative".to_string(),
            ));
        }
        if update.error_message.is_some() && update.status != Some(JobStatus::Failed) {
            return Err(JobError::Validation(
                "error_message is only valid when failing a job".to_string(),
            ));
        }
        if let Some(patch) = &update.metadata {
            if !patch.is_object() {
                return Err(JobError::Validation(
                    "metadata patch must be an object".to_string(),
                ));
            }
        }

        let empty_patch = serde_json::json!({});

        let mut tx = self.pool.begin().await?;
        let current = Job::lock_for_org(job_id, org_id, &mut tx)
            .await?
            .ok_or(JobError::NotFound)?;

        // Idempotent retry: requesting the current status with nothing else to
        // apply leaves the job unchanged apart from its update timestamp.
        if update.status == Some(current.status) && increment == 0 && update.metadata.is_none() {
            let job =
                Job::apply_update(job_id, org_id, 0, current.status, None, &empty_patch, &mut tx)
                    .await?;
            tx.commit().await?;
            return Ok(job);
        }

        if current.status.is_terminal() {
            return Err(JobError::Conflict(format!(
                "job is already {}",
                current.status.as_str()
            )));
        }

        if current.completed_items + increment > current.total_items {
            return Err(JobError::Conflict(format!(
                "{} of {} items would be completed",
                current.completed_items + increment,
                current.total_items
            )));
        }

        let target = match update.status {
            None => current.status,
            Some(next) if next == current.status => next,
            Some(next) => {
                if !current.status.can_transition_to(next) {
                    return Err(JobError::Conflict(format!(
                        "illegal transition {} -> {}",
                        current.status.as_str(),
                        next.as_str()
                    )));
                }
                // Completion is only valid once every declared item is done,
                // checked here under the row lock rather than trusted from the
                // caller's claim.
                if next == JobStatus::Completed
                    && current.completed_items + increment != current.total_items
                {
                    return Err(JobError::Conflict(format!(
                        "job has {} of {} items completed",
                        current.completed_items + increment,
                        current.total_items
                    )));
                }
                next
            }
        };

        let error_message = if target == JobStatus::Failed {
            update.error_message.as_deref()
        } else {
            None
        };
        let patch = update.metadata.as_ref().unwrap_or(&empty_patch);

        let job =
            Job::apply_update(job_id, org_id, increment, target, error_message, patch, &mut tx)
                .await?;
        tx.commit().await?;

        tracing::info!(
            job_id = %job_id,
            status = job.status.as_str(),
            completed_items = job.completed_items,
            "updated processing job"
        );

        Ok(job)
    }

    /// Record one item's result row and advance the parent job's counter.
    ///
    /// The row write and the counter increment share one transaction: a
    /// result row is durable iff the counter reflects it. A failed item is
    /// recorded without an increment. Never performs a terminal transition.
    pub async fn record_item(
        &self,
        job_id: Uuid,
        org_id: Uuid,
        item: ItemResult,
        outcome: ItemOutcome,
    ) -> Result<Job, JobError> {
        let mut tx = self.pool.begin().await?;
        let current = Job::lock_for_org(job_id, org_id, &mut tx)
            .await?
            .ok_or(JobError::NotFound)?;

        if current.status.is_terminal() {
            return Err(JobError::Conflict(format!(
                "job is already {}",
                current.status.as_str()
            )));
        }
        if !item.matches_kind(current.job_type) {
            return Err(JobError::Validation(format!(
                "item shape does not match job type {}",
                current.job_type.as_str()
            )));
        }

        let delta = match outcome {
            ItemOutcome::Completed => 1,
            ItemOutcome::Failed => 0,
        };
        if current.completed_items + delta > current.total_items {
            return Err(JobError::Conflict(format!(
                "{} of {} items would be completed",
                current.completed_items + delta,
                current.total_items
            )));
        }

        let row_status = outcome.as_row_status();
        match &item {
            ItemResult::Extraction {
                url,
                extraction_data,
            } => {
                ExtractionContent::mark_result(
                    job_id,
                    org_id,
                    url,
                    extraction_data.as_ref(),
                    row_status,
                    &mut tx,
                )
                .await?
                .ok_or_else(|| {
                    JobError::Validation(format!("no extraction row for url {url}"))
                })?;
            }
            ItemResult::Markdown {
                url,
                markdown_text,
                html,
                screenshot,
                metadata,
                links,
            } => {
                MarkdownContent::mark_result(
                    job_id,
                    org_id,
                    url,
                    markdown_text.as_deref(),
                    html.as_deref(),
                    screenshot.as_deref(),
                    metadata.as_ref(),
                    row_status,
                    &mut tx,
                )
                .await?
                .ok_or_else(|| JobError::Validation(format!("no markdown row for url {url}")))?;

                if let Some(links) = links {
                    if !links.is_empty() {
                        ExtractedLink::insert_many(org_id, job_id, url, links, &mut tx).await?;
                    }
                }
            }
            ItemResult::Document {
                filename,
                markdown_text,
                metadata,
            } => {
                DocumentContent::mark_result(
                    job_id,
                    org_id,
                    filename,
                    markdown_text.as_deref(),
                    metadata.as_ref(),
                    row_status,
                    &mut tx,
                )
                .await?
                .ok_or_else(|| {
                    JobError::Validation(format!("no document row for filename {filename}"))
                })?;
            }
            ItemResult::ContentLibrary { source_id, content } => {
                ContentLibraryResult::insert(
                    org_id,
                    job_id,
                    *source_id,
                    content.as_ref(),
                    row_status,
                    &mut tx,
                )
                .await?;
            }
        }

        let job = Job::record_progress(job_id, org_id, delta, &mut tx).await?;
        tx.commit().await?;

        tracing::debug!(
            job_id = %job_id,
            completed_items = job.completed_items,
            total_items = job.total_items,
            "recorded item result"
        );

        Ok(job)
    }
}
