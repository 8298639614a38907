//! Job model for asynchronous content-processing work.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use typed_builder::TypedBuilder;
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

/// Lifecycle status of a processing job.
///
/// Transitions are forward-only; `completed` and `failed` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, Default,
)]
#[sqlx(type_name = "processing_job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether `next` is a legal forward transition from this status.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        matches!(
            (self, next),
            (Pending, Processing)
                | (Pending, Failed)
                | (Processing, Completed)
                | (Processing, Failed)
        )
    }
}

/// The fixed category of work a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "processing_job_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    WebsiteExtraction,
    MarkdownExtraction,
    DocumentConversion,
    ContentLibrary,
    VectorProcessing,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::WebsiteExtraction => "website_extraction",
            JobKind::MarkdownExtraction => "markdown_extraction",
            JobKind::DocumentConversion => "document_conversion",
            JobKind::ContentLibrary => "content_library",
            JobKind::VectorProcessing => "vector_processing",
        }
    }
}

// ============================================================================
// Payload
// ============================================================================

/// Kind-specific work declaration supplied at job creation.
///
/// The variant must agree with the job kind; the declared cardinality becomes
/// the job's `total_items`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobPayload {
    /// A single URL (website_extraction).
    Url(String),
    /// A list of URLs (markdown_extraction). Persisted as seeded result rows,
    /// not on the job row itself.
    Urls(Vec<String>),
    /// A list of filenames (document_conversion).
    Files(Vec<String>),
    /// A list of content-source references (content_library, vector_processing).
    Sources(Vec<Uuid>),
}

impl JobPayload {
    /// Declared item cardinality.
    pub fn item_count(&self) -> usize {
        match self {
            JobPayload::Url(_) => 1,
            JobPayload::Urls(urls) => urls.len(),
            JobPayload::Files(files) => files.len(),
            JobPayload::Sources(ids) => ids.len(),
        }
    }

    /// Whether this payload shape is valid for the given kind.
    pub fn matches_kind(&self, kind: JobKind) -> bool {
        matches!(
            (self, kind),
            (JobPayload::Url(_), JobKind::WebsiteExtraction)
                | (JobPayload::Urls(_), JobKind::MarkdownExtraction)
                | (JobPayload::Files(_), JobKind::DocumentConversion)
                | (JobPayload::Sources(_), JobKind::ContentLibrary)
                | (JobPayload::Sources(_), JobKind::VectorProcessing)
        )
    }

    pub fn source_url(&self) -> Option<String> {
        match self {
            JobPayload::Url(url) => Some(url.clone()),
            _ => None,
        }
    }

    pub fn source_files(&self) -> Option<Vec<String>> {
        match self {
            JobPayload::Files(files) => Some(files.clone()),
            _ => None,
        }
    }

    pub fn source_ids(&self) -> Option<Vec<Uuid>> {
        match self {
            JobPayload::Sources(ids) => Some(ids.clone()),
            _ => None,
        }
    }
}

// ============================================================================
// Job Model
// ============================================================================

/// A tracked unit of asynchronous background work.
///
/// `job_id` is the process-unique identifier referenced by result rows and
/// external callers; `id` is the internal row key and never leaves the store.
#[derive(FromRow, Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[builder(field_defaults(setter(into)))]
pub struct Job {
    #[serde(skip)]
    #[builder(default = 0)]
    pub id: i64,

    #[builder(default = Uuid::new_v4())]
    pub job_id: Uuid,
    pub org_id: Uuid,
    pub job_type: JobKind,

    #[builder(default)]
    pub status: JobStatus,
    #[builder(default = 0)]
    pub total_items: i32,
    #[builder(default = 0)]
    pub completed_items: i32,

    // Kind-specific source locator; at most one populated per row
    #[builder(default, setter(strip_option))]
    pub source_url: Option<String>,
    #[builder(default, setter(strip_option))]
    pub source_files: Option<Vec<String>>,
    #[builder(default, setter(strip_option))]
    pub source_ids: Option<Vec<Uuid>>,

    #[builder(default = serde_json::json!({}))]
    pub metadata: serde_json::Value,

    #[builder(default, setter(strip_option))]
    pub error_message: Option<String>,
    #[builder(default, setter(strip_option))]
    pub created_by: Option<Uuid>,

    #[builder(default = Utc::now())]
    pub created_at: DateTime<Utc>,
    #[builder(default = Utc::now())]
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a pending job row for a validated payload.
    ///
    /// This constructor is used by `JobTracker::create`; the payload's
    /// declared cardinality becomes `total_items`.
    pub fn for_payload(
        org_id: Uuid,
        kind: JobKind,
        payload: &JobPayload,
        created_by: Option<Uuid>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: 0,
            job_id: Uuid::new_v4(),
            org_id,
            job_type: kind,
            status: JobStatus::Pending,
            total_items: payload.item_count() as i32,
            completed_items: 0,
            source_url: payload.source_url(),
            source_files: payload.source_files(),
            source_ids: payload.source_ids(),
            metadata,
            error_message: None,
            created_by,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Job {
    /// Insert this job.
    pub async fn insert(&self, conn: &mut PgConnection) -> sqlx::Result<Self> {
        let job = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO processing_jobs (
                job_id, org_id, job_type, status, total_items, completed_items,
                source_url, source_files, source_ids, metadata, error_message,
                created_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id, job_id, org_id, job_type, status, total_items, completed_items,
                      source_url, source_files, source_ids, metadata, error_message,
                      created_by, created_at, updated_at
            "#,
        )
        .bind(self.job_id)
        .bind(self.org_id)
        .bind(self.job_type)
        .bind(self.status)
        .bind(self.total_items)
        .bind(self.completed_items)
        .bind(&self.source_url)
        .bind(&self.source_files)
        .bind(&self.source_ids)
        .bind(&self.metadata)
        .bind(&self.error_message)
        .bind(self.created_by)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(conn)
        .await?;

        Ok(job)
    }

    /// Find a job by identifier, scoped to its owning organization.
    ///
    /// A job belonging to another organization is indistinguishable from a
    /// nonexistent one.
    pub async fn find_for_org(
        job_id: Uuid,
        org_id: Uuid,
        pool: &PgPool,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, job_id, org_id, job_type, status, total_items, completed_items,
                   source_url, source_files, source_ids, metadata, error_message,
                   created_by, created_at, updated_at
            FROM processing_jobs
            WHERE job_id = $1 AND org_id = $2
            "#,
        )
        .bind(job_id)
        .bind(org_id)
        .fetch_optional(pool)
        .await
    }

    /// Lock a job row for update inside a transaction, scoped by organization.
    ///
    /// Serializes concurrent lifecycle updates for the same job; transition
    /// preconditions are re-validated under this lock.
    pub async fn lock_for_org(
        job_id: Uuid,
        org_id: Uuid,
        conn: &mut PgConnection,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id, job_id, org_id, job_type, status, total_items, completed_items,
                   source_url, source_files, source_ids, metadata, error_message,
                   created_by, created_at, updated_at
            FROM processing_jobs
            WHERE job_id = $1 AND org_id = $2
            FOR UPDATE
            "#,
        )
        .bind(job_id)
        .bind(org_id)
        .fetch_optional(conn)
        .await
    }

    /// Apply a validated lifecycle update.
    ///
    /// Counter arithmetic happens in SQL so concurrent increments commute;
    /// metadata keys merge last-write-wins via `||`.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply_update(
        job_id: Uuid,
        org_id: Uuid,
        increment: i32,
        status: JobStatus,
        error_message: Option<&str>,
        metadata_patch: &serde_json::Value,
        conn: &mut PgConnection,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE processing_jobs
            SET completed_items = completed_items + $3,
                status = $4,
                error_message = COALESCE($5, error_message),
                metadata = metadata || $6,
                updated_at = NOW()
            WHERE job_id = $1 AND org_id = $2
            RETURNING id, job_id, org_id, job_type, status, total_items, completed_items,
                      source_url, source_files, source_ids, metadata, error_message,
                      created_by, created_at, updated_at
            "#,
        )
        .bind(job_id)
        .bind(org_id)
        .bind(increment)
        .bind(status)
        .bind(error_message)
        .bind(metadata_patch)
        .fetch_one(conn)
        .await
    }

    /// Advance the progress counter after a result row write.
    ///
    /// Moves a pending job to processing as a side effect; never performs a
    /// terminal transition.
    pub async fn record_progress(
        job_id: Uuid,
        org_id: Uuid,
        delta: i32,
        conn: &mut PgConnection,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE processing_jobs
            SET completed_items = completed_items + $3,
                status = CASE
                    WHEN status = 'pending' THEN 'processing'::processing_job_status
                    ELSE status
                END,
                updated_at = NOW()
            WHERE job_id = $1 AND org_id = $2
            RETURNING id, job_id, org_id, job_type, status, total_items, completed_items,
                      source_url, source_files, source_ids, metadata, error_message,
                      created_by, created_at, updated_at
            "#,
        )
        .bind(job_id)
        .bind(org_id)
        .bind(delta)
        .fetch_one(conn)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> Job {
        Job::builder()
            .org_id(Uuid::new_v4())
            .job_type(JobKind::MarkdownExtraction)
            .total_items(2)
            .build()
    }

    #[test]
    fn new_job_starts_with_pending_status() {
        let job = sample_job();
        assert_eq!(job.status, JobStatus::Pending);
    }

    #[test]
    fn new_job_has_zero_completed_items() {
        let job = sample_job();
        assert_eq!(job.completed_items, 0);
    }

    #[test]
    fn new_job_has_empty_metadata() {
        let job = sample_job();
        assert_eq!(job.metadata, serde_json::json!({}));
    }

    #[test]
    fn forward_transitions_are_legal() {
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Processing));
        assert!(JobStatus::Pending.can_transition_to(JobStatus::Failed));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Completed));
        assert!(JobStatus::Processing.can_transition_to(JobStatus::Failed));
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        for next in [
            JobStatus::Pending,
            JobStatus::Processing,
            JobStatus::Completed,
            JobStatus::Failed,
        ] {
            assert!(!JobStatus::Completed.can_transition_to(next));
            assert!(!JobStatus::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn pending_cannot_jump_straight_to_completed() {
        assert!(!JobStatus::Pending.can_transition_to(JobStatus::Completed));
    }

    #[test]
    fn backward_transitions_are_illegal() {
        assert!(!JobStatus::Processing.can_transition_to(JobStatus::Pending));
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
    }

    #[test]
    fn payload_cardinality_matches_declaration() {
        assert_eq!(JobPayload::Url("https://a.example".into()).item_count(), 1);
        assert_eq!(
            JobPayload::Urls(vec!["a".into(), "b".into()]).item_count(),
            2
        );
        assert_eq!(JobPayload::Files(vec![]).item_count(), 0);
        assert_eq!(
            JobPayload::Sources(vec![Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()])
                .item_count(),
            3
        );
    }

    #[test]
    fn payload_shape_must_agree_with_kind() {
        let url = JobPayload::Url("https://a.example".into());
        assert!(url.matches_kind(JobKind::WebsiteExtraction));
        assert!(!url.matches_kind(JobKind::MarkdownExtraction));

        let sources = JobPayload::Sources(vec![Uuid::new_v4()]);
        assert!(sources.matches_kind(JobKind::ContentLibrary));
        assert!(sources.matches_kind(JobKind::VectorProcessing));
        assert!(!sources.matches_kind(JobKind::DocumentConversion));
    }

    #[test]
    fn kind_serializes_to_wire_values() {
        assert_eq!(
            serde_json::to_value(JobKind::WebsiteExtraction).unwrap(),
            serde_json::json!("website_extraction")
        );
        assert_eq!(
            serde_json::to_value(JobKind::VectorProcessing).unwrap(),
            serde_json::json!("vector_processing")
        );
        assert_eq!(JobKind::ContentLibrary.as_str(), "content_library");
    }

    #[test]
    fn status_serializes_to_wire_values() {
        assert_eq!(
            serde_json::to_value(JobStatus::Pending).unwrap(),
            serde_json::json!("pending")
        );
        assert_eq!(JobStatus::Processing.as_str(), "processing");
        assert_eq!(JobStatus::Completed.as_str(), "completed");
        assert_eq!(JobStatus::Failed.as_str(), "failed");
    }
}
