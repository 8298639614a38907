//! Job lifecycle endpoints consumed by workers and status-polling clients.

use std::collections::HashMap;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use uuid::Uuid;

use crate::common::JobError;
use crate::domains::content::models::{
    ContentLibraryResult, DocumentContent, ExtractedLink, ExtractionContent, MarkdownContent,
};
use crate::kernel::jobs::{ItemOutcome, ItemResult, Job, JobKind, JobPayload, JobUpdate};
use crate::server::app::AppState;
use crate::server::middleware::OrgContext;

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            JobError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            JobError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            JobError::Conflict(_) => (StatusCode::CONFLICT, self.to_string()),
            JobError::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                // Callers see a retryable 500; details stay in the logs.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

// ============================================================================
// Request / response bodies
// ============================================================================

/// Request body for job creation.
///
/// Exactly one of the source fields must be present, matching `job_type`.
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub job_type: JobKind,
    pub source_url: Option<String>,
    pub source_urls: Option<Vec<String>>,
    pub source_files: Option<Vec<String>>,
    pub source_ids: Option<Vec<Uuid>>,
    pub metadata: Option<JsonValue>,
    pub created_by: Option<Uuid>,
}

impl CreateJobRequest {
    fn into_parts(self) -> Result<(JobKind, JobPayload, Option<Uuid>, Option<JsonValue>), JobError> {
        let kind = self.job_type;
        let payload = match kind {
            JobKind::WebsiteExtraction => JobPayload::Url(self.source_url.ok_or_else(|| {
                JobError::Validation("source_url is required for website_extraction".to_string())
            })?),
            JobKind::MarkdownExtraction => JobPayload::Urls(self.source_urls.ok_or_else(|| {
                JobError::Validation("source_urls is required for markdown_extraction".to_string())
            })?),
            JobKind::DocumentConversion => JobPayload::Files(self.source_files.ok_or_else(|| {
                JobError::Validation("source_files is required for document_conversion".to_string())
            })?),
            JobKind::ContentLibrary | JobKind::VectorProcessing => {
                JobPayload::Sources(self.source_ids.ok_or_else(|| {
                    JobError::Validation(format!(
                        "source_ids is required for {}",
                        kind.as_str()
                    ))
                })?)
            }
        };

        Ok((kind, payload, self.created_by, self.metadata))
    }
}

/// Request body for recording one item's result.
#[derive(Debug, Deserialize)]
pub struct RecordItemRequest {
    pub outcome: ItemOutcome,
    #[serde(flatten)]
    pub item: ItemResult,
}

/// A markdown result row with the links discovered on its page.
#[derive(Debug, Serialize)]
pub struct MarkdownResult {
    #[serde(flatten)]
    pub content: MarkdownContent,
    pub links: Vec<String>,
}

/// A job together with its per-item result rows.
#[derive(Debug, Serialize)]
pub struct JobResultsResponse {
    pub job: Job,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extraction: Vec<ExtractionContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markdown: Vec<MarkdownResult>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<DocumentContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content_library: Vec<ContentLibraryResult>,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/jobs
pub async fn create_job_handler(
    Extension(state): Extension<AppState>,
    OrgContext(org_id): OrgContext,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<Job>), JobError> {
    let (kind, payload, created_by, metadata) = request.into_parts()?;
    let job = state
        .tracker
        .create(org_id, kind, payload, created_by, metadata)
        .await?;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/{job_id}
pub async fn get_job_handler(
    Extension(state): Extension<AppState>,
    OrgContext(org_id): OrgContext,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, JobError> {
    let job = state.tracker.get(job_id, org_id).await?;
    Ok(Json(job))
}

/// PATCH /api/v1/jobs/{job_id}
pub async fn update_job_handler(
    Extension(state): Extension<AppState>,
    OrgContext(org_id): OrgContext,
    Path(job_id): Path<Uuid>,
    Json(update): Json<JobUpdate>,
) -> Result<Json<Job>, JobError> {
    let job = state.tracker.update(job_id, org_id, update).await?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/{job_id}/items
pub async fn record_item_handler(
    Extension(state): Extension<AppState>,
    OrgContext(org_id): OrgContext,
    Path(job_id): Path<Uuid>,
    Json(request): Json<RecordItemRequest>,
) -> Result<Json<Job>, JobError> {
    let job = state
        .tracker
        .record_item(job_id, org_id, request.item, request.outcome)
        .await?;
    Ok(Json(job))
}

/// GET /api/v1/jobs/{job_id}/results
pub async fn job_results_handler(
    Extension(state): Extension<AppState>,
    OrgContext(org_id): OrgContext,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobResultsResponse>, JobError> {
    let job = state.tracker.get(job_id, org_id).await?;
    let pool = &state.db_pool;

    let mut response = JobResultsResponse {
        extraction: Vec::new(),
        markdown: Vec::new(),
        documents: Vec::new(),
        content_library: Vec::new(),
        job,
    };

    match response.job.job_type {
        JobKind::WebsiteExtraction => {
            response.extraction = ExtractionContent::find_by_job(job_id, org_id, pool).await?;
        }
        JobKind::MarkdownExtraction => {
            let rows = MarkdownContent::find_by_job(job_id, org_id, pool).await?;
            let links = ExtractedLink::find_by_job(job_id, org_id, pool).await?;

            let mut links_by_url: HashMap<String, Vec<String>> = HashMap::new();
            for link in links {
                links_by_url.entry(link.url).or_default().push(link.link);
            }

            response.markdown = rows
                .into_iter()
                .map(|content| {
                    let links = links_by_url.remove(&content.url).unwrap_or_default();
                    MarkdownResult { content, links }
                })
                .collect();
        }
        JobKind::DocumentConversion => {
            response.documents = DocumentContent::find_by_job(job_id, org_id, pool).await?;
        }
        JobKind::ContentLibrary => {
            response.content_library =
                ContentLibraryResult::find_by_job(job_id, org_id, pool).await?;
        }
        // Vector-processing output lives in the external chunk store.
        JobKind::VectorProcessing => {}
    }

    Ok(Json(response))
}
