use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use serde_json::json;
use uuid::Uuid;

/// Tenant scope for a request, taken from the `X-Org-Id` header.
///
/// Authentication is handled by an upstream gateway; this service only
/// enforces organization scoping on every job operation.
pub struct OrgContext(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for OrgContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("x-org-id")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| reject("missing X-Org-Id header"))?;

        let org_id =
            Uuid::parse_str(header).map_err(|_| reject("X-Org-Id must be a valid UUID"))?;

        Ok(OrgContext(org_id))
    }
}

fn reject(message: &str) -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}
