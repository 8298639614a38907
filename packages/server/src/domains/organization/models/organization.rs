use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Organization - the tenant boundary every job and result row belongs to.
///
/// Organization CRUD lives in an external service; this model only backs the
/// create-time existence check and test fixtures.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub domain: Option<String>,
    pub website: Option<String>,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Organization {
    /// Find organization by ID
    pub async fn find_by_id(id: Uuid, pool: &PgPool) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Check that an organization exists, inside a transaction.
    pub async fn exists(id: Uuid, conn: &mut PgConnection) -> sqlx::Result<bool> {
        let found: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM organizations WHERE id = $1")
                .bind(id)
                .fetch_optional(conn)
                .await?;
        Ok(found.is_some())
    }

    /// Insert new organization
    pub async fn insert(&self, pool: &PgPool) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (id, name, domain, website, logo, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(self.id)
        .bind(&self.name)
        .bind(&self.domain)
        .bind(&self.website)
        .bind(&self.logo)
        .bind(self.created_at)
        .bind(self.updated_at)
        .fetch_one(pool)
        .await
    }
}
