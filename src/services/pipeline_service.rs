use crate::error::Result;
use crate::models::pipeline::PipelineEntry;
use serde_json::Value as JsonValue;
use sqlx::PgPool;

/// Append-only activity log keyed by application. The FK guarantees a written
/// entry always references an existing application.
#[derive(Clone)]
pub struct PipelineService {
    pool: PgPool,
}

impl PipelineService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        application_id: i64,
        event_type: &str,
        stage_id: Option<i64>,
        actor_id: Option<i64>,
        detail: Option<JsonValue>,
    ) -> Result<PipelineEntry> {
        let entry = sqlx::query_as::<_, PipelineEntry>(
            "INSERT INTO pipeline (application_id, event_type, stage_id, actor_id, detail)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, application_id, event_type, stage_id, actor_id, detail, created_at",
        )
        .bind(application_id)
        .bind(event_type)
        .bind(stage_id)
        .bind(actor_id)
        .bind(detail)
        .fetch_one(&self.pool)
        .await?;
        Ok(entry)
    }

    /// Full history, oldest first. No filtering or pagination; summarization
    /// is the caller's concern.
    pub async fn get_pipeline(&self, application_id: i64) -> Result<Vec<PipelineEntry>> {
        let entries = sqlx::query_as::<_, PipelineEntry>(
            "SELECT id, application_id, event_type, stage_id, actor_id, detail, created_at
             FROM pipeline
             WHERE application_id = $1
             ORDER BY created_at ASC, id ASC",
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }
}
