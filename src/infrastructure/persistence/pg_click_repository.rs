//! PostgreSQL implementation of click repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::click_record::ClickRecord;
use crate::domain::entities::Click;
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// PostgreSQL repository for click records.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ClickRow {
    id: i64,
    link_id: i64,
    clicked_at: DateTime<Utc>,
    user_agent: Option<String>,
    ip: Option<String>,
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn create(&self, record: ClickRecord) -> Result<Click, AppError> {
        let link_id = record.link_id;

        let row = sqlx::query_as::<_, ClickRow>(
            r#"
            INSERT INTO link_clicks (link_id, clicked_at, user_agent, ip)
            VALUES ($1, $2, $3, $4)
            RETURNING id, link_id, clicked_at, user_agent, ip
            "#,
        )
        .bind(record.link_id)
        .bind(record.clicked_at)
        .bind(record.user_agent)
        .bind(record.ip)
        .fetch_one(self.pool.as_ref())
        .await
        .map_err(|e| {
            if let Some(db) = e.as_database_error()
                && db.is_foreign_key_violation()
            {
                return AppError::bad_request("Link does not exist", json!({ "link_id": link_id }));
            }
            AppError::from(e)
        })?;

        Ok(Click::new(
            row.id,
            row.link_id,
            row.clicked_at,
            row.user_agent,
            row.ip,
        ))
    }

    async fn count_by_link_id(&self, link_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM link_clicks WHERE link_id = $1")
            .bind(link_id)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
