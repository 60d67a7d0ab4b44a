//! Process-local store implementing both repository traits.
//!
//! Used when no `DATABASE_URL` is configured and as the backing store for
//! integration tests. Contents are lost when the process exits.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use crate::domain::click_record::ClickRecord;
use crate::domain::entities::{Click, Link, NewLink};
use crate::domain::repositories::{ClickRepository, LinkRepository};
use crate::error::AppError;

#[derive(Default)]
struct Tables {
    links: Vec<Link>,
    code_index: HashMap<String, usize>,
    clicks: Vec<Click>,
}

/// In-memory link and click storage with sequential ids starting at 1.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored clicks across all links.
    pub async fn click_total(&self) -> usize {
        self.tables.read().await.clicks.len()
    }

    /// All clicks recorded for `link_id`, oldest first.
    pub async fn clicks_for(&self, link_id: i64) -> Vec<Click> {
        self.tables
            .read()
            .await
            .clicks
            .iter()
            .filter(|c| c.link_id == link_id)
            .cloned()
            .collect()
    }
}

fn index_of(id: i64) -> Option<usize> {
    usize::try_from(id).ok()?.checked_sub(1)
}

#[async_trait]
impl LinkRepository for InMemoryStore {
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut tables = self.tables.write().await;

        if tables.code_index.contains_key(&new_link.code) {
            return Err(AppError::conflict(
                "Short code already exists",
                json!({ "code": new_link.code }),
            ));
        }

        let position = tables.links.len();
        let link = Link::new(
            position as i64 + 1,
            new_link.code,
            new_link.long_url,
            Utc::now(),
            true,
        );

        tables.code_index.insert(link.code.clone(), position);
        tables.links.push(link.clone());

        Ok(link)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Link>, AppError> {
        let tables = self.tables.read().await;

        Ok(tables
            .code_index
            .get(code)
            .and_then(|&i| tables.links.get(i))
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<Link>, AppError> {
        Ok(self.tables.read().await.links.clone())
    }

    async fn update(&self, link: &Link) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;

        let stored = index_of(link.id)
            .and_then(|i| tables.links.get_mut(i))
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "link_id": link.id })))?;

        stored.long_url = link.long_url.clone();
        stored.is_active = link.is_active;

        Ok(())
    }
}

#[async_trait]
impl ClickRepository for InMemoryStore {
    async fn create(&self, record: ClickRecord) -> Result<Click, AppError> {
        let mut tables = self.tables.write().await;

        let exists = index_of(record.link_id).is_some_and(|i| i < tables.links.len());
        if !exists {
            return Err(AppError::bad_request(
                "Link does not exist",
                json!({ "link_id": record.link_id }),
            ));
        }

        let click = Click::new(
            tables.clicks.len() as i64 + 1,
            record.link_id,
            record.clicked_at,
            record.user_agent,
            record.ip,
        );
        tables.clicks.push(click.clone());

        Ok(click)
    }

    async fn count_by_link_id(&self, link_id: i64) -> Result<i64, AppError> {
        let tables = self.tables.read().await;

        Ok(tables.clicks.iter().filter(|c| c.link_id == link_id).count() as i64)
    }
}
