//! Activity log repository.
//!
//! Insert-only; reads happen through the stats aggregations.

use std::sync::Arc;

use anyhow::Result;
use mongodb::Collection;
use tokio::spawn;
use tracing::warn;

use crate::database::models::{ActivityEntry, ActivityKind};
use crate::database::Database;

/// Repository for the activity log.
pub struct ActivityRepo {
    collection: Collection<ActivityEntry>,
}

impl ActivityRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("activity_log"),
        }
    }

    /// Log one activity.
    pub async fn log(&self, user_id: i64, kind: ActivityKind, content: &str) -> Result<()> {
        let entry = ActivityEntry::new(user_id, kind, content);
        self.collection.insert_one(&entry).await?;
        Ok(())
    }

    /// Log in the background; handlers never wait on audit writes.
    pub fn log_background(self: Arc<Self>, user_id: i64, kind: ActivityKind, content: String) {
        spawn(async move {
            if let Err(e) = self.log(user_id, kind, &content).await {
                warn!("Failed to log activity for user {}: {}", user_id, e);
            }
        });
    }
}
