//! Text template repository.
//!
//! Cached reads; operator edits via /set_template invalidate. Defaults
//! are seeded only when a key is missing so edits survive restarts.

use anyhow::Result;
use mongodb::bson::doc;
use mongodb::options::UpdateOptions;
use mongodb::Collection;
use tracing::{info, warn};

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::models::{TextTemplate, DEFAULT_TEMPLATES};
use crate::database::Database;

/// Repository for user-facing text templates.
pub struct TemplateRepo {
    collection: Collection<TextTemplate>,
    cache: TypedCache<String, String>,
}

impl TemplateRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let template_cache = cache.get_or_create("text_templates", CacheConfig::templates());

        Self {
            collection: db.collection("text_templates"),
            cache: template_cache,
        }
    }

    /// Get a template value by key.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.cache.get(&key.to_string()) {
            return Ok(Some(value));
        }

        let filter = doc! { "key": key };
        let result = self.collection.find_one(filter).await?;

        if let Some(template) = &result {
            self.cache.insert(key.to_string(), template.value.clone());
        }

        Ok(result.map(|t| t.value))
    }

    /// Get a template value, falling back to the compiled-in default.
    ///
    /// Never fails: replies must go out even when the template store is
    /// unreachable.
    pub async fn text(&self, key: &str) -> String {
        match self.get(key).await {
            Ok(Some(value)) => value,
            Ok(None) => default_for(key),
            Err(err) => {
                warn!("Template lookup for '{}' failed: {}", key, err);
                default_for(key)
            }
        }
    }

    /// Set a template value (upsert).
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let update = doc! {
            "$set": { "value": value, "updated_at": now },
            "$setOnInsert": { "key": key, "description": "" },
        };
        self.collection
            .update_one(doc! { "key": key }, update)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await?;
        self.cache.invalidate(&key.to_string());
        Ok(())
    }

    /// Seed default templates for keys that do not exist yet.
    pub async fn seed_defaults(&self) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        for (key, value, description) in DEFAULT_TEMPLATES {
            let update = doc! {
                "$setOnInsert": {
                    "key": *key,
                    "value": *value,
                    "description": *description,
                    "updated_at": now,
                },
            };
            self.collection
                .update_one(doc! { "key": *key }, update)
                .with_options(UpdateOptions::builder().upsert(true).build())
                .await?;
        }
        info!("Text templates seeded ({} keys)", DEFAULT_TEMPLATES.len());
        Ok(())
    }
}

/// Compiled-in default for a template key; the key itself as a last
/// resort for unknown keys.
fn default_for(key: &str) -> String {
    DEFAULT_TEMPLATES
        .iter()
        .find(|(k, _, _)| *k == key)
        .map(|(_, value, _)| value.to_string())
        .unwrap_or_else(|| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for() {
        assert!(default_for("rag_error_text").contains("try again later"));
        assert_eq!(default_for("missing_key"), "missing_key");
    }
}
