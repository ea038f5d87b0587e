//! Quota repository.
//!
//! Write-through cached: the limiter loads, decides in memory and
//! saves; administrative limit updates only touch the limit fields and
//! never the usage counters.

use std::time::Duration;

use anyhow::Result;
use mongodb::bson::doc;
use mongodb::options::{ReplaceOptions, UpdateOptions};
use mongodb::Collection;
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::models::QuotaRecord;
use crate::database::Database;

/// Repository for per-user quota records.
pub struct QuotaRepo {
    collection: Collection<QuotaRecord>,
    cache: TypedCache<i64, QuotaRecord>,
}

impl QuotaRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let quota_cache = cache.get_or_create(
            "user_quotas",
            CacheConfig::with_capacity(10_000).ttl(Duration::from_secs(600)),
        );

        Self {
            collection: db.collection("user_limits"),
            cache: quota_cache,
        }
    }

    /// Get a quota record if one exists.
    pub async fn get(&self, user_id: i64) -> Result<Option<QuotaRecord>> {
        if let Some(record) = self.cache.get(&user_id) {
            return Ok(Some(record));
        }

        let filter = doc! { "user_id": user_id };
        let result = self.collection.find_one(filter).await?;

        if let Some(record) = &result {
            self.cache.insert(user_id, record.clone());
        }

        Ok(result)
    }

    /// Get a quota record, lazily creating the unlimited default.
    pub async fn get_or_create(&self, user_id: i64) -> Result<QuotaRecord> {
        if let Some(record) = self.get(user_id).await? {
            return Ok(record);
        }

        let record = QuotaRecord::new(user_id);
        self.save(&record).await?;
        Ok(record)
    }

    /// Save a quota record (upsert).
    pub async fn save(&self, record: &QuotaRecord) -> Result<()> {
        let filter = doc! { "user_id": record.user_id };
        let options = ReplaceOptions::builder().upsert(true).build();

        self.collection
            .replace_one(filter, record)
            .with_options(options)
            .await?;

        self.cache.insert(record.user_id, record.clone());
        debug!("Saved quota record for user {}", record.user_id);

        Ok(())
    }

    /// Overwrite a user's limits without touching the usage counters.
    /// `None` clears a limit to unlimited.
    pub async fn set_limits(
        &self,
        user_id: i64,
        absolute_limit: Option<i64>,
        weekly_limit: Option<i64>,
    ) -> Result<()> {
        let update = doc! {
            "$set": {
                "absolute_limit": absolute_limit,
                "weekly_limit": weekly_limit,
            },
            "$setOnInsert": {
                "user_id": user_id,
                "absolute_used": 0_i64,
                "weekly_used": 0_i64,
                "week_start": null,
            },
        };
        self.collection
            .update_one(doc! { "user_id": user_id }, update)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await?;
        self.cache.invalidate(&user_id);
        Ok(())
    }

    /// Apply the same limits to every existing quota record.
    ///
    /// Returns the number of records touched.
    pub async fn set_all_limits(
        &self,
        absolute_limit: Option<i64>,
        weekly_limit: Option<i64>,
    ) -> Result<u64> {
        let update = doc! {
            "$set": {
                "absolute_limit": absolute_limit,
                "weekly_limit": weekly_limit,
            },
        };
        let result = self.collection.update_many(doc! {}, update).await?;
        self.cache.invalidate_all();
        Ok(result.matched_count)
    }
}
