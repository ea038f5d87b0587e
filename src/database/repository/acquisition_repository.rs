//! User acquisition repository.

use anyhow::Result;
use mongodb::bson::doc;
use mongodb::options::UpdateOptions;
use mongodb::Collection;

use crate::database::models::AcquisitionRecord;
use crate::database::Database;

/// Repository for acquisition records.
pub struct AcquisitionRepo {
    collection: Collection<AcquisitionRecord>,
}

impl AcquisitionRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("user_acquisition"),
        }
    }

    /// Save an acquisition record unless one already exists for the
    /// user. The first deep link wins.
    pub async fn save_first(&self, record: &AcquisitionRecord) -> Result<bool> {
        let update = doc! {
            "$setOnInsert": {
                "user_id": record.user_id,
                "payload_raw": &record.payload_raw,
                "payload_decoded": &record.payload_decoded,
                "src": record.src.clone(),
                "campaign": record.campaign.clone(),
                "ad": record.ad.clone(),
                "language_code": record.language_code.clone(),
                "created_at": record.created_at,
            },
        };
        let result = self
            .collection
            .update_one(doc! { "user_id": record.user_id }, update)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await?;
        Ok(result.upserted_id.is_some())
    }

    /// Get the acquisition record for a user.
    pub async fn get(&self, user_id: i64) -> Result<Option<AcquisitionRecord>> {
        Ok(self
            .collection
            .find_one(doc! { "user_id": user_id })
            .await?)
    }
}
