//! Roster repository with cache-first reads.
//!
//! The allow-list check runs on every incoming message, so entries are
//! cached by id; all writes invalidate.

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{doc, Document};
use mongodb::options::UpdateOptions;
use mongodb::Collection;
use tracing::debug;

use super::models::{Role, RosterUser, PENDING_USER_ID};
use super::Database;
use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

/// Roster listing filter for /list_users.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RosterFilter {
    All,
    Allowed,
    Pending,
    Admins,
    Users,
    /// Username substring match, case-insensitive.
    Name(String),
}

impl RosterFilter {
    /// Parse a /list_users filter argument.
    pub fn parse(arg: &str) -> Result<Self, String> {
        match arg {
            "allowed" => Ok(Self::Allowed),
            "pending" => Ok(Self::Pending),
            "admins" => Ok(Self::Admins),
            "users" => Ok(Self::Users),
            _ => {
                if let Some(name) = arg.strip_prefix("name:") {
                    if name.is_empty() {
                        return Err("name: filter needs a search string".to_string());
                    }
                    return Ok(Self::Name(name.to_lowercase()));
                }
                Err(format!(
                    "unknown filter '{}' (use allowed|pending|admins|users|name:<text>)",
                    arg
                ))
            }
        }
    }

    fn to_query(&self) -> Document {
        match self {
            Self::All => doc! {},
            Self::Allowed => doc! { "allowed": true },
            Self::Pending => doc! { "user_id": PENDING_USER_ID },
            Self::Admins => doc! { "role": Role::Admin.as_str() },
            Self::Users => doc! { "role": Role::User.as_str() },
            Self::Name(name) => doc! {
                "username": { "$regex": regex_escape(name), "$options": "i" }
            },
        }
    }
}

/// Escape regex metacharacters for a literal substring match.
fn regex_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Repository for roster entries.
pub struct UserRepo {
    collection: Collection<RosterUser>,
    cache: TypedCache<i64, RosterUser>,
}

impl UserRepo {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Self {
        let roster_cache = cache.get_or_create("roster_by_id", CacheConfig::roster());

        Self {
            collection: db.collection("users"),
            cache: roster_cache,
        }
    }

    /// Get a roster entry by id.
    pub async fn get(&self, user_id: i64) -> Result<Option<RosterUser>> {
        if let Some(user) = self.cache.get(&user_id) {
            return Ok(Some(user));
        }

        let filter = doc! { "user_id": user_id };
        let result = self.collection.find_one(filter).await?;

        if let Some(user) = &result {
            self.cache.insert(user_id, user.clone());
        }

        Ok(result)
    }

    /// Get a roster entry by username (lowercase, no `@`).
    ///
    /// Uncached; this only runs for admin commands.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<RosterUser>> {
        let filter = doc! { "username": username.to_lowercase() };
        Ok(self.collection.find_one(filter).await?)
    }

    /// Whether the user is on the allow-list.
    pub async fn is_allowed(&self, user_id: i64) -> Result<bool> {
        Ok(self.get(user_id).await?.is_some_and(|u| u.allowed))
    }

    /// Whether the user is an administrator.
    pub async fn is_admin(&self, user_id: i64) -> Result<bool> {
        Ok(self.get(user_id).await?.is_some_and(|u| u.is_admin()))
    }

    /// Allow-list a user by id. Creates the entry when missing, flips
    /// `allowed` back on when it exists.
    pub async fn add_allowed(&self, user_id: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let update = doc! {
            "$set": { "allowed": true },
            "$setOnInsert": {
                "user_id": user_id,
                "username": null,
                "role": Role::User.as_str(),
                "car": null,
                "created_at": now,
            },
        };
        self.collection
            .update_one(doc! { "user_id": user_id }, update)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await?;
        self.cache.invalidate(&user_id);
        Ok(())
    }

    /// Add a pending entry for a username the bot has not seen yet.
    ///
    /// Returns false when a pending entry for that username already
    /// exists.
    pub async fn add_pending(&self, username: &str) -> Result<bool> {
        let username = username.to_lowercase();
        let pending = RosterUser::pending(username.clone());
        let filter = doc! { "username": &username, "user_id": PENDING_USER_ID };
        let update = doc! {
            "$setOnInsert": {
                "user_id": pending.user_id,
                "username": &username,
                "role": pending.role.as_str(),
                "allowed": pending.allowed,
                "car": null,
                "created_at": pending.created_at,
            },
        };
        let result = self
            .collection
            .update_one(filter, update)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await?;
        Ok(result.upserted_id.is_some())
    }

    /// Claim a pending entry on the user's first contact: backfill the
    /// real Telegram id into the `-1` sentinel row.
    pub async fn claim_pending(&self, username: &str, user_id: i64) -> Result<bool> {
        let filter = doc! {
            "username": username.to_lowercase(),
            "user_id": PENDING_USER_ID,
        };
        let result = self
            .collection
            .update_one(filter, doc! { "$set": { "user_id": user_id } })
            .await?;
        let claimed = result.modified_count == 1;
        if claimed {
            self.cache.invalidate(&user_id);
            debug!("Claimed pending roster entry @{} -> {}", username, user_id);
        }
        Ok(claimed)
    }

    /// Update the stored username for an existing entry.
    pub async fn update_username(&self, user_id: i64, username: &str) -> Result<()> {
        let filter = doc! { "user_id": user_id };
        let update = doc! { "$set": { "username": username.to_lowercase() } };
        self.collection.update_one(filter, update).await?;
        self.cache.invalidate(&user_id);
        Ok(())
    }

    /// Upsert an admin entry, used for startup seeding and /bootstrap.
    pub async fn ensure_admin(&self, user_id: i64, username: Option<&str>) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let mut set = doc! { "role": Role::Admin.as_str(), "allowed": true };
        if let Some(name) = username {
            set.insert("username", name.to_lowercase());
        }
        let update = doc! {
            "$set": set,
            "$setOnInsert": { "user_id": user_id, "car": null, "created_at": now },
        };
        self.collection
            .update_one(doc! { "user_id": user_id }, update)
            .with_options(UpdateOptions::builder().upsert(true).build())
            .await?;
        self.cache.invalidate(&user_id);
        Ok(())
    }

    /// Delete a roster entry. Returns false when it did not exist.
    pub async fn delete(&self, user_id: i64) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "user_id": user_id })
            .await?;
        self.cache.invalidate(&user_id);
        Ok(result.deleted_count == 1)
    }

    /// Store a car description for a user.
    pub async fn set_car(&self, user_id: i64, car: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(doc! { "user_id": user_id }, doc! { "$set": { "car": car } })
            .await?;
        self.cache.invalidate(&user_id);
        Ok(result.matched_count == 1)
    }

    /// List roster entries, newest first.
    pub async fn list(
        &self,
        filter: &RosterFilter,
        limit: i64,
        offset: u64,
    ) -> Result<Vec<RosterUser>> {
        let cursor = self
            .collection
            .find(filter.to_query())
            .sort(doc! { "created_at": -1 })
            .skip(offset)
            .limit(limit)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Pending entries awaiting first contact, oldest first.
    pub async fn pending(&self) -> Result<Vec<RosterUser>> {
        let cursor = self
            .collection
            .find(doc! { "user_id": PENDING_USER_ID })
            .sort(doc! { "created_at": 1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_parse() {
        assert_eq!(RosterFilter::parse("allowed"), Ok(RosterFilter::Allowed));
        assert_eq!(RosterFilter::parse("pending"), Ok(RosterFilter::Pending));
        assert_eq!(RosterFilter::parse("admins"), Ok(RosterFilter::Admins));
        assert_eq!(RosterFilter::parse("users"), Ok(RosterFilter::Users));
        assert_eq!(
            RosterFilter::parse("name:Bob"),
            Ok(RosterFilter::Name("bob".to_string()))
        );
        assert!(RosterFilter::parse("name:").is_err());
        assert!(RosterFilter::parse("nonsense").is_err());
    }

    #[test]
    fn test_regex_escape() {
        assert_eq!(regex_escape("plain"), "plain");
        assert_eq!(regex_escape("a.b*"), "a\\.b\\*");
    }
}
