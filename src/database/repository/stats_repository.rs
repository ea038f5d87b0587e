//! Statistics aggregations over the roster, activity log and ledger.
//!
//! Read-only; works on the raw collections rather than through the
//! other repositories so the pipelines stay in one place.

use std::collections::HashMap;

use anyhow::Result;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::Collection;

use crate::database::models::{
    AcquisitionRecord, ActivityEntry, ActivityKind, LedgerEntry, QuotaRecord, RequestStatus,
    RosterUser,
};
use crate::database::Database;

/// Reporting period for /stats and /user_stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatsPeriod {
    Day,
    Month,
    Year,
}

impl StatsPeriod {
    /// Parse a period argument; anything unrecognized falls back to a
    /// day, matching the reporting commands' default.
    pub fn parse(arg: Option<&str>) -> Self {
        match arg.map(|a| a.trim().to_lowercase()).as_deref() {
            Some("month") => Self::Month,
            Some("year") => Self::Year,
            _ => Self::Day,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Unix timestamp of the period start relative to `now`.
    pub fn since(&self, now: i64) -> i64 {
        let secs = match self {
            Self::Day => 24 * 60 * 60,
            Self::Month => 30 * 24 * 60 * 60,
            Self::Year => 365 * 24 * 60 * 60,
        };
        now - secs
    }
}

/// One row of the activity top list.
#[derive(Clone, Debug)]
pub struct TopUser {
    pub user_id: i64,
    pub username: Option<String>,
    pub count: i64,
}

/// Aggregate statistics for /stats.
#[derive(Clone, Debug)]
pub struct BotStats {
    pub period: StatsPeriod,
    pub total_users: u64,
    pub active_users: usize,
    pub new_users: u64,
    pub total_events: u64,
    pub commands: u64,
    pub text_questions: u64,
    pub rag_requests: u64,
    pub rag_failed: u64,
    pub cars_set: u64,
    pub limits_exhausted: u64,
    pub top_users: Vec<TopUser>,
}

/// Per-user statistics for /user_stats.
#[derive(Clone, Debug)]
pub struct UserStats {
    pub user_id: i64,
    pub user: Option<RosterUser>,
    pub acquisition: Option<AcquisitionRecord>,
    pub quota: Option<QuotaRecord>,
    pub total_events: u64,
    pub commands: u64,
    pub text_questions: u64,
    pub rag_requests: u64,
    pub rag_failed: u64,
    pub cars_set: u64,
    pub limits_exhausted: u64,
}

/// One row of the /top_users ranking.
#[derive(Clone, Debug)]
pub struct AskerStats {
    pub user_id: i64,
    pub user: Option<RosterUser>,
    pub question_count: i64,
}

/// One row of the /export_users CSV.
#[derive(Clone, Debug)]
pub struct ExportRow {
    pub user: RosterUser,
    pub question_count: i64,
    pub src: Option<String>,
    pub campaign: Option<String>,
    pub ad: Option<String>,
}

/// Repository for statistics and export aggregations.
pub struct StatsRepo {
    users: Collection<RosterUser>,
    activity: Collection<ActivityEntry>,
    requests: Collection<LedgerEntry>,
    acquisition: Collection<AcquisitionRecord>,
    quotas: Collection<QuotaRecord>,
}

impl StatsRepo {
    pub fn new(db: &Database) -> Self {
        Self {
            users: db.collection("users"),
            activity: db.collection("activity_log"),
            requests: db.collection("rag_requests"),
            acquisition: db.collection("user_acquisition"),
            quotas: db.collection("user_limits"),
        }
    }

    /// Aggregate bot-wide statistics for a period.
    pub async fn overview(&self, period: StatsPeriod) -> Result<BotStats> {
        let since = period.since(chrono::Utc::now().timestamp());
        let in_period = doc! { "created_at": { "$gte": since } };

        let total_users = self.users.count_documents(doc! {}).await?;
        let new_users = self.users.count_documents(in_period.clone()).await?;

        let active_users = self
            .activity
            .distinct("user_id", in_period.clone())
            .await?
            .len();

        let total_events = self.activity.count_documents(in_period.clone()).await?;
        let commands = self
            .activity
            .count_documents(activity_filter(ActivityKind::Command, None, since))
            .await?;
        let text_questions = self
            .activity
            .count_documents(activity_filter(ActivityKind::Text, None, since))
            .await?;
        let cars_set = self
            .activity
            .count_documents(activity_filter(ActivityKind::Action, Some("set_car"), since))
            .await?;
        let limits_exhausted = self
            .activity
            .count_documents(activity_filter(
                ActivityKind::Action,
                Some("limit_exhausted"),
                since,
            ))
            .await?;

        let rag_requests = self.requests.count_documents(in_period.clone()).await?;
        let rag_failed = self
            .requests
            .count_documents(doc! {
                "status": RequestStatus::Failed.as_str(),
                "created_at": { "$gte": since },
            })
            .await?;

        let top_users = self.top_active_users(since, 5).await?;

        Ok(BotStats {
            period,
            total_users,
            active_users,
            new_users,
            total_events,
            commands,
            text_questions,
            rag_requests,
            rag_failed,
            cars_set,
            limits_exhausted,
            top_users,
        })
    }

    /// Per-user statistics for a period.
    pub async fn user_overview(&self, user_id: i64, period: StatsPeriod) -> Result<UserStats> {
        let since = period.since(chrono::Utc::now().timestamp());
        let user_filter = |extra: Document| {
            let mut filter = doc! { "user_id": user_id, "created_at": { "$gte": since } };
            filter.extend(extra);
            filter
        };

        let user = self.users.find_one(doc! { "user_id": user_id }).await?;
        let acquisition = self
            .acquisition
            .find_one(doc! { "user_id": user_id })
            .await?;
        let quota = self.quotas.find_one(doc! { "user_id": user_id }).await?;

        let total_events = self.activity.count_documents(user_filter(doc! {})).await?;
        let commands = self
            .activity
            .count_documents(user_filter(doc! { "kind": ActivityKind::Command.as_str() }))
            .await?;
        let text_questions = self
            .activity
            .count_documents(user_filter(doc! { "kind": ActivityKind::Text.as_str() }))
            .await?;
        let cars_set = self
            .activity
            .count_documents(user_filter(doc! {
                "kind": ActivityKind::Action.as_str(),
                "content": "set_car",
            }))
            .await?;
        let limits_exhausted = self
            .activity
            .count_documents(user_filter(doc! {
                "kind": ActivityKind::Action.as_str(),
                "content": "limit_exhausted",
            }))
            .await?;

        let rag_requests = self.requests.count_documents(user_filter(doc! {})).await?;
        let rag_failed = self
            .requests
            .count_documents(user_filter(doc! { "status": RequestStatus::Failed.as_str() }))
            .await?;

        Ok(UserStats {
            user_id,
            user,
            acquisition,
            quota,
            total_events,
            commands,
            text_questions,
            rag_requests,
            rag_failed,
            cars_set,
            limits_exhausted,
        })
    }

    /// Roster ranked by lifetime question count, highest first.
    pub async fn top_askers(&self, limit: i64) -> Result<Vec<AskerStats>> {
        let pipeline = vec![
            doc! { "$group": { "_id": "$user_id", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
            doc! { "$limit": limit },
        ];
        let docs: Vec<Document> = self.requests.aggregate(pipeline).await?.try_collect().await?;

        let mut out = Vec::with_capacity(docs.len());
        for d in docs {
            let user_id = bson_i64(&d, "_id");
            let user = self.users.find_one(doc! { "user_id": user_id }).await?;
            out.push(AskerStats {
                user_id,
                user,
                question_count: bson_i64(&d, "count"),
            });
        }
        Ok(out)
    }

    /// All roster entries with question counts and acquisition fields,
    /// newest first, for the CSV export.
    pub async fn export_rows(&self) -> Result<Vec<ExportRow>> {
        let users: Vec<RosterUser> = self
            .users
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;

        let pipeline = vec![doc! { "$group": { "_id": "$user_id", "count": { "$sum": 1 } } }];
        let counts: Vec<Document> = self.requests.aggregate(pipeline).await?.try_collect().await?;
        let counts: HashMap<i64, i64> = counts
            .iter()
            .map(|d| (bson_i64(d, "_id"), bson_i64(d, "count")))
            .collect();

        let acquisitions: Vec<AcquisitionRecord> =
            self.acquisition.find(doc! {}).await?.try_collect().await?;
        let acquisitions: HashMap<i64, AcquisitionRecord> = acquisitions
            .into_iter()
            .map(|a| (a.user_id, a))
            .collect();

        Ok(users
            .into_iter()
            .map(|user| {
                let question_count = counts.get(&user.user_id).copied().unwrap_or(0);
                let acq = acquisitions.get(&user.user_id);
                ExportRow {
                    question_count,
                    src: acq.and_then(|a| a.src.clone()),
                    campaign: acq.and_then(|a| a.campaign.clone()),
                    ad: acq.and_then(|a| a.ad.clone()),
                    user,
                }
            })
            .collect())
    }

    /// Most active users in the period by activity entries.
    async fn top_active_users(&self, since: i64, limit: i64) -> Result<Vec<TopUser>> {
        let pipeline = vec![
            doc! { "$match": { "created_at": { "$gte": since } } },
            doc! { "$group": { "_id": "$user_id", "count": { "$sum": 1 } } },
            doc! { "$sort": { "count": -1 } },
            doc! { "$limit": limit },
        ];
        let docs: Vec<Document> = self.activity.aggregate(pipeline).await?.try_collect().await?;

        let mut out = Vec::with_capacity(docs.len());
        for d in docs {
            let user_id = bson_i64(&d, "_id");
            let username = self
                .users
                .find_one(doc! { "user_id": user_id })
                .await?
                .and_then(|u| u.username);
            out.push(TopUser {
                user_id,
                username,
                count: bson_i64(&d, "count"),
            });
        }
        Ok(out)
    }
}

/// Activity filter for a kind, optional exact content and period.
fn activity_filter(kind: ActivityKind, content: Option<&str>, since: i64) -> Document {
    let mut filter = doc! {
        "kind": kind.as_str(),
        "created_at": { "$gte": since },
    };
    if let Some(content) = content {
        filter.insert("content", content);
    }
    filter
}

/// Numeric field from an aggregation document; `$sum` may come back as
/// either integer width.
fn bson_i64(doc: &Document, key: &str) -> i64 {
    match doc.get(key) {
        Some(Bson::Int32(v)) => *v as i64,
        Some(Bson::Int64(v)) => *v,
        Some(Bson::Double(v)) => *v as i64,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_parse() {
        assert_eq!(StatsPeriod::parse(None), StatsPeriod::Day);
        assert_eq!(StatsPeriod::parse(Some("day")), StatsPeriod::Day);
        assert_eq!(StatsPeriod::parse(Some("Month")), StatsPeriod::Month);
        assert_eq!(StatsPeriod::parse(Some("year")), StatsPeriod::Year);
        assert_eq!(StatsPeriod::parse(Some("bogus")), StatsPeriod::Day);
    }

    #[test]
    fn test_period_since() {
        let now = 1_700_000_000;
        assert_eq!(StatsPeriod::Day.since(now), now - 86_400);
        assert_eq!(StatsPeriod::Month.since(now), now - 30 * 86_400);
        assert_eq!(StatsPeriod::Year.since(now), now - 365 * 86_400);
    }
}
