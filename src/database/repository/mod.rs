//! Repository exports.

mod acquisition_repository;
mod activity_repository;
mod ledger_repository;
mod quota_repository;
mod stats_repository;
mod template_repository;

pub use acquisition_repository::AcquisitionRepo;
pub use activity_repository::ActivityRepo;
pub use ledger_repository::LedgerRepo;
pub use quota_repository::QuotaRepo;
pub use stats_repository::{
    AskerStats, BotStats, ExportRow, StatsPeriod, StatsRepo, TopUser, UserStats,
};
pub use template_repository::TemplateRepo;
