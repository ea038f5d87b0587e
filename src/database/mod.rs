//! Database module exports.

pub mod models;
mod mongo;
mod repository;
mod users;

pub use models::*;
pub use mongo::Database;
pub use repository::{
    AcquisitionRepo, ActivityRepo, AskerStats, BotStats, ExportRow, LedgerRepo, QuotaRepo,
    StatsPeriod, StatsRepo, TemplateRepo, TopUser, UserStats,
};
pub use users::{RosterFilter, UserRepo};
