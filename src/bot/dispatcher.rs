//! Message dispatcher setup.
//!
//! Builds the dispatcher with the command handlers and the question
//! flow, and holds the shared application state.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::cache::CacheRegistry;
use crate::database::{
    AcquisitionRepo, ActivityRepo, Database, LedgerRepo, QuotaRepo, StatsRepo, TemplateRepo,
    UserRepo,
};
use crate::events::{self, InFlightQuestions};
use crate::limits::RateLimiter;
use crate::plugins;
use crate::rag::{RagClient, RagConfig};

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
///
/// All dependencies are constructed once here and handed to handlers
/// through dptree; nothing is looked up through globals.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Arc<Database>,

    /// Cache registry.
    pub cache: Arc<CacheRegistry>,

    /// Roster repository.
    pub users: Arc<UserRepo>,

    /// Quota repository.
    pub quotas: Arc<QuotaRepo>,

    /// User-facing text templates.
    pub templates: Arc<TemplateRepo>,

    /// Activity log.
    pub activity: Arc<ActivityRepo>,

    /// Acquisition tracking.
    pub acquisition: Arc<AcquisitionRepo>,

    /// Statistics aggregations.
    pub stats: Arc<StatsRepo>,

    /// Question rate limiter over the quota repository.
    pub limiter: RateLimiter,

    /// RAG gateway client.
    pub rag: Arc<RagClient>,

    /// Secret for /bootstrap; unset disables the command.
    pub bootstrap_secret: Option<String>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        db: Arc<Database>,
        cache: Arc<CacheRegistry>,
        rag_config: RagConfig,
        bootstrap_secret: Option<String>,
    ) -> anyhow::Result<Self> {
        let users = Arc::new(UserRepo::new(&db, &cache));
        let quotas = Arc::new(QuotaRepo::new(&db, &cache));
        // The ledger is only reached through the gateway; nothing else
        // writes request rows.
        let ledger = Arc::new(LedgerRepo::new(&db));
        let templates = Arc::new(TemplateRepo::new(&db, &cache));
        let activity = Arc::new(ActivityRepo::new(&db));
        let acquisition = Arc::new(AcquisitionRepo::new(&db));
        let stats = Arc::new(StatsRepo::new(&db));

        let limiter = RateLimiter::new(quotas.clone());
        let rag = Arc::new(RagClient::new(rag_config, ledger)?);

        Ok(Self {
            db,
            cache,
            users,
            quotas,
            templates,
            activity,
            acquisition,
            stats,
            limiter,
            rag,
            bootstrap_secret,
        })
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    let inflight = InFlightQuestions::new();

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state, inflight])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    use teloxide::dispatching::UpdateFilterExt;

    let message_handler = Update::filter_message()
        .branch(plugins::command_handler())
        .branch(events::question_handler())
        .branch(events::media_handler());

    dptree::entry().branch(message_handler)
}
