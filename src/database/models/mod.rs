//! Database model exports.

pub mod acquisition;
pub mod activity;
pub mod ledger;
pub mod quota;
pub mod template;
pub mod user;

pub use acquisition::AcquisitionRecord;
pub use activity::{ActivityEntry, ActivityKind};
pub use ledger::{LedgerEntry, RequestStatus};
pub use quota::QuotaRecord;
pub use template::{TextTemplate, DEFAULT_TEMPLATES};
pub use user::{Role, RosterUser, PENDING_USER_ID};
