//! RAG gateway.
//!
//! Converts a question into an answer via the external RAG HTTP
//! service: submit, record a pending ledger row, poll until a terminal
//! status, mark the row. Every failure collapses to `None` at this
//! boundary; callers only distinguish "answer" from "no answer".

mod client;
mod config;
mod error;
mod ledger;

pub use client::{RagClient, TEST_MODE_REQUEST_ID};
pub use config::RagConfig;
pub use error::RagError;
pub use ledger::QuestionLedger;
