//! User-facing text templates.
//!
//! Operators can override any of these via /set_template; defaults are
//! seeded at startup only when a key is missing, so edits survive
//! restarts.

use serde::{Deserialize, Serialize};

/// A stored text template.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextTemplate {
    pub key: String,
    pub value: String,
    pub description: String,
    pub updated_at: i64,
}

/// Default templates seeded at startup: (key, value, description).
pub const DEFAULT_TEMPLATES: &[(&str, &str, &str)] = &[
    (
        "welcome_text",
        "Hi! I'm your car assistant - ask me anything about operating, servicing or troubleshooting your car.",
        "Greeting shown on /start",
    ),
    (
        "support_text",
        "Support is happy to help, write to https://t.me/motorist_support",
        "Support contact text",
    ),
    (
        "processing_text",
        "🤔 Working on your question...",
        "Notice shown while a question is being answered",
    ),
    (
        "busy_text",
        "⏳ Your previous question is still being answered, please wait for it to finish.",
        "Reply when a user already has a question in flight",
    ),
    (
        "rag_error_text",
        "⚠️ Couldn't get an answer, please try again later.",
        "Fallback when no answer could be produced",
    ),
    (
        "limit_exceeded_text",
        "You've reached your question limit.",
        "Reply when a quota limit is reached",
    ),
    (
        "media_not_supported_text",
        "Please type your question. I can't read pictures or audio yet, but I'm learning!",
        "Reply to photos, audio and other media",
    ),
    (
        "service_contact_text",
        "🔧 To book a service appointment call +1 (555) 010-0100, Mon-Fri 9:00-18:00, Sat 9:00-15:00.",
        "Service booking contact shown by /to",
    ),
    (
        "no_access_text",
        "❌ You don't have access to this bot yet. Please contact an administrator.",
        "Reply for users not on the allow-list",
    ),
];
