//! Event handlers for non-command messages.

pub mod guard;
pub mod question;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

pub use guard::InFlightQuestions;

/// Plain text messages in private chats are questions.
pub fn question_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| {
        msg.chat.is_private()
            && msg
                .text()
                .map(|t| !t.starts_with('/'))
                .unwrap_or(false)
    })
    .endpoint(question::handle_question)
}

/// Non-text media in private chats gets a short "text only" reply.
pub fn media_handler() -> UpdateHandler<anyhow::Error> {
    dptree::filter(|msg: Message| msg.chat.is_private() && msg.text().is_none())
        .endpoint(question::handle_media)
}
