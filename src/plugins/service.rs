//! /to command - service booking contact.

use teloxide::prelude::*;

use super::{ensure_allowed, reply};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::ActivityKind;

/// Handle /to.
pub async fn to_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = ensure_allowed(&bot, &msg, &state).await? else {
        return Ok(());
    };

    state
        .activity
        .clone()
        .log_background(user.user_id, ActivityKind::Command, "to".to_string());

    let text = state.templates.text("service_contact_text").await;
    reply(&bot, &msg, &text).await
}
