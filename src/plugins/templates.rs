//! /set_template - override user-facing texts.

use teloxide::prelude::*;
use tracing::info;

use super::{ensure_admin, reply};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::DEFAULT_TEMPLATES;

/// Handle /set_template <key> <text>.
pub async fn set_template_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(admin_id) = ensure_admin(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let args = args.trim();
    let Some((key, value)) = args.split_once(char::is_whitespace) else {
        reply(
            &bot,
            &msg,
            &format!("❌ Usage: /set_template <key> <text>\n\nKeys:\n{}", key_list()),
        )
        .await?;
        return Ok(());
    };

    let value = value.trim();
    if !DEFAULT_TEMPLATES.iter().any(|(k, _, _)| *k == key) {
        reply(
            &bot,
            &msg,
            &format!("❌ Unknown template key '{}'.\n\nKeys:\n{}", key, key_list()),
        )
        .await?;
        return Ok(());
    }

    state.templates.set(key, value).await?;
    info!("Admin {} updated template '{}'", admin_id, key);
    reply(&bot, &msg, &format!("✅ Template '{}' updated.", key)).await
}

fn key_list() -> String {
    DEFAULT_TEMPLATES
        .iter()
        .map(|(key, _, description)| format!("- {} ({})", key, description))
        .collect::<Vec<_>>()
        .join("\n")
}
