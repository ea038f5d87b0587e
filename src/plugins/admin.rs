//! Roster administration commands.

use teloxide::prelude::*;
use tracing::{info, warn};

use super::{ensure_admin, reply, reply_html, resolve_target};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::RosterFilter;
use crate::utils::{chunk_lines, extract_user_id, format_roster_line, normalize_username, split_args};

/// Telegram caps messages at 4096 chars; leave headroom for headers.
const LIST_CHUNK_CHARS: usize = 3500;

/// Handle /bootstrap <secret> - first-admin self-registration.
///
/// Enabled only when `ADMIN_BOOTSTRAP_SECRET` is configured.
pub async fn bootstrap_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    let secret = args.trim();
    if secret.is_empty() {
        reply(&bot, &msg, "❌ Usage: /bootstrap <secret>").await?;
        return Ok(());
    }

    let Some(expected) = state.bootstrap_secret.as_deref() else {
        reply(&bot, &msg, "❌ Bootstrap is disabled.").await?;
        return Ok(());
    };

    if secret != expected {
        warn!("User {} failed the bootstrap secret", user_id);
        reply(&bot, &msg, "❌ Wrong bootstrap secret.").await?;
        return Ok(());
    }

    state
        .users
        .ensure_admin(user_id, from.username.as_deref())
        .await?;
    info!("User {} registered as administrator via bootstrap", user_id);
    reply(&bot, &msg, "✅ You are registered as an administrator!").await
}

/// Handle /add_user <id|@username>.
pub async fn add_user_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    if ensure_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }

    let arg = args.trim();
    if arg.is_empty() {
        reply(&bot, &msg, "❌ Usage: /add_user <id or @username>").await?;
        return Ok(());
    }

    if let Some(user_id) = extract_user_id(arg) {
        state.users.add_allowed(user_id).await?;
        info!("User {} allow-listed by id", user_id);
        reply(&bot, &msg, &format!("✅ User {} added.", user_id)).await?;
        return Ok(());
    }

    if arg.starts_with('@') {
        let username = normalize_username(arg);
        if username.is_empty() {
            reply(&bot, &msg, "❌ Empty username.").await?;
            return Ok(());
        }

        if let Some(existing) = state.users.get_by_username(&username).await? {
            if existing.is_pending() {
                reply(
                    &bot,
                    &msg,
                    &format!("@{} is already awaiting first contact.", username),
                )
                .await?;
            } else {
                state.users.add_allowed(existing.user_id).await?;
                reply(
                    &bot,
                    &msg,
                    &format!("✅ @{} ({}) is allowed.", username, existing.user_id),
                )
                .await?;
            }
            return Ok(());
        }

        state.users.add_pending(&username).await?;
        info!("Pending roster entry added for @{}", username);
        reply(
            &bot,
            &msg,
            &format!(
                "✅ @{} added. The entry activates when they first message the bot.",
                username
            ),
        )
        .await?;
        return Ok(());
    }

    reply(&bot, &msg, "❌ Use a numeric id or @username.").await
}

/// Handle /del_user <id|@username>.
pub async fn del_user_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(admin_id) = ensure_admin(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let arg = args.trim();
    if arg.is_empty() {
        reply(&bot, &msg, "❌ Usage: /del_user <id or @username>").await?;
        return Ok(());
    }

    let Some(user_id) = resolve_target(&state, arg).await? else {
        reply(&bot, &msg, "❌ User not found.").await?;
        return Ok(());
    };

    if user_id == admin_id {
        reply(&bot, &msg, "❌ You can't delete yourself.").await?;
        return Ok(());
    }

    if state.users.delete(user_id).await? {
        info!("User {} deleted by admin {}", user_id, admin_id);
        reply(&bot, &msg, &format!("✅ User {} deleted.", user_id)).await
    } else {
        reply(&bot, &msg, &format!("❌ User {} not found.", user_id)).await
    }
}

/// Handle /list_users [filter] [limit] [offset].
pub async fn list_users_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    if ensure_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }

    let args = split_args(&args);

    let filter = match args.first() {
        Some(arg) => match RosterFilter::parse(arg) {
            Ok(filter) => filter,
            Err(err) => {
                reply(&bot, &msg, &format!("❌ {}", err)).await?;
                return Ok(());
            }
        },
        None => RosterFilter::All,
    };

    let limit = match args.get(1) {
        Some(arg) => match arg.parse::<i64>() {
            Ok(n) => n.clamp(1, 100),
            Err(_) => {
                reply(&bot, &msg, "❌ Limit must be a number from 1 to 100.").await?;
                return Ok(());
            }
        },
        None => 50,
    };

    let offset = match args.get(2) {
        Some(arg) => match arg.parse::<u64>() {
            Ok(n) => n,
            Err(_) => {
                reply(&bot, &msg, "❌ Offset must be a non-negative number.").await?;
                return Ok(());
            }
        },
        None => 0,
    };

    let users = state.users.list(&filter, limit, offset).await?;
    if users.is_empty() {
        reply(&bot, &msg, "📋 No users found.").await?;
        return Ok(());
    }

    let lines: Vec<String> = users
        .iter()
        .enumerate()
        .map(|(i, user)| format_roster_line(offset as usize + i + 1, user))
        .collect();

    let chunks = chunk_lines(&lines, LIST_CHUNK_CHARS);
    let total = chunks.len();
    for (i, chunk) in chunks.into_iter().enumerate() {
        let header = if total > 1 {
            format!("📋 Users (part {}/{}):\n\n", i + 1, total)
        } else {
            "📋 Users:\n\n".to_string()
        };
        reply_html(&bot, &msg, &format!("{}{}", header, chunk)).await?;
    }

    Ok(())
}

/// Handle /pending_users.
pub async fn pending_users_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    if ensure_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }

    let pending = state.users.pending().await?;
    if pending.is_empty() {
        reply(&bot, &msg, "📋 No users awaiting first contact.").await?;
        return Ok(());
    }

    let lines: Vec<String> = pending
        .iter()
        .enumerate()
        .map(|(i, user)| format_roster_line(i + 1, user))
        .collect();

    for chunk in chunk_lines(&lines, LIST_CHUNK_CHARS) {
        reply_html(
            &bot,
            &msg,
            &format!("📋 Awaiting first contact:\n\n{}", chunk),
        )
        .await?;
    }

    Ok(())
}
