//! Question-limit administration commands.

use teloxide::prelude::*;
use tracing::info;

use super::{ensure_admin, reply, resolve_target};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::QuotaRecord;
use crate::utils::{format_timestamp, parse_limit_arg, split_args};

/// Handle /set_limits <id|@username> <absolute|-> <weekly|->.
pub async fn set_limits_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(admin_id) = ensure_admin(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let args = split_args(&args);
    let [target, absolute, weekly] = args.as_slice() else {
        reply(
            &bot,
            &msg,
            "❌ Usage: /set_limits <id or @username> <absolute|-> <weekly|->",
        )
        .await?;
        return Ok(());
    };

    let Some(user_id) = resolve_target(&state, target).await? else {
        reply(&bot, &msg, "❌ User not found.").await?;
        return Ok(());
    };

    let (absolute, weekly) = match (parse_limit_arg(absolute), parse_limit_arg(weekly)) {
        (Ok(a), Ok(w)) => (a, w),
        (Err(err), _) | (_, Err(err)) => {
            reply(&bot, &msg, &format!("❌ {}", err)).await?;
            return Ok(());
        }
    };

    state.quotas.set_limits(user_id, absolute, weekly).await?;
    info!(
        "Admin {} set limits for user {}: absolute={:?} weekly={:?}",
        admin_id, user_id, absolute, weekly
    );

    reply(
        &bot,
        &msg,
        &format!(
            "✅ Limits for {}: absolute {}, weekly {}.",
            user_id,
            limit_text(absolute),
            limit_text(weekly)
        ),
    )
    .await
}

/// Handle /set_all_limits <absolute|-> <weekly|->.
pub async fn set_all_limits_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(admin_id) = ensure_admin(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let args = split_args(&args);
    let [absolute, weekly] = args.as_slice() else {
        reply(&bot, &msg, "❌ Usage: /set_all_limits <absolute|-> <weekly|->").await?;
        return Ok(());
    };

    let (absolute, weekly) = match (parse_limit_arg(absolute), parse_limit_arg(weekly)) {
        (Ok(a), Ok(w)) => (a, w),
        (Err(err), _) | (_, Err(err)) => {
            reply(&bot, &msg, &format!("❌ {}", err)).await?;
            return Ok(());
        }
    };

    let touched = state.quotas.set_all_limits(absolute, weekly).await?;
    info!(
        "Admin {} set limits for all users: absolute={:?} weekly={:?} ({} records)",
        admin_id, absolute, weekly, touched
    );

    reply(
        &bot,
        &msg,
        &format!(
            "✅ Limits for {} users: absolute {}, weekly {}.",
            touched,
            limit_text(absolute),
            limit_text(weekly)
        ),
    )
    .await
}

/// Handle /limits <id|@username>.
pub async fn limits_command(
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
        reply(&bot, &msg, "❌ Usage: /limits <id or @username>").await?;
        return Ok(());
    }

    let Some(user_id) = resolve_target(&state, arg).await? else {
        reply(&bot, &msg, "❌ User not found.").await?;
        return Ok(());
    };

    match state.limiter.quota(user_id).await? {
        Some(record) => reply(&bot, &msg, &format_quota(&record)).await,
        None => {
            reply(
                &bot,
                &msg,
                &format!("User {} has no quota record yet (unlimited).", user_id),
            )
            .await
        }
    }
}

fn limit_text(limit: Option<i64>) -> String {
    match limit {
        Some(n) => n.to_string(),
        None => "unlimited".to_string(),
    }
}

fn format_quota(record: &QuotaRecord) -> String {
    let mut text = format!(
        "📊 Limits for {}:\n\
         Absolute: {} used of {}\n\
         Weekly: {} used of {}",
        record.user_id,
        record.absolute_used,
        limit_text(record.absolute_limit),
        record.weekly_used,
        limit_text(record.weekly_limit),
    );
    if let Some(start) = record.week_start {
        text.push_str(&format!("\nWeek started: {}", format_timestamp(start)));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_quota() {
        let mut record = QuotaRecord::new(7);
        record.absolute_limit = Some(100);
        record.absolute_used = 3;
        record.weekly_used = 2;

        let text = format_quota(&record);
        assert!(text.contains("3 used of 100"));
        assert!(text.contains("2 used of unlimited"));
        assert!(!text.contains("Week started"));
    }
}
