//! Statistics commands.

use teloxide::prelude::*;

use super::{ensure_admin, reply, reply_html, resolve_target};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{BotStats, StatsPeriod, UserStats};
use crate::utils::{format_timestamp, html_escape, split_args};

/// Handle /stats [day|month|year].
pub async fn stats_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    if ensure_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }

    let period = StatsPeriod::parse(split_args(&args).first().copied());
    let stats = state.stats.overview(period).await?;
    reply_html(&bot, &msg, &format_overview(&stats)).await
}

/// Handle /user_stats <id|@username> [period].
pub async fn user_stats_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    if ensure_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }

    let args = split_args(&args);
    let Some(target) = args.first() else {
        reply(&bot, &msg, "❌ Usage: /user_stats <id or @username> [day|month|year]").await?;
        return Ok(());
    };

    let Some(user_id) = resolve_target(&state, target).await? else {
        reply(&bot, &msg, "❌ User not found.").await?;
        return Ok(());
    };

    let period = StatsPeriod::parse(args.get(1).copied());
    let stats = state.stats.user_overview(user_id, period).await?;
    reply_html(&bot, &msg, &format_user_overview(&stats)).await
}

/// Handle /top_users [limit].
pub async fn top_users_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    if ensure_admin(&bot, &msg, &state).await?.is_none() {
        return Ok(());
    }

    let limit = split_args(&args)
        .first()
        .and_then(|a| a.parse::<i64>().ok())
        .unwrap_or(10)
        .clamp(1, 50);

    let askers = state.stats.top_askers(limit).await?;
    if askers.is_empty() {
        reply(&bot, &msg, "📋 No questions asked yet.").await?;
        return Ok(());
    }

    let mut text = "🏆 Top users by questions:\n\n".to_string();
    for (i, asker) in askers.iter().enumerate() {
        let name = asker
            .user
            .as_ref()
            .and_then(|u| u.username.as_deref())
            .map(|u| format!("@{}", u))
            .unwrap_or_else(|| "-".to_string());
        text.push_str(&format!(
            "{}. ID: {} | {} | {} questions\n",
            i + 1,
            asker.user_id,
            html_escape(&name),
            asker.question_count
        ));
    }

    reply_html(&bot, &msg, &text).await
}

fn format_overview(stats: &BotStats) -> String {
    let mut text = format!(
        "📊 Statistics for the last {}\n\n\
         👥 Users: {} total, {} active, {} new\n\
         💬 Activity: {} events ({} commands, {} questions)\n\
         🤖 RAG: {} requests, {} failed\n\
         🚗 Cars set: {}\n\
         🚫 Limits hit: {}\n",
        stats.period.as_str(),
        stats.total_users,
        stats.active_users,
        stats.new_users,
        stats.total_events,
        stats.commands,
        stats.text_questions,
        stats.rag_requests,
        stats.rag_failed,
        stats.cars_set,
        stats.limits_exhausted,
    );

    if !stats.top_users.is_empty() {
        text.push_str("\n🏆 Most active:\n");
        for (i, top) in stats.top_users.iter().enumerate() {
            let name = top
                .username
                .as_deref()
                .map(|u| format!("@{}", u))
                .unwrap_or_else(|| "-".to_string());
            text.push_str(&format!(
                "{}. ID: {} | {} | {} events\n",
                i + 1,
                top.user_id,
                html_escape(&name),
                top.count
            ));
        }
    }

    text
}

fn format_user_overview(stats: &UserStats) -> String {
    let mut text = format!("👤 User {}\n", stats.user_id);

    match &stats.user {
        Some(user) => {
            let name = user
                .username
                .as_deref()
                .map(|u| format!("@{}", u))
                .unwrap_or_else(|| "-".to_string());
            text.push_str(&format!(
                "{} | {} | {}\n\
                 First seen: {}\n",
                html_escape(&name),
                user.role.as_str(),
                if user.allowed { "✅ allowed" } else { "❌ blocked" },
                format_timestamp(user.created_at),
            ));
            if let Some(car) = &user.car {
                text.push_str(&format!("🚗 {}\n", html_escape(car)));
            }
        }
        None => text.push_str("Not on the roster.\n"),
    }

    text.push_str(&format!(
        "\n💬 {} events ({} commands, {} questions)\n\
         🤖 RAG: {} requests, {} failed\n\
         🚗 Cars set: {}\n\
         🚫 Limits hit: {}\n",
        stats.total_events,
        stats.commands,
        stats.text_questions,
        stats.rag_requests,
        stats.rag_failed,
        stats.cars_set,
        stats.limits_exhausted,
    ));

    if let Some(quota) = &stats.quota {
        if quota.exhausted() {
            text.push_str("⚠️ Question limit currently reached\n");
        }
    }

    if let Some(acq) = &stats.acquisition {
        text.push_str(&format!(
            "\n📣 Acquisition: src={} campaign={} ad={}\n",
            acq.src.as_deref().unwrap_or("-"),
            acq.campaign.as_deref().unwrap_or("-"),
            acq.ad.as_deref().unwrap_or("-"),
        ));
    }

    text
}
