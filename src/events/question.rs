//! The question flow.
//!
//! A plain text message from an allowed user becomes a RAG question:
//! in-flight claim, limiter check, processing notice, gateway ask,
//! answer or fallback reply.

use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use tracing::{info, warn};

use super::InFlightQuestions;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::ActivityKind;
use crate::limits::LimitVerdict;
use crate::utils::{sanitize_text, truncate_chars};

/// Handle a plain text message as a question.
pub async fn handle_question(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    inflight: InFlightQuestions,
) -> anyhow::Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;
    let username = from.username.as_deref();
    let text = msg.text().unwrap_or("");

    info!(
        "User {} (@{}) asked: {}",
        user_id,
        username.unwrap_or("-"),
        truncate_chars(text, 100)
    );

    let Some(user) = resolve_user(&state, user_id, username).await? else {
        reply(&bot, &msg, &state.templates.text("no_access_text").await).await?;
        return Ok(());
    };
    if !user.allowed {
        warn!("User {} sent a question without access", user_id);
        reply(&bot, &msg, &state.templates.text("no_access_text").await).await?;
        return Ok(());
    }

    let question = sanitize_text(text);
    if question.is_empty() {
        reply(&bot, &msg, "Please type a question about your car.").await?;
        return Ok(());
    }

    // One question per user at a time; the claim is held until this
    // handler returns.
    let Some(_claim) = inflight.try_claim(user_id) else {
        reply(&bot, &msg, &state.templates.text("busy_text").await).await?;
        return Ok(());
    };

    state
        .activity
        .clone()
        .log_background(user_id, ActivityKind::Text, truncate_chars(&question, 100));

    match state.limiter.check_and_consume(user_id).await? {
        LimitVerdict::Allowed => {}
        LimitVerdict::Denied(reason) => {
            warn!("User {} hit a question limit: {}", user_id, reason);
            state
                .activity
                .clone()
                .log_background(user_id, ActivityKind::Action, "limit_exhausted".to_string());
            reply(&bot, &msg, &state.templates.text("limit_exceeded_text").await).await?;
            return Ok(());
        }
    }

    let notice = bot
        .send_message(msg.chat.id, state.templates.text("processing_text").await)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;

    // Prepend the stored car so the backend answers in context.
    let contextual = match user.car.as_deref() {
        Some(car) => format!("The user's car: {}\n\nQuestion: {}", car, question),
        None => question.clone(),
    };

    let answer = state.rag.ask(&contextual, user_id, username).await;

    let _ = bot.delete_message(msg.chat.id, notice.id).await;

    match answer {
        Some(answer) => reply(&bot, &msg, &answer).await?,
        None => reply(&bot, &msg, &state.templates.text("rag_error_text").await).await?,
    }

    Ok(())
}

/// Handle photos, audio and other non-text media.
pub async fn handle_media(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    if !state.users.is_allowed(user_id).await? {
        reply(&bot, &msg, &state.templates.text("no_access_text").await).await?;
        return Ok(());
    }

    reply(
        &bot,
        &msg,
        &state.templates.text("media_not_supported_text").await,
    )
    .await?;
    Ok(())
}

/// Look up the roster entry, claiming a pending entry on the user's
/// first contact.
async fn resolve_user(
    state: &AppState,
    user_id: i64,
    username: Option<&str>,
) -> anyhow::Result<Option<crate::database::RosterUser>> {
    if let Some(user) = state.users.get(user_id).await? {
        return Ok(Some(user));
    }
    if let Some(name) = username {
        if state.users.claim_pending(name, user_id).await? {
            info!("User {} (@{}) activated from pending entries", user_id, name);
            return state.users.get(user_id).await;
        }
    }
    Ok(None)
}

async fn reply(bot: &ThrottledBot, msg: &Message, text: &str) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}
