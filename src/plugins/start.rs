//! /start command.
//!
//! Greets according to roster state, claims pending entries on first
//! contact and records the acquisition deep link.

use teloxide::prelude::*;
use tracing::info;

use super::reply;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{AcquisitionRecord, ActivityKind};

/// Handle /start with an optional deep-link payload.
pub async fn start_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;
    let username = from.username.as_deref();

    // A user added by username becomes real on first contact.
    let mut user = state.users.get(user_id).await?;
    if user.is_none() {
        if let Some(name) = username {
            if state.users.claim_pending(name, user_id).await? {
                user = state.users.get(user_id).await?;
            }
        }
    }

    // First deep link wins; later /start payloads are ignored.
    let payload = args.trim();
    if !payload.is_empty() {
        let record =
            AcquisitionRecord::from_payload(user_id, payload, from.language_code.clone());
        if state.acquisition.save_first(&record).await? {
            info!(
                "Recorded acquisition for user {}: src={:?} campaign={:?} ad={:?}",
                user_id, record.src, record.campaign, record.ad
            );
        }
    }

    state
        .activity
        .clone()
        .log_background(user_id, ActivityKind::Command, "start".to_string());

    let welcome = state.templates.text("welcome_text").await;

    let text = match user {
        Some(user) if user.allowed => {
            let mut text = format!(
                "👋 {}\n\n\
                 Commands:\n\
                 /set_car <description> - save your car\n\
                 /my_car - show your saved car\n\
                 /to - book a service appointment\n\
                 /help - full help\n\n\
                 Just type any question about your car and I'll do my best to help!",
                welcome
            );
            if user.is_admin() {
                text.push_str("\n\nYou are an administrator; see /help for the admin commands.");
            } else {
                text.push_str(
                    "\n\nExample questions:\n\
                     - How often should I change the oil?\n\
                     - The check engine light is on, what now?\n\
                     - How do I prepare the car for winter?",
                );
            }
            text
        }
        _ => format!(
            "👋 {}\n\n{}",
            welcome,
            state.templates.text("no_access_text").await
        ),
    };

    reply(&bot, &msg, &text).await
}
