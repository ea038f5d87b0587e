//! /set_car and /my_car commands.

use teloxide::prelude::*;
use tracing::info;

use super::{ensure_allowed, reply};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::ActivityKind;
use crate::utils::{sanitize_text, truncate_chars, validate_car_description};

/// Handle /set_car <description>.
pub async fn set_car_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    args: String,
) -> anyhow::Result<()> {
    let Some(user) = ensure_allowed(&bot, &msg, &state).await? else {
        return Ok(());
    };

    if args.trim().is_empty() {
        reply(&bot, &msg, "❌ Usage: /set_car <car description>").await?;
        return Ok(());
    }

    if !validate_car_description(&args) {
        reply(
            &bot,
            &msg,
            "❌ That description is too short; use at least 3 characters.",
        )
        .await?;
        return Ok(());
    }

    let car = sanitize_text(&args);

    state.users.set_car(user.user_id, &car).await?;
    info!("User {} set car: {}", user.user_id, truncate_chars(&car, 100));

    state.activity.clone().log_background(
        user.user_id,
        ActivityKind::Command,
        format!("set_car: {}", truncate_chars(&car, 100)),
    );
    state
        .activity
        .clone()
        .log_background(user.user_id, ActivityKind::Action, "set_car".to_string());

    reply(&bot, &msg, &format!("✅ Car saved:\n🚗 {}", car)).await
}

/// Handle /my_car.
pub async fn my_car_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(user) = ensure_allowed(&bot, &msg, &state).await? else {
        return Ok(());
    };

    state
        .activity
        .clone()
        .log_background(user.user_id, ActivityKind::Command, "my_car".to_string());

    match user.car.as_deref() {
        Some(car) => reply(&bot, &msg, &format!("🚗 Your car:\n{}", car)).await,
        None => {
            reply(
                &bot,
                &msg,
                "❌ No car saved yet.\nUse /set_car <description> to save one.",
            )
            .await
        }
    }
}
