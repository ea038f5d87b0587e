//! /help command.

use teloxide::prelude::*;

use super::reply;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::ActivityKind;

const USER_HELP: &str = "🤖 Car Assistant - Help\n\n\
Commands:\n\
/set_car <description> - save your car description\n\
/my_car - show your saved car\n\
/to - service booking contact\n\
/help - this help\n\n\
AI assistant:\n\
Just type any question about your car and I'll do my best to help!";

const ADMIN_HELP: &str = "\n\nAdmin commands:\n\
/add_user <id|@username> - allow-list a user\n\
/del_user <id|@username> - remove a user\n\
/list_users [filter] [limit] [offset] - roster listing\n\
/pending_users - entries awaiting first contact\n\
/top_users [limit] - roster ranked by question count\n\
/set_limits <id|@username> <absolute|-> <weekly|-> - per-user limits\n\
/set_all_limits <absolute|-> <weekly|-> - limits for everyone\n\
/limits <id|@username> - show a user's limits\n\
/set_template <key> <text> - override a user-facing text\n\
/stats [day|month|year] - bot statistics\n\
/user_stats <id|@username> [period] - per-user statistics\n\
/export_users - roster CSV export\n\n\
Filters for /list_users: allowed, pending, admins, users, name:<text>";

/// Handle /help; admins get the admin section appended.
pub async fn help_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = from.id.0 as i64;

    state
        .activity
        .clone()
        .log_background(user_id, ActivityKind::Command, "help".to_string());

    let mut text = USER_HELP.to_string();
    if state.users.is_admin(user_id).await? {
        text.push_str(ADMIN_HELP);
    }
    text.push_str(&format!(
        "\n\n{}",
        state.templates.text("support_text").await
    ));

    reply(&bot, &msg, &text).await
}
