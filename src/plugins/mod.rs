//! Command handlers.
//!
//! Add new commands by:
//! 1. Creating a handler in a module here
//! 2. Adding a `Command` variant
//! 3. Adding the branch to `command_handler()`

pub mod admin;
pub mod car;
pub mod export;
pub mod help;
pub mod limits;
pub mod service;
pub mod start;
pub mod stats;
pub mod templates;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ReplyParameters;
use teloxide::utils::command::BotCommands;
use tracing::warn;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::RosterUser;
use crate::utils::extract_user_id;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", description = "Available commands:")]
pub enum Command {
    #[command(description = "start the bot")]
    Start(String),

    #[command(description = "show help")]
    Help,

    #[command(description = "save your car description")]
    SetCar(String),

    #[command(description = "show your saved car")]
    MyCar,

    #[command(description = "service booking contact")]
    To,

    // Admin commands
    #[command(description = "register the first administrator")]
    Bootstrap(String),

    #[command(description = "allow-list a user")]
    AddUser(String),

    #[command(description = "remove a user")]
    DelUser(String),

    #[command(description = "list roster users")]
    ListUsers(String),

    #[command(description = "users awaiting first contact")]
    PendingUsers,

    #[command(description = "users ranked by question count")]
    TopUsers(String),

    #[command(description = "set a user's question limits")]
    SetLimits(String),

    #[command(description = "set question limits for everyone")]
    SetAllLimits(String),

    #[command(description = "show a user's question limits")]
    Limits(String),

    #[command(description = "override a user-facing text")]
    SetTemplate(String),

    #[command(description = "bot statistics")]
    Stats(String),

    #[command(description = "per-user statistics")]
    UserStats(String),

    #[command(description = "export the roster as CSV")]
    ExportUsers,
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start(args)].endpoint(start::start_command))
        .branch(case![Command::Help].endpoint(help::help_command))
        .branch(case![Command::SetCar(args)].endpoint(car::set_car_command))
        .branch(case![Command::MyCar].endpoint(car::my_car_command))
        .branch(case![Command::To].endpoint(service::to_command))
        // Admin
        .branch(case![Command::Bootstrap(args)].endpoint(admin::bootstrap_command))
        .branch(case![Command::AddUser(args)].endpoint(admin::add_user_command))
        .branch(case![Command::DelUser(args)].endpoint(admin::del_user_command))
        .branch(case![Command::ListUsers(args)].endpoint(admin::list_users_command))
        .branch(case![Command::PendingUsers].endpoint(admin::pending_users_command))
        .branch(case![Command::TopUsers(args)].endpoint(stats::top_users_command))
        .branch(case![Command::SetLimits(args)].endpoint(limits::set_limits_command))
        .branch(case![Command::SetAllLimits(args)].endpoint(limits::set_all_limits_command))
        .branch(case![Command::Limits(args)].endpoint(limits::limits_command))
        .branch(case![Command::SetTemplate(args)].endpoint(templates::set_template_command))
        .branch(case![Command::Stats(args)].endpoint(stats::stats_command))
        .branch(case![Command::UserStats(args)].endpoint(stats::user_stats_command))
        .branch(case![Command::ExportUsers].endpoint(export::export_users_command))
}

/// Reply to the command message.
pub(crate) async fn reply(bot: &ThrottledBot, msg: &Message, text: &str) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Reply with HTML formatting.
pub(crate) async fn reply_html(
    bot: &ThrottledBot,
    msg: &Message,
    text: &str,
) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(teloxide::types::ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Check the sender is an administrator; reply with a denial otherwise.
///
/// Returns the admin's user id when the check passes.
pub(crate) async fn ensure_admin(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<Option<i64>> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(None);
    };
    let user_id = from.id.0 as i64;

    if state.users.is_admin(user_id).await? {
        return Ok(Some(user_id));
    }

    warn!("User {} tried an admin command without permission", user_id);
    reply(bot, msg, "❌ You don't have permission for this command.").await?;
    Ok(None)
}

/// Check the sender is on the allow-list; reply with the no-access text
/// otherwise. Returns the roster entry when the check passes.
pub(crate) async fn ensure_allowed(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<Option<RosterUser>> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(None);
    };
    let user_id = from.id.0 as i64;

    match state.users.get(user_id).await? {
        Some(user) if user.allowed => Ok(Some(user)),
        _ => {
            reply(bot, msg, &state.templates.text("no_access_text").await).await?;
            Ok(None)
        }
    }
}

/// Resolve a `<id|@username>` argument to a roster user id.
pub(crate) async fn resolve_target(state: &AppState, arg: &str) -> anyhow::Result<Option<i64>> {
    if let Some(id) = extract_user_id(arg) {
        return Ok(Some(id));
    }
    if let Some(name) = arg.trim().strip_prefix('@') {
        return Ok(state
            .users
            .get_by_username(name)
            .await?
            .map(|u| u.user_id));
    }
    Ok(None)
}
