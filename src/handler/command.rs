use teloxide::dispatching::{HandlerExt, UpdateFilterExt, UpdateHandler};
use teloxide::dptree;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode, UserId};

use crate::command::{self, AdminCommand, UserCommand};
use crate::config::GAME_DURATION_SECONDS;
use crate::error::HandlerResult;
use crate::state::AppState;
use crate::utils;

use super::keyboard::get_main_menu_keyboard;

pub(crate) const HELP_TEXT: &str = "ℹ️ How to play\n\nPress 🎮 Start game and answer every problem with a whole number. You have 60 seconds per round.\n\n/start - show the main menu\n/help - show this message";

async fn handle_start(bot: Bot, msg: Message) -> HandlerResult<()> {
    let first_name = msg
        .from
        .as_ref()
        .map(|user| user.first_name.clone())
        .unwrap_or_default();

    let is_admin = msg
        .from
        .as_ref()
        .map(|user| utils::is_admin(user.id).unwrap_or(false))
        .unwrap_or(false);

    let welcome_text = format!(
        "👋 Hi {}!\n\nI ask quick arithmetic problems and you get {} seconds to solve as many as you can.\n\nPick an option below:",
        first_name, GAME_DURATION_SECONDS
    );

    bot.send_message(msg.chat.id, welcome_text)
        .reply_markup(get_main_menu_keyboard())
        .await?;

    command::setup_commands(&bot, is_admin, msg.chat.id).await?;

    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> HandlerResult<()> {
    bot.send_message(msg.chat.id, HELP_TEXT).await?;
    Ok(())
}

async fn handle_user_command(bot: Bot, msg: Message, cmd: UserCommand) -> HandlerResult<()> {
    match cmd {
        UserCommand::Start => handle_start(bot, msg).await,
        UserCommand::Help => handle_help(bot, msg).await,
    }
}

async fn handle_stats(bot: Bot, msg: Message, state: AppState) -> HandlerResult<()> {
    let overall = state.service.stats.overall_stats().await?;

    let text = format!(
        "📈 Bot statistics\n\n👥 Users: {}\n🎮 Games played: {}\n🧮 Questions asked: {}",
        overall.total_users, overall.total_games, overall.total_questions
    );
    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

async fn handle_users(bot: Bot, msg: Message, state: AppState) -> HandlerResult<()> {
    let users = state.storage.get_all_users().await?;

    if users.is_empty() {
        bot.send_message(msg.chat.id, "No users yet.").await?;
        return Ok(());
    }

    let mut text = format!("👥 {} registered users:\n\n", users.len());
    for user in &users {
        text.push_str(&format!(
            "• {} ({}), joined {}\n",
            user.display_name(),
            user.telegram_id,
            user.created_at.format("%Y-%m-%d")
        ));
    }
    bot.send_message(msg.chat.id, text).await?;

    Ok(())
}

async fn handle_user(bot: Bot, msg: Message, state: AppState, id: u64) -> HandlerResult<()> {
    let user_id = UserId(id);

    let Some(stats) = state.service.stats.user_stats(user_id).await? else {
        bot.send_message(msg.chat.id, "This user hasn't played yet.").await?;
        return Ok(());
    };

    let users = state.storage.get_all_users().await?;
    let name = users
        .iter()
        .find(|u| u.telegram_id == user_id)
        .map(|u| u.display_name().to_string())
        .unwrap_or_else(|| user_id.to_string());

    bot.send_message(msg.chat.id, utils::format_user_stats(&name, &stats))
        .parse_mode(ParseMode::Markdown)
        .await?;

    Ok(())
}

async fn handle_export_results(bot: Bot, msg: Message, state: AppState) -> HandlerResult<()> {
    let csv = state.service.stats.export_csv().await?;

    let document = InputFile::memory(csv.into_bytes()).file_name("results.csv");
    bot.send_document(msg.chat.id, document).await?;

    Ok(())
}

async fn handle_leaderboard(bot: Bot, msg: Message, state: AppState) -> HandlerResult<()> {
    let board = state.service.stats.leaderboard(10).await?;

    bot.send_message(msg.chat.id, utils::format_leaderboard(&board))
        .parse_mode(ParseMode::Markdown)
        .await?;

    Ok(())
}

async fn handle_admin_command(bot: Bot, msg: Message, cmd: AdminCommand, state: AppState) -> HandlerResult<()> {
    match cmd {
        AdminCommand::Stats => handle_stats(bot, msg, state).await,
        AdminCommand::Users => handle_users(bot, msg, state).await,
        AdminCommand::User { id } => handle_user(bot, msg, state, id).await,
        AdminCommand::ExportResults => handle_export_results(bot, msg, state).await,
        AdminCommand::Leaderboard => handle_leaderboard(bot, msg, state).await,
    }
}

pub fn get_command_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<AdminCommand>()
                .filter(|msg: Message| {
                    msg.from
                        .as_ref()
                        .map(|user| utils::is_admin(user.id).unwrap_or(false))
                        .unwrap_or(false)
                })
                .endpoint(handle_admin_command),
        )
        .branch(
            Update::filter_message()
                .filter_command::<UserCommand>()
                .endpoint(handle_user_command),
        )
}
