use teloxide::{
    macros::BotCommands,
    payloads::SetMyCommandsSetters,
    prelude::Requester,
    types::{BotCommand, BotCommandScope, ChatId, Recipient},
    Bot,
};

use crate::error::HandlerResult;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase")]
pub enum UserCommand {
    Start,
    Help,
}

#[derive(BotCommands, Clone)]
#[command(rename_rule = "snake_case", parse_with = "split")]
pub enum AdminCommand {
    Stats,
    Users,
    User { id: u64 },
    ExportResults,
    Leaderboard,
}

fn user_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("start", "show the main menu"),
        BotCommand::new("help", "how to play"),
    ]
}

fn admin_commands() -> Vec<BotCommand> {
    let mut commands = user_commands();
    commands.extend([
        BotCommand::new("stats", "overall bot statistics"),
        BotCommand::new("users", "list registered users"),
        BotCommand::new("user", "statistics for one user: /user <id>"),
        BotCommand::new("export_results", "export all results as CSV"),
        BotCommand::new("leaderboard", "top players"),
    ]);
    commands
}

pub async fn setup_user_commands(bot: &Bot) -> HandlerResult<()> {
    bot.delete_my_commands().await?;
    bot.set_my_commands(user_commands()).await?;
    Ok(())
}

async fn setup_admin_commands(bot: &Bot, chat_id: ChatId) -> HandlerResult<()> {
    bot.set_my_commands(admin_commands())
        .scope(BotCommandScope::Chat {
            chat_id: Recipient::Id(chat_id),
        })
        .await?;
    Ok(())
}

#[cfg(not(test))]
pub async fn setup_commands(bot: &Bot, is_admin: bool, chat_id: ChatId) -> HandlerResult<()> {
    if is_admin {
        setup_admin_commands(bot, chat_id).await?;
    } else {
        setup_user_commands(bot).await?;
    }
    Ok(())
}

#[cfg(test)]
pub async fn setup_commands(_bot: &Bot, _is_admin: bool, _chat_id: ChatId) -> HandlerResult<()> {
    Ok(())
}
