use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, ChatId, ParseMode, User};

use crate::config::GAME_DURATION_SECONDS;
use crate::error::HandlerResult;
use crate::service::game::GameError;
use crate::state::AppState;
use crate::utils;

use super::keyboard::{get_main_menu_keyboard, get_play_again_keyboard};

async fn handle_callback(bot: Bot, q: CallbackQuery, state: AppState) -> HandlerResult<()> {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };

    let chat_id = q
        .message
        .as_ref()
        .map(|message| message.chat().id)
        .unwrap_or(ChatId(q.from.id.0 as i64));
    let user = q.from.clone();

    match data.as_str() {
        "start_game" => start_round(&bot, chat_id, &user, &state).await?,

        "play_again" => {
            // end whatever round may still be live, then start fresh
            state.service.game.force_end_game(user.id).await;
            start_round(&bot, chat_id, &user, &state).await?;
        }

        "leaderboard" => {
            let board = state.service.stats.leaderboard(10).await?;
            bot.send_message(chat_id, utils::format_leaderboard(&board))
                .parse_mode(ParseMode::Markdown)
                .await?;
        }

        "my_profile" => {
            let name = user.username.clone().unwrap_or_else(|| user.first_name.clone());
            match state.service.stats.user_stats(user.id).await? {
                Some(stats) => {
                    bot.send_message(chat_id, utils::format_user_stats(&name, &stats))
                        .parse_mode(ParseMode::Markdown)
                        .await?;
                }
                None => {
                    bot.send_message(chat_id, "You haven't played yet. Press 🎮 Start game!")
                        .reply_markup(get_main_menu_keyboard())
                        .await?;
                }
            }
        }

        other => warn!("unknown callback data: {}", other),
    }

    bot.answer_callback_query(q.id).await?;

    Ok(())
}

async fn start_round(bot: &Bot, chat_id: ChatId, user: &User, state: &AppState) -> HandlerResult<()> {
    let started = state
        .service
        .game
        .start_game(
            user.id,
            user.username.clone(),
            Some(user.first_name.clone()),
            user.last_name.clone(),
        )
        .await;

    match started {
        Ok(session) => {
            bot.send_message(
                chat_id,
                format!(
                    "🏁 Go! You have {} seconds.\n\n{}",
                    GAME_DURATION_SECONDS,
                    utils::format_problem(&session.current_problem)
                ),
            )
            .await?;
        }
        Err(GameError::SessionAlreadyActive) => {
            bot.send_message(chat_id, "You already have a game running — finish it first!")
                .await?;
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

pub fn get_callback_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_callback_query().endpoint(handle_callback)
}
