use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;

use crate::error::HandlerResult;
use crate::service::game::AnswerOutcome;
use crate::state::AppState;
use crate::utils;

use super::keyboard::{get_main_menu_keyboard, get_play_again_keyboard};

pub fn get_message_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync>> {
    Update::filter_message()
        .filter(|msg: Message| msg.text().is_some_and(|text| !text.starts_with('/')))
        .endpoint(handle_answer)
}

/// Every non-command text message is treated as an answer to the user's
/// outstanding problem.
async fn handle_answer(bot: Bot, msg: Message, state: AppState) -> HandlerResult<()> {
    let Some(user) = msg.from.clone() else {
        return Ok(());
    };
    let Some(text) = msg.text() else {
        return Ok(());
    };

    match state.service.game.process_answer(user.id, text).await? {
        AnswerOutcome::NoActiveSession => {
            bot.send_message(msg.chat.id, "You don't have an active game. Press 🎮 Start game 🦄")
                .reply_markup(get_main_menu_keyboard())
                .await?;
        }
        AnswerOutcome::InvalidInput => {
            bot.send_message(
                msg.chat.id,
                "Hmm, that doesn't look like a number 🫣 — send a whole number, e.g. 42.",
            )
            .await?;
        }
        AnswerOutcome::Expired(result) => {
            bot.send_message(msg.chat.id, utils::format_game_over(&result))
                .reply_markup(get_play_again_keyboard())
                .await?;
        }
        AnswerOutcome::Accepted { correct, next_problem } => {
            let verdict = if correct { "✅ Correct!" } else { "❌ Not this time!" };
            bot.send_message(
                msg.chat.id,
                format!("{}\n\n{}", verdict, utils::format_problem(&next_problem)),
            )
            .await?;
        }
    }

    Ok(())
}
