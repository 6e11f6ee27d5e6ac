use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{ChatId, UserId};

use crate::service::game::{GameOverNotifier, GameResult};
use crate::utils;

use super::keyboard::get_play_again_keyboard;

/// Delivers the "time's up" message when a round ends by timer.
pub struct BotNotifier {
    bot: Bot,
}

impl BotNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl GameOverNotifier for BotNotifier {
    async fn game_over(&self, user_id: UserId, result: &GameResult) {
        let send = self
            .bot
            .send_message(ChatId(user_id.0 as i64), utils::format_game_over(result))
            .reply_markup(get_play_again_keyboard())
            .await;

        if let Err(e) = send {
            error!("failed to deliver game-over message to {}: {}", user_id, e);
        }
    }
}
