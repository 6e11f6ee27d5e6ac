use std::sync::Arc;

use teloxide::dptree;
use teloxide::prelude::*;

use crate::command;
use crate::config::AppConfig;
use crate::error::{BotResult, HandlerResult};
use crate::handler::{self, BotNotifier};
use crate::state::AppState;

pub struct BotService {
    pub bot: Bot,
}

impl BotService {
    pub fn new() -> BotResult<Self> {
        let config = AppConfig::get()?;

        Ok(Self {
            bot: Bot::new(config.telegram.0.clone()),
        })
    }

    pub async fn start(&self) -> HandlerResult<()> {
        info!("Testing connection to Telegram API...");
        match self.bot.get_me().await {
            Ok(_) => info!("Successfully connected to Telegram API"),
            Err(e) => {
                error!("Failed to connect to Telegram API: {:?}", e);
                return Err(anyhow::anyhow!("Failed to connect to Telegram API: {}", e).into());
            }
        }

        let bot = self.bot.clone();
        let state = AppState::get()?;

        // sessions ended by their timer message the user through this sink
        state
            .service
            .game
            .register_notifier(Arc::new(BotNotifier::new(bot.clone())));

        command::setup_user_commands(&bot).await?;

        info!("Starting long polling...");

        Dispatcher::builder(bot, handler::get_handler())
            .dependencies(dptree::deps![state])
            .error_handler(LoggingErrorHandler::with_custom_text(
                "An error has occurred in the dispatcher",
            ))
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}
