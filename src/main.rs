use bot::BotService;
use config::AppConfig;
use error::{BotError, BotResult};
use state::AppState;

extern crate pretty_env_logger;
#[macro_use]
extern crate log;

mod bot;
mod command;
mod config;
mod error;
mod handler;
mod service;
mod state;
mod storage;
mod utils;

#[cfg(test)]
mod tests;

#[tokio::main]
async fn main() -> BotResult<()> {
    dotenvy::dotenv().ok();

    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    let _ = pretty_env_logger::try_init_timed();

    info!("Starting bot...");

    let config = config::build_config()?;
    AppConfig::set_global(config)?;

    info!("Initializing AppState...");
    let state = AppState::new(AppConfig::get()?).await?;
    AppState::set_global(state)?;

    let bot_service = BotService::new()?;

    info!("Bot instance created");

    bot_service
        .start()
        .await
        .map_err(|e| BotError::Other(anyhow::anyhow!(e)))?;

    Ok(())
}
