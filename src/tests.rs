use teloxide::dptree;
use teloxide_tests::{MockBot, MockMessageText};
use tokio::sync::Mutex;

use crate::handler;
use crate::state::AppState;

static TEST_MUTEX: Mutex<()> = Mutex::const_new(());

async fn setup_test_bot(text: &str) -> MockBot {
    let _lock = TEST_MUTEX.lock().await;

    let state = AppState::init_test();

    let bot = MockBot::new(MockMessageText::new().text(text), handler::get_handler());
    bot.dependencies(dptree::deps![state]);

    bot
}

#[tokio::test]
async fn test_start_command() {
    let bot = setup_test_bot("/start").await;
    bot.dispatch().await;

    let responses = bot.get_responses();
    let message = responses.sent_messages.last().expect("No sent messages were detected!");

    assert_eq!(
        message.text(),
        Some(
            "👋 Hi First!\n\nI ask quick arithmetic problems and you get 60 seconds to solve as many as you can.\n\nPick an option below:"
        )
    );
}

#[tokio::test]
async fn test_help_command() {
    let bot = setup_test_bot("/help").await;
    bot.dispatch().await;

    let responses = bot.get_responses();
    let message = responses.sent_messages.last().expect("No sent messages were detected!");

    assert_eq!(message.text(), Some(handler::HELP_TEXT));
}

#[tokio::test]
async fn test_answer_without_active_game() {
    let bot = setup_test_bot("42").await;
    bot.dispatch().await;

    let responses = bot.get_responses();
    let message = responses.sent_messages.last().expect("No sent messages were detected!");

    assert_eq!(
        message.text(),
        Some("You don't have an active game. Press 🎮 Start game 🦄")
    );
}
