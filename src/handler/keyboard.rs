use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

pub fn get_main_menu_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        [InlineKeyboardButton::callback("🎮 Start game", "start_game")],
        [InlineKeyboardButton::callback("🏆 Leaderboard", "leaderboard")],
        [InlineKeyboardButton::callback("👤 My profile", "my_profile")],
    ])
}

pub fn get_play_again_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        [InlineKeyboardButton::callback("🔁 Play again", "play_again")],
        [InlineKeyboardButton::callback("🏆 Leaderboard", "leaderboard")],
    ])
}
