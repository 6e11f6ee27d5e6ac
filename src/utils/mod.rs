use teloxide::types::UserId;

use crate::error::BotResult;
use crate::service::game::{GameResult, Problem};
use crate::service::stats::{LeaderboardEntry, UserStats};
use crate::state::AppState;

pub fn is_admin(user_id: UserId) -> BotResult<bool> {
    let admin_config = AppState::get()?.config.admin.clone();
    Ok(admin_config.telegram_user_id == user_id)
}

pub fn format_problem(problem: &Problem) -> String {
    format!("🧮 {} = ?", problem.text)
}

/// Monospace leaderboard table, wrapped in a code fence for Markdown.
pub fn format_leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "🏆 The leaderboard is empty. Be the first!".to_string();
    }

    let mut text = String::from("🏆 *Top players:*\n\n```\n");
    text.push_str(&format!("{:<4} {:<20} {:<10} {:<6}\n", "#", "Player", "Best", "Games"));
    text.push_str(&"-".repeat(42));
    text.push('\n');

    for (idx, entry) in entries.iter().enumerate() {
        let mut name = entry.display_name.clone();
        if name.chars().count() > 18 {
            name = name.chars().take(15).collect::<String>() + "...";
        }
        text.push_str(&format!(
            "{:<4} {:<20} {:<10} {:<6}\n",
            idx + 1,
            name,
            entry.best_score,
            entry.games_played
        ));
    }

    text.push_str("```");
    text
}

pub fn format_user_stats(name: &str, stats: &UserStats) -> String {
    let mut text = format!("📊 *Stats for {}:*\n\n", name);
    text.push_str(&format!("🎮 Games played: {}\n", stats.total_games));
    text.push_str(&format!("⭐ Best score: {}\n", stats.best_score));
    text.push_str(&format!("📈 Average score: {:.1}\n", stats.avg_score));

    if let Some(accuracy) = stats.accuracy {
        text.push_str(&format!("🎯 Accuracy: {:.1}%\n", accuracy * 100.0));
        text.push_str(&format!(
            "✅ Correct answers: {} of {}\n",
            stats.total_correct, stats.total_questions
        ));
    }

    text
}

pub fn format_game_over(result: &GameResult) -> String {
    format!(
        "⏰ Time's up!\n\n⭐ Score: {}\n✅ Correct answers: {} of {}",
        result.score,
        result.correct_answers,
        result.attempts.len()
    )
}

/// RFC-4180 field quoting: quote when the value carries a comma, a quote
/// or a line break, doubling any embedded quotes.
pub fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
