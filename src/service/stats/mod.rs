mod error;
mod model;

pub use error::StatsError;
pub use model::*;

use std::collections::HashMap;

use teloxide::types::UserId;

use crate::storage::StorageManager;
use crate::utils::csv_field;

/// Read-only derivations over the persisted game history. Nothing here
/// touches live sessions and every call recomputes from storage.
#[derive(Clone)]
pub struct StatsService {
    storage: StorageManager,
}

impl StatsService {
    pub fn new(storage: StorageManager) -> Self {
        Self { storage }
    }

    /// Top players by best score, then by games played. Users keep their
    /// first-appearance order through the stable sort, so identical input
    /// always produces the same board.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, StatsError> {
        let results = self.storage.get_all_game_results().await?;
        let users = self.storage.get_all_users().await?;

        let profiles: HashMap<UserId, _> = users.into_iter().map(|u| (u.telegram_id, u)).collect();

        let mut order: Vec<UserId> = Vec::new();
        let mut totals: HashMap<UserId, (u32, u32)> = HashMap::new();
        for result in &results {
            let (best_score, games_played) = totals
                .entry(result.user_telegram_id)
                .or_insert_with(|| {
                    order.push(result.user_telegram_id);
                    (0, 0)
                });
            *best_score = (*best_score).max(result.score);
            *games_played += 1;
        }

        let mut board: Vec<LeaderboardEntry> = order
            .into_iter()
            .map(|user_id| {
                let (best_score, games_played) = totals[&user_id];
                let display_name = profiles
                    .get(&user_id)
                    .map(|p| p.display_name().to_string())
                    .unwrap_or_else(|| "anonymous".to_string());
                LeaderboardEntry {
                    display_name,
                    best_score,
                    games_played,
                }
            })
            .collect();

        board.sort_by(|a, b| {
            b.best_score
                .cmp(&a.best_score)
                .then(b.games_played.cmp(&a.games_played))
        });
        board.truncate(limit);

        Ok(board)
    }

    /// Aggregates over one user's history; `None` when they never played.
    pub async fn user_stats(&self, user_id: UserId) -> Result<Option<UserStats>, StatsError> {
        let results = self.storage.get_all_game_results().await?;

        let mut stats = UserStats {
            total_games: 0,
            best_score: 0,
            avg_score: 0.0,
            total_questions: 0,
            total_correct: 0,
            accuracy: None,
        };
        let mut score_sum: u64 = 0;

        for result in results.iter().filter(|r| r.user_telegram_id == user_id) {
            stats.total_games += 1;
            stats.best_score = stats.best_score.max(result.score);
            stats.total_questions += result.total_questions;
            stats.total_correct += result.correct_answers;
            score_sum += u64::from(result.score);
        }

        if stats.total_games == 0 {
            return Ok(None);
        }

        stats.avg_score = score_sum as f64 / f64::from(stats.total_games);
        if stats.total_questions > 0 {
            stats.accuracy = Some(f64::from(stats.total_correct) / f64::from(stats.total_questions));
        }

        Ok(Some(stats))
    }

    pub async fn overall_stats(&self) -> Result<OverallStats, StatsError> {
        let results = self.storage.get_all_game_results().await?;
        let users = self.storage.get_all_users().await?;

        Ok(OverallStats {
            total_users: users.len() as u32,
            total_games: results.len() as u32,
            total_questions: results.iter().map(|r| r.total_questions).sum(),
        })
    }

    /// All game results as CSV, one row per result, header first. Missing
    /// profile fields become empty strings.
    pub async fn export_csv(&self) -> Result<String, StatsError> {
        let results = self.storage.get_all_game_results().await?;
        let users = self.storage.get_all_users().await?;

        let profiles: HashMap<UserId, _> = users.into_iter().map(|u| (u.telegram_id, u)).collect();

        let mut out = String::from(
            "Telegram ID,Username,First Name,Score,Total Questions,Correct Answers,Started At,Finished At\n",
        );

        for result in &results {
            let profile = profiles.get(&result.user_telegram_id);
            let username = profile.and_then(|p| p.username.as_deref()).unwrap_or("");
            let first_name = profile.and_then(|p| p.first_name.as_deref()).unwrap_or("");
            let finished_at = result
                .finished_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();

            let row = [
                result.user_telegram_id.to_string(),
                csv_field(username),
                csv_field(first_name),
                result.score.to_string(),
                result.total_questions.to_string(),
                result.correct_answers.to_string(),
                csv_field(&result.started_at.to_rfc3339()),
                csv_field(&finished_at),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::service::game::GameResult;

    async fn seed(storage: &StorageManager, user_id: UserId, scores: &[u32]) {
        for &score in scores {
            let mut result = GameResult::new(user_id, Utc::now());
            result.score = score;
            result.correct_answers = score;
            result.total_questions = score + 1;
            result.finished_at = Some(Utc::now());
            storage.save_game_result(&result).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_leaderboard_orders_by_best_then_games() {
        let storage = StorageManager::memory();
        storage
            .get_or_create_user(UserId(1), Some("alice".into()), None, None)
            .await
            .unwrap();
        storage
            .get_or_create_user(UserId(2), None, Some("Bob".into()), None)
            .await
            .unwrap();
        seed(&storage, UserId(1), &[3, 7]).await;
        seed(&storage, UserId(2), &[5]).await;

        let board = StatsService::new(storage).leaderboard(10).await.unwrap();

        assert_eq!(board.len(), 2);
        assert_eq!(board[0].display_name, "alice");
        assert_eq!(board[0].best_score, 7);
        assert_eq!(board[0].games_played, 2);
        assert_eq!(board[1].display_name, "Bob");
        assert_eq!(board[1].best_score, 5);
        assert_eq!(board[1].games_played, 1);
    }

    #[tokio::test]
    async fn test_leaderboard_truncates_and_falls_back_on_names() {
        let storage = StorageManager::memory();
        seed(&storage, UserId(9), &[2]).await;
        seed(&storage, UserId(8), &[6]).await;

        let board = StatsService::new(storage).leaderboard(1).await.unwrap();

        assert_eq!(board.len(), 1);
        // no profile was ever created for these users
        assert_eq!(board[0].display_name, "anonymous");
        assert_eq!(board[0].best_score, 6);
    }

    #[tokio::test]
    async fn test_user_stats_math() {
        let storage = StorageManager::memory();
        seed(&storage, UserId(1), &[3, 5]).await;
        let stats = StatsService::new(storage.clone());

        let summary = stats.user_stats(UserId(1)).await.unwrap().unwrap();
        assert_eq!(summary.total_games, 2);
        assert_eq!(summary.best_score, 5);
        assert_eq!(summary.avg_score, 4.0);
        assert_eq!(summary.total_questions, 10);
        assert_eq!(summary.total_correct, 8);
        assert_eq!(summary.accuracy, Some(0.8));

        assert!(stats.user_stats(UserId(404)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_overall_stats() {
        let storage = StorageManager::memory();
        storage
            .get_or_create_user(UserId(1), Some("alice".into()), None, None)
            .await
            .unwrap();
        seed(&storage, UserId(1), &[1, 2]).await;

        let overall = StatsService::new(storage).overall_stats().await.unwrap();
        assert_eq!(overall.total_users, 1);
        assert_eq!(overall.total_games, 2);
        assert_eq!(overall.total_questions, 2 + 3);
    }

    #[tokio::test]
    async fn test_csv_export_shape() {
        let storage = StorageManager::memory();
        storage
            .get_or_create_user(UserId(1), Some("a,b".into()), Some("Ann".into()), None)
            .await
            .unwrap();
        seed(&storage, UserId(1), &[2]).await;
        // result for a user without a stored profile
        seed(&storage, UserId(2), &[0]).await;

        let csv = StatsService::new(storage).export_csv().await.unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Telegram ID,Username,First Name,"));
        assert!(lines[1].starts_with("1,\"a,b\",Ann,2,3,2,"));
        assert!(lines[2].starts_with("2,,,0,1,0,"));
    }
}
