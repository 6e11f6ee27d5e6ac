mod error;
mod model;
mod problem;

pub use error::GameError;
pub use model::*;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use teloxide::types::UserId;
use tokio::time::{sleep_until, Instant};

use crate::config::GAME_DURATION_SECONDS;
use crate::storage::StorageManager;

/// Front-end sink invoked when a session is finalized by its timer rather
/// than by an explicit call.
#[async_trait]
pub trait GameOverNotifier: Send + Sync + 'static {
    async fn game_over(&self, user_id: UserId, result: &GameResult);
}

/// Owns the table of live sessions. At most one session exists per user;
/// mutating operations serialize per key through the map's shard locks, and
/// the atomic `remove` in [`GameService::finalize`] guarantees each session
/// is finalized exactly once no matter how the timer and explicit calls
/// interleave.
#[derive(Clone)]
pub struct GameService {
    sessions: Arc<DashMap<UserId, GameSession>>,
    storage: StorageManager,
    game_duration: Duration,
    notifier: Arc<OnceLock<Arc<dyn GameOverNotifier>>>,
}

impl GameService {
    pub fn new(storage: StorageManager) -> Self {
        info!("Initializing game service");
        Self::with_duration(storage, Duration::from_secs(GAME_DURATION_SECONDS))
    }

    fn with_duration(storage: StorageManager, game_duration: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            storage,
            game_duration,
            notifier: Arc::new(OnceLock::new()),
        }
    }

    /// Registers the sink told about timer-expired games. Set once at
    /// startup; a second registration is ignored.
    pub fn register_notifier(&self, notifier: Arc<dyn GameOverNotifier>) {
        if self.notifier.set(notifier).is_err() {
            warn!("game-over notifier already registered");
        }
    }

    /// Starts a round: resolves the profile, generates the first problem
    /// and arms the expiry timer. Fails with
    /// [`GameError::SessionAlreadyActive`] while a previous round is live.
    pub async fn start_game(
        &self,
        user_id: UserId,
        username: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<GameSnapshot, GameError> {
        if self.sessions.contains_key(&user_id) {
            return Err(GameError::SessionAlreadyActive);
        }

        self.storage
            .get_or_create_user(user_id, username, first_name, last_name)
            .await?;

        let problem = Problem::generate(&mut rand::thread_rng());
        let started_at = Utc::now();
        let end_time = started_at + chrono::Duration::milliseconds(self.game_duration.as_millis() as i64);

        let deadline = Instant::now() + self.game_duration;
        let timer = tokio::spawn({
            let game = self.clone();
            async move {
                sleep_until(deadline).await;
                game.expire(user_id).await;
            }
        });

        let session = GameSession {
            user_id,
            current_problem: problem.clone(),
            score: 0,
            total_questions: 1,
            correct_answers: 0,
            end_time,
            result: GameResult::new(user_id, started_at),
            timer: Some(timer.abort_handle()),
        };

        // The profile lookup above awaited, so re-check under the entry
        // guard: a concurrent start may have won the slot in the meantime.
        match self.sessions.entry(user_id) {
            Entry::Occupied(_) => {
                timer.abort();
                Err(GameError::SessionAlreadyActive)
            }
            Entry::Vacant(slot) => {
                slot.insert(session);
                info!("started game for {}, ends at {}", user_id, end_time);
                Ok(GameSnapshot {
                    current_problem: problem,
                    score: 0,
                    total_questions: 1,
                    correct_answers: 0,
                    started_at,
                    end_time,
                    attempts: Vec::new(),
                })
            }
        }
    }

    /// Feeds one message into the user's session. The attempt is always
    /// evaluated against the stored problem, never anything the caller saw.
    pub async fn process_answer(&self, user_id: UserId, raw: &str) -> Result<AnswerOutcome, GameError> {
        let parsed: Option<i64> = raw.trim().parse().ok();

        {
            let Some(mut session) = self.sessions.get_mut(&user_id) else {
                return Ok(AnswerOutcome::NoActiveSession);
            };

            if Utc::now() < session.end_time {
                let Some(answer) = parsed else {
                    return Ok(AnswerOutcome::InvalidInput);
                };

                let correct = answer == session.current_problem.answer;
                let question_text = session.current_problem.text.clone();
                let expected_answer = session.current_problem.answer;
                session.result.attempts.push(Attempt {
                    question_text,
                    expected_answer,
                    user_answer: Some(answer),
                    correct,
                    answered_at: Utc::now(),
                });

                session.total_questions += 1;
                if correct {
                    session.correct_answers += 1;
                    session.score += 1;
                }

                let next_problem = Problem::generate(&mut rand::thread_rng());
                session.current_problem = next_problem.clone();

                return Ok(AnswerOutcome::Accepted { correct, next_problem });
            }
        }

        // Deadline passed: finalize through the same path as the timer. If
        // the timer got there first the session is simply gone by now.
        match self.finalize(user_id, true).await? {
            Some(result) => Ok(AnswerOutcome::Expired(result)),
            None => Ok(AnswerOutcome::NoActiveSession),
        }
    }

    /// Ends a round and persists its result. Returns `None` when the user
    /// has no live session (including a second call for the same round).
    pub async fn end_game(&self, user_id: UserId) -> Result<Option<GameResult>, GameError> {
        self.finalize(user_id, true).await
    }

    /// Ends a round and discards the result; used before starting a
    /// replacement round. No-op without a session.
    pub async fn force_end_game(&self, user_id: UserId) {
        match self.end_game(user_id).await {
            Ok(_) => {}
            Err(e) => error!("failed to force-end game for {}: {}", user_id, e),
        }
    }

    /// Read-only view of the user's live session.
    pub fn get_session(&self, user_id: UserId) -> Option<GameSnapshot> {
        self.sessions.get(&user_id).map(|session| GameSnapshot {
            current_problem: session.current_problem.clone(),
            score: session.score,
            total_questions: session.total_questions,
            correct_answers: session.correct_answers,
            started_at: session.result.started_at,
            end_time: session.end_time,
            attempts: session.result.attempts.clone(),
        })
    }

    /// Timer endpoint: finalize if the session is still there, then tell
    /// the front end. Never aborts its own task.
    async fn expire(&self, user_id: UserId) {
        match self.finalize(user_id, false).await {
            Ok(Some(result)) => {
                info!("game for {} expired with score {}", user_id, result.score);
                if let Some(notifier) = self.notifier.get() {
                    notifier.game_over(user_id, &result).await;
                }
            }
            Ok(None) => {}
            Err(e) => error!("failed to finalize expired game for {}: {}", user_id, e),
        }
    }

    /// The single finalization path. Removing the entry is the atomic
    /// commit: whoever gets the session out of the map freezes and persists
    /// it; everyone else sees `None`.
    async fn finalize(&self, user_id: UserId, cancel_timer: bool) -> Result<Option<GameResult>, GameError> {
        let Some((_, mut session)) = self.sessions.remove(&user_id) else {
            return Ok(None);
        };

        info!("finalizing game for {}", session.user_id);

        if cancel_timer {
            if let Some(timer) = session.timer.take() {
                timer.abort();
            }
        }

        let mut result = session.result;
        result.score = session.score;
        result.total_questions = session.total_questions;
        result.correct_answers = session.correct_answers;
        result.finished_at = Some(Utc::now());

        self.storage.save_game_result(&result).await?;

        Ok(Some(result))
    }

    #[cfg(test)]
    fn rewind_deadline(&self, user_id: UserId) {
        if let Some(mut session) = self.sessions.get_mut(&user_id) {
            session.end_time = Utc::now() - chrono::Duration::seconds(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    const USER: UserId = UserId(100);

    fn service() -> GameService {
        GameService::new(StorageManager::memory())
    }

    async fn start(game: &GameService) -> GameSnapshot {
        game.start_game(USER, Some("tester".into()), None, None)
            .await
            .unwrap()
    }

    struct ChannelNotifier {
        tx: mpsc::UnboundedSender<(UserId, u32)>,
    }

    #[async_trait]
    impl GameOverNotifier for ChannelNotifier {
        async fn game_over(&self, user_id: UserId, result: &GameResult) {
            let _ = self.tx.send((user_id, result.score));
        }
    }

    #[tokio::test]
    async fn test_second_start_is_rejected() {
        let game = service();
        start(&game).await;

        let err = game.start_game(USER, None, None, None).await.unwrap_err();
        assert!(matches!(err, GameError::SessionAlreadyActive));

        // the first session is untouched
        let snapshot = game.get_session(USER).unwrap();
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.total_questions, 1);
    }

    #[tokio::test]
    async fn test_correct_answers_accumulate() {
        let game = service();
        start(&game).await;

        for round in 1..=5u32 {
            let answer = game.get_session(USER).unwrap().current_problem.answer;
            let outcome = game.process_answer(USER, &answer.to_string()).await.unwrap();
            assert!(matches!(outcome, AnswerOutcome::Accepted { correct: true, .. }));

            let snapshot = game.get_session(USER).unwrap();
            assert_eq!(snapshot.score, round);
            assert_eq!(snapshot.correct_answers, round);
            assert_eq!(snapshot.total_questions, round + 1);
            assert_eq!(snapshot.attempts.len() as u32, snapshot.total_questions - 1);
        }
    }

    #[tokio::test]
    async fn test_wrong_answer_counts_question_only() {
        let game = service();
        start(&game).await;

        let wrong = game.get_session(USER).unwrap().current_problem.answer + 1;
        let outcome = game.process_answer(USER, &wrong.to_string()).await.unwrap();
        assert!(matches!(outcome, AnswerOutcome::Accepted { correct: false, .. }));

        let snapshot = game.get_session(USER).unwrap();
        assert_eq!(snapshot.score, 0);
        assert_eq!(snapshot.correct_answers, 0);
        assert_eq!(snapshot.total_questions, 2);
        assert_eq!(snapshot.attempts[0].user_answer, Some(wrong));
        assert!(!snapshot.attempts[0].correct);
    }

    #[tokio::test]
    async fn test_answer_parsing_ignores_whitespace() {
        let game = service();
        start(&game).await;

        let answer = game.get_session(USER).unwrap().current_problem.answer;
        let outcome = game
            .process_answer(USER, &format!("  {}  ", answer))
            .await
            .unwrap();
        assert!(matches!(outcome, AnswerOutcome::Accepted { correct: true, .. }));
    }

    #[tokio::test]
    async fn test_invalid_input_leaves_session_untouched() {
        let game = service();
        start(&game).await;
        let before = game.get_session(USER).unwrap();

        for raw in ["abc", "4.5", "", "12x"] {
            let outcome = game.process_answer(USER, raw).await.unwrap();
            assert!(matches!(outcome, AnswerOutcome::InvalidInput), "input {:?}", raw);
        }

        let after = game.get_session(USER).unwrap();
        assert_eq!(after.score, before.score);
        assert_eq!(after.total_questions, before.total_questions);
        assert_eq!(after.attempts.len(), 0);
        assert_eq!(after.current_problem, before.current_problem);
    }

    #[tokio::test]
    async fn test_answer_without_session() {
        let game = service();
        let outcome = game.process_answer(USER, "42").await.unwrap();
        assert!(matches!(outcome, AnswerOutcome::NoActiveSession));
    }

    #[tokio::test]
    async fn test_late_answer_expires_the_session() {
        let game = service();
        start(&game).await;

        let answer = game.get_session(USER).unwrap().current_problem.answer;
        game.process_answer(USER, &answer.to_string()).await.unwrap();

        game.rewind_deadline(USER);
        let outcome = game.process_answer(USER, "1").await.unwrap();
        let AnswerOutcome::Expired(result) = outcome else {
            panic!("expected Expired, got {:?}", outcome);
        };

        assert_eq!(result.score, 1);
        assert_eq!(result.total_questions, 2);
        assert!(result.finished_at.is_some());
        assert!(game.get_session(USER).is_none());
    }

    #[tokio::test]
    async fn test_end_game_persists_and_is_exactly_once() {
        let storage = StorageManager::memory();
        let game = GameService::new(storage.clone());
        start(&game).await;

        let answer = game.get_session(USER).unwrap().current_problem.answer;
        game.process_answer(USER, &answer.to_string()).await.unwrap();

        let result = game.end_game(USER).await.unwrap().unwrap();
        assert_eq!(result.score, 1);
        assert_eq!(result.correct_answers, 1);
        assert_eq!(result.total_questions, 2);
        assert_eq!(result.attempts.len(), 1);
        assert!(result.finished_at.is_some());

        assert!(game.end_game(USER).await.unwrap().is_none());
        assert!(game.get_session(USER).is_none());

        let saved = storage.get_all_game_results().await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].score, 1);
    }

    #[tokio::test]
    async fn test_force_end_allows_restart() {
        let game = service();
        start(&game).await;

        game.force_end_game(USER).await;
        // no-op on the now-empty table
        game.force_end_game(USER).await;

        assert!(game.start_game(USER, None, None, None).await.is_ok());
    }

    #[tokio::test]
    async fn test_timer_finalizes_and_notifies() {
        let game = GameService::with_duration(StorageManager::memory(), Duration::from_millis(50));
        let (tx, mut rx) = mpsc::unbounded_channel();
        game.register_notifier(Arc::new(ChannelNotifier { tx }));

        start(&game).await;

        let (user_id, score) = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timer never fired")
            .expect("notifier channel closed");
        assert_eq!(user_id, USER);
        assert_eq!(score, 0);

        assert!(game.get_session(USER).is_none());
        assert!(game.end_game(USER).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_explicit_end_cancels_the_timer() {
        let game = GameService::with_duration(StorageManager::memory(), Duration::from_millis(100));
        let (tx, mut rx) = mpsc::unbounded_channel();
        game.register_notifier(Arc::new(ChannelNotifier { tx }));

        start(&game).await;
        game.end_game(USER).await.unwrap().unwrap();

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(rx.try_recv().is_err(), "cancelled timer still notified");
    }
}
