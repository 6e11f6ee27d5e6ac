use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use teloxide::types::UserId;
use tokio::task::AbortHandle;

/// One generated arithmetic question together with its answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub text: String,
    pub answer: i64,
}

/// One answered question. Unparsable input never produces an attempt, so
/// `user_answer` is always present in practice; it stays optional in the
/// stored format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub question_text: String,
    pub expected_answer: i64,
    pub user_answer: Option<i64>,
    pub correct: bool,
    pub answered_at: DateTime<Utc>,
}

/// Finalized record of one round. Produced exactly once per session and
/// never mutated after it has been handed to storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub user_telegram_id: UserId,
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub attempts: Vec<Attempt>,
}

impl GameResult {
    pub fn new(user_telegram_id: UserId, started_at: DateTime<Utc>) -> Self {
        Self {
            user_telegram_id,
            score: 0,
            total_questions: 0,
            correct_answers: 0,
            started_at,
            finished_at: None,
            attempts: Vec::new(),
        }
    }
}

/// Live state of one user's round. Owned exclusively by the session table;
/// `total_questions` counts the currently outstanding problem, so it starts
/// at 1 and `result.attempts.len()` always equals `total_questions - 1`.
#[derive(Debug)]
pub(super) struct GameSession {
    pub user_id: UserId,
    pub current_problem: Problem,
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub end_time: DateTime<Utc>,
    pub result: GameResult,
    pub timer: Option<AbortHandle>,
}

/// Read-only copy of a live session, for rendering.
#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub current_problem: Problem,
    pub score: u32,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub started_at: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attempts: Vec<Attempt>,
}

/// Result of feeding one message into an active (or absent) session.
#[derive(Debug)]
pub enum AnswerOutcome {
    /// No live session for this user.
    NoActiveSession,
    /// The deadline had passed; the session was finalized and removed.
    Expired(GameResult),
    /// The text did not parse as an integer; session state is untouched.
    InvalidInput,
    Accepted { correct: bool, next_problem: Problem },
}
