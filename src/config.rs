//! Tunable knobs for quiz pacing. All durations are wall-clock.

use std::time::Duration;

/// How long each question stays open for answers.
pub const QUESTION_TIME_LIMIT: Duration = Duration::from_secs(20);

/// How often the countdown message is re-rendered in place.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(2);

/// Pause between a round's results and the next question.
pub const RESULT_PAUSE: Duration = Duration::from_secs(5);

/// Upper bound on questions per session, regardless of bank size.
pub const MAX_QUESTIONS: usize = 25;

/// Environment variable pointing at the question bank CSV.
pub const QUESTIONS_ENV: &str = "QUIZ_QUESTIONS";

/// Question bank location when `QUIZ_QUESTIONS` is not set.
pub const DEFAULT_QUESTIONS_FILE: &str = "questions.csv";
