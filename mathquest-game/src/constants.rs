//! Centralized balance and tuning constants for the MathQuest engine.
//!
//! These values define the deterministic math for scoring and problem
//! generation. Keeping them together ensures gameplay can only be adjusted
//! via code changes reviewed in version control.

// Scoring ------------------------------------------------------------------
pub const POINTS_CORRECT: u32 = 10;
pub const POINTS_STREAK_BONUS: u32 = 5;
pub const POINTS_SPEED_BONUS: u32 = 5;
pub const POINTS_NO_HINT_BONUS: u32 = 3;

/// Answers submitted under this many milliseconds count as fast.
pub const FAST_ANSWER_MS: u64 = 5_000;

// Problem generation -------------------------------------------------------
pub(crate) const COMPOUND_TERM_PROBABILITY: f64 = 0.30;
pub(crate) const COMPOUND_TERM_MAX: i64 = 20;
pub(crate) const DIVISOR_MIN: i64 = 1;
pub(crate) const DIVISOR_MAX: i64 = 10;
pub(crate) const WORD_PROBLEM_PROBABILITY: f64 = 0.5;

/// Minimum usable lines in a provider word-problem response:
/// narrative, restated equation, numeric answer.
pub(crate) const WORD_PROBLEM_MIN_LINES: usize = 3;

pub(crate) const WORD_THEMES: [&str; 6] =
    ["space", "animals", "sports", "food", "toys", "nature"];

// Session pacing -----------------------------------------------------------
/// Pause between grading feedback and the next question. The host owns the
/// actual delay; the engine only promises not to advance on its own.
pub const SETTLE_DELAY_MS: u64 = 1_500;

/// Remaining seconds at or below which the countdown is flagged as low.
pub const TIMER_WARNING_SECS: u32 = 10;

// Hints --------------------------------------------------------------------
pub(crate) const HINT_FALLBACK: &str =
    "Try breaking the problem into smaller parts! What numbers do you see?";

// Persistence --------------------------------------------------------------
/// Fixed key for the single stats snapshot blob.
pub const STATS_STORAGE_KEY: &str = "mathquest.stats";

/// Leaderboard keeps at most this many entries.
pub const HIGH_SCORE_CAP: usize = 50;
