//! Answer grading and point awards.

use crate::constants::{
    FAST_ANSWER_MS, POINTS_CORRECT, POINTS_NO_HINT_BONUS, POINTS_SPEED_BONUS, POINTS_STREAK_BONUS,
};
use crate::problem::Problem;

/// Point components awarded for a correct answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeBreakdown {
    pub base: u32,
    pub streak_bonus: u32,
    pub speed_bonus: u32,
    pub no_hint_bonus: u32,
    /// Whether the answer beat the fast threshold.
    pub fast: bool,
}

impl GradeBreakdown {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.base + self.streak_bonus + self.speed_bonus + self.no_hint_bonus
    }
}

/// Outcome of grading one submitted answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    /// Input did not parse as an integer. No scoring effects.
    Invalid,
    Correct(GradeBreakdown),
    Incorrect {
        /// Expected answer, for feedback display. `None` for a degraded
        /// word problem whose answer line never parsed.
        correct_answer: Option<i64>,
    },
}

/// Parse raw player input as an exact integer answer.
#[must_use]
pub fn parse_answer(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

/// Grade a submitted answer against the current problem.
///
/// `streak_before` is the streak entering this question; the streak bonus
/// applies when the answer extends a streak already underway.
#[must_use]
pub fn grade(
    raw_input: &str,
    problem: &Problem,
    streak_before: u32,
    hint_used: bool,
    elapsed_ms: u64,
) -> Grade {
    let Some(user_answer) = parse_answer(raw_input) else {
        return Grade::Invalid;
    };

    // Exact integer equality; an absent answer matches nothing.
    if problem.answer != Some(user_answer) {
        return Grade::Incorrect {
            correct_answer: problem.answer,
        };
    }

    let fast = elapsed_ms < FAST_ANSWER_MS;
    Grade::Correct(GradeBreakdown {
        base: POINTS_CORRECT,
        streak_bonus: if streak_before + 1 > 1 {
            POINTS_STREAK_BONUS
        } else {
            0
        },
        speed_bonus: if fast { POINTS_SPEED_BONUS } else { 0 },
        no_hint_bonus: if hint_used { 0 } else { POINTS_NO_HINT_BONUS },
        fast,
    })
}
