//! Difficulty and game-mode catalogs.
//!
//! Both catalogs are static: a difficulty or mode is selected by id and the
//! returned config is immutable for the life of the session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Arithmetic operation a difficulty may draw from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    /// Display symbol used in problem text.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "×",
            Self::Div => "÷",
        }
    }
}

/// Ranges and operation set a difficulty generates problems from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DifficultyConfig {
    pub min_value: i64,
    pub max_value: i64,
    pub operations: &'static [Op],
    /// Whether questions may be AI word problems.
    pub allows_word_problems: bool,
    /// Whether a secondary +/- term may be appended.
    pub allows_compound: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyId {
    Easy,
    Medium,
    Hard,
    Wizard,
}

const EASY: DifficultyConfig = DifficultyConfig {
    min_value: 1,
    max_value: 10,
    operations: &[Op::Add, Op::Sub],
    allows_word_problems: false,
    allows_compound: false,
};

const MEDIUM: DifficultyConfig = DifficultyConfig {
    min_value: 1,
    max_value: 50,
    operations: &[Op::Add, Op::Sub, Op::Mul, Op::Div],
    allows_word_problems: false,
    allows_compound: false,
};

const HARD: DifficultyConfig = DifficultyConfig {
    min_value: 1,
    max_value: 100,
    operations: &[Op::Add, Op::Sub, Op::Mul, Op::Div],
    allows_word_problems: false,
    allows_compound: true,
};

const WIZARD: DifficultyConfig = DifficultyConfig {
    min_value: 1,
    max_value: 50,
    operations: &[Op::Add, Op::Sub, Op::Mul, Op::Div],
    allows_word_problems: true,
    allows_compound: false,
};

impl DifficultyId {
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::Wizard];

    #[must_use]
    pub const fn config(self) -> &'static DifficultyConfig {
        match self {
            Self::Easy => &EASY,
            Self::Medium => &MEDIUM,
            Self::Hard => &HARD,
            Self::Wizard => &WIZARD,
        }
    }

    /// Stable key used in score entries and leaderboard filters.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
            Self::Wizard => "wizard",
        }
    }
}

impl fmt::Display for DifficultyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for DifficultyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "wizard" => Ok(Self::Wizard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Bounds a game mode places on a session. `None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeConfig {
    pub timer_seconds: Option<u32>,
    pub lives: Option<u32>,
    pub question_count: Option<u32>,
    pub hints_allowed: Option<u32>,
    /// Forces word problems on regardless of difficulty.
    pub uses_word_problems: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeId {
    Practice,
    TimeAttack,
    Challenge,
    Daily,
}

const PRACTICE: ModeConfig = ModeConfig {
    timer_seconds: None,
    lives: None,
    question_count: None,
    hints_allowed: None,
    uses_word_problems: false,
};

const TIME_ATTACK: ModeConfig = ModeConfig {
    timer_seconds: Some(60),
    lives: None,
    question_count: None,
    hints_allowed: Some(3),
    uses_word_problems: false,
};

const CHALLENGE: ModeConfig = ModeConfig {
    timer_seconds: None,
    lives: Some(3),
    question_count: Some(10),
    hints_allowed: Some(3),
    uses_word_problems: false,
};

const DAILY: ModeConfig = ModeConfig {
    timer_seconds: None,
    lives: Some(3),
    question_count: Some(10),
    hints_allowed: Some(2),
    uses_word_problems: true,
};

impl ModeId {
    pub const ALL: [Self; 4] = [Self::Practice, Self::TimeAttack, Self::Challenge, Self::Daily];

    #[must_use]
    pub const fn config(self) -> &'static ModeConfig {
        match self {
            Self::Practice => &PRACTICE,
            Self::TimeAttack => &TIME_ATTACK,
            Self::Challenge => &CHALLENGE,
            Self::Daily => &DAILY,
        }
    }

    /// Stable key used in score entries.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::TimeAttack => "time_attack",
            Self::Challenge => "challenge",
            Self::Daily => "daily",
        }
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ModeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" => Ok(Self::Practice),
            "time_attack" | "timeattack" => Ok(Self::TimeAttack),
            "challenge" => Ok(Self::Challenge),
            "daily" => Ok(Self::Daily),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}
