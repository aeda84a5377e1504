//! MathQuest Game Engine
//!
//! Platform-agnostic core logic for the MathQuest arithmetic quiz game.
//! This crate provides problem generation, scoring, session progression,
//! badges, and stats persistence without UI or platform-specific
//! dependencies. Hosts supply timestamps and seeds, implement
//! [`StatsStorage`] for the durable snapshot, and implement
//! [`provider::TextProvider`] when AI word problems and hints are wanted.

pub mod badges;
pub mod config;
pub mod constants;
pub mod problem;
pub mod provider;
pub mod result;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod stats;

// Re-export commonly used types
pub use badges::{BADGES, Badge, BadgeStats, NewBadges, evaluate_badges};
pub use config::{DifficultyConfig, DifficultyId, ModeConfig, ModeId, Op};
pub use problem::{Problem, ProblemGenerator, WordProblemRequest};
pub use provider::{ProviderError, TextProvider, fetch_hint, fetch_word_problem};
pub use result::SessionSummary;
pub use rng::RngStreams;
pub use scoring::{Grade, GradeBreakdown, grade, parse_answer};
pub use session::{
    Advance, AnswerOutcome, ConfigError, Feedback, FeedbackKind, GamePhase, GameView, HintRequest,
    PlayerProfile, QuestionStart, SessionController, SessionError, SessionState, TickOutcome,
};
pub use stats::{
    BadgeStatus, MemoryStatsStorage, PlayerStats, ScoreEntry, SessionRecord, StatsOverview,
    StatsStore,
};

/// Trait for abstracting stats snapshot persistence.
/// Platform-specific implementations should provide this (browser
/// localStorage, a file on disk, plain memory in tests).
pub trait StatsStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the raw snapshot blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. A corrupt blob is
    /// not an error here; the store treats it as absent when parsing.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write the raw snapshot blob under `key`, superseding any prior
    /// write.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error>;
}
