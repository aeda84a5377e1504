//! Durable player statistics, the leaderboard, and snapshot persistence.
//!
//! Everything durable lives in one [`PlayerStats`] snapshot written as a
//! single JSON blob under a fixed key. Corrupt or missing snapshots are
//! treated as a fresh player, never as a fatal error.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::StatsStorage;
use crate::badges::{Badge, BadgeStats, BADGES, NewBadges, evaluate_badges};
use crate::config::{DifficultyId, ModeId};
use crate::constants::{HIGH_SCORE_CAP, STATS_STORAGE_KEY};

/// One leaderboard row. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub player_name: String,
    pub avatar: String,
    pub score: u32,
    pub difficulty: DifficultyId,
    pub mode: ModeId,
    /// Host-supplied display date; the engine has no clock.
    pub date: String,
}

/// Cumulative player statistics persisted across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    #[serde(default)]
    pub games_played: u64,
    #[serde(default)]
    pub total_questions: u64,
    #[serde(default)]
    pub correct_answers: u64,
    #[serde(default)]
    pub total_score: u64,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub fast_answers: u64,
    #[serde(default)]
    pub hints_used_correct: u64,
    #[serde(default)]
    pub time_spent_minutes: u64,
    #[serde(default)]
    pub unlocked_badge_ids: HashSet<String>,
    /// Descending by score, capped at [`HIGH_SCORE_CAP`].
    #[serde(default)]
    pub high_scores: Vec<ScoreEntry>,
}

impl PlayerStats {
    /// Overall accuracy in percent, 0 when no questions answered.
    #[must_use]
    pub fn accuracy_pct(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.correct_answers as f64 / self.total_questions as f64 * 100.0
    }

    /// Derived view badge predicates evaluate against.
    #[must_use]
    pub fn badge_stats(&self) -> BadgeStats {
        BadgeStats {
            games_played: self.games_played,
            fast_answers: self.fast_answers,
            longest_streak: self.longest_streak,
            total_score: self.total_score,
            hints_used_correct: self.hints_used_correct,
            total_questions: self.total_questions,
            accuracy_pct: self.accuracy_pct(),
        }
    }

    /// Insert a score, keeping the list sorted descending and capped.
    pub fn insert_score(&mut self, entry: ScoreEntry) {
        self.high_scores.push(entry);
        self.high_scores.sort_by(|a, b| b.score.cmp(&a.score));
        self.high_scores.truncate(HIGH_SCORE_CAP);
    }
}

/// Everything a finished session contributes to the durable stats.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub player_name: String,
    pub avatar: String,
    pub difficulty: DifficultyId,
    pub mode: ModeId,
    pub score: u32,
    pub questions_answered: u32,
    pub correct_count: u32,
    pub best_streak: u32,
    pub fast_answers: u64,
    pub hinted_correct: u64,
    pub elapsed_minutes: u64,
    pub date: String,
}

/// Badge catalog entry annotated with the player's unlock state.
#[derive(Debug, Clone, Copy)]
pub struct BadgeStatus {
    pub badge: &'static Badge,
    pub unlocked: bool,
}

/// Read model for the stats screen.
#[derive(Debug, Clone)]
pub struct StatsOverview {
    pub total_questions: u64,
    pub accuracy_pct: u32,
    pub longest_streak: u32,
    pub time_spent_minutes: u64,
    pub badges: Vec<BadgeStatus>,
}

/// Durable stats handle bound to a host storage backend.
#[derive(Debug)]
pub struct StatsStore<S: StatsStorage> {
    storage: S,
    stats: PlayerStats,
}

impl<S: StatsStorage> StatsStore<S> {
    /// Load the snapshot, treating absent or corrupt data as a fresh player.
    pub fn load(storage: S) -> Self {
        let stats = match storage.read(STATS_STORAGE_KEY) {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(parsed) => parsed,
                Err(err) => {
                    log::warn!("stats snapshot corrupt, starting fresh: {err}");
                    PlayerStats::default()
                }
            },
            Ok(None) => PlayerStats::default(),
            Err(err) => {
                log::warn!("stats snapshot unreadable, starting fresh: {err}");
                PlayerStats::default()
            }
        };
        Self { storage, stats }
    }

    #[must_use]
    pub const fn stats(&self) -> &PlayerStats {
        &self.stats
    }

    /// Write the full snapshot as one blob, superseding any prior write.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the write.
    pub fn save(&self) -> anyhow::Result<()> {
        let blob = serde_json::to_string(&self.stats)?;
        self.storage
            .write(STATS_STORAGE_KEY, &blob)
            .map_err(anyhow::Error::new)
    }

    /// Fold a finished session into the cumulative stats, insert its score
    /// entry, and evaluate badges over the post-session totals.
    pub fn record_session(&mut self, record: &SessionRecord) -> NewBadges {
        let stats = &mut self.stats;
        stats.games_played += 1;
        stats.total_questions += u64::from(record.questions_answered);
        stats.correct_answers += u64::from(record.correct_count);
        stats.total_score += u64::from(record.score);
        stats.time_spent_minutes += record.elapsed_minutes;
        stats.fast_answers += record.fast_answers;
        stats.hints_used_correct += record.hinted_correct;
        stats.longest_streak = stats.longest_streak.max(record.best_streak);

        stats.insert_score(ScoreEntry {
            player_name: record.player_name.clone(),
            avatar: record.avatar.clone(),
            score: record.score,
            difficulty: record.difficulty,
            mode: record.mode,
            date: record.date.clone(),
        });

        let badge_stats = stats.badge_stats();
        evaluate_badges(&badge_stats, &mut stats.unlocked_badge_ids)
    }

    /// Leading slice of the leaderboard.
    #[must_use]
    pub fn top_scores(&self, n: usize) -> &[ScoreEntry] {
        &self.stats.high_scores[..n.min(self.stats.high_scores.len())]
    }

    /// Leaderboard rows for one difficulty, best first.
    #[must_use]
    pub fn scores_for_difficulty(&self, difficulty: DifficultyId) -> Vec<&ScoreEntry> {
        self.stats
            .high_scores
            .iter()
            .filter(|entry| entry.difficulty == difficulty)
            .collect()
    }

    /// Aggregates for the stats screen.
    #[must_use]
    pub fn overview(&self) -> StatsOverview {
        let stats = &self.stats;
        StatsOverview {
            total_questions: stats.total_questions,
            accuracy_pct: stats.accuracy_pct().round() as u32,
            longest_streak: stats.longest_streak,
            time_spent_minutes: stats.time_spent_minutes,
            badges: BADGES
                .iter()
                .map(|badge| BadgeStatus {
                    badge,
                    unlocked: stats.unlocked_badge_ids.contains(badge.id),
                })
                .collect(),
        }
    }
}

/// In-memory storage backend for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStatsStorage {
    blobs: std::rc::Rc<std::cell::RefCell<std::collections::HashMap<String, String>>>,
}

impl MemoryStatsStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed a blob, e.g. a corrupt snapshot for failure-path tests.
    pub fn seed(&self, key: &str, blob: &str) {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), blob.to_string());
    }

    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.blobs.borrow().get(key).cloned()
    }
}

impl StatsStorage for MemoryStatsStorage {
    type Error = std::convert::Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}
