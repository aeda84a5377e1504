//! Achievement badge catalog and evaluation.
//!
//! The catalog is fixed and finite, so predicates are plain function
//! pointers over a derived stats view. Unlocking is one-way: once an id is
//! in the unlocked set it is never re-evaluated.

use smallvec::SmallVec;
use std::collections::HashSet;

/// Cumulative stats view badge predicates run against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BadgeStats {
    pub games_played: u64,
    pub fast_answers: u64,
    pub longest_streak: u32,
    pub total_score: u64,
    pub hints_used_correct: u64,
    pub total_questions: u64,
    /// Overall accuracy in percent, 0 when no questions answered.
    pub accuracy_pct: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct Badge {
    pub id: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    predicate: fn(&BadgeStats) -> bool,
}

impl Badge {
    /// Whether the cumulative stats satisfy this badge.
    #[must_use]
    pub fn earned_by(&self, stats: &BadgeStats) -> bool {
        (self.predicate)(stats)
    }
}

pub const BADGES: [Badge; 7] = [
    Badge {
        id: "first_steps",
        name: "First Steps",
        icon: "👣",
        predicate: |s| s.games_played >= 1,
    },
    Badge {
        id: "speed_demon",
        name: "Speed Demon",
        icon: "⚡",
        predicate: |s| s.fast_answers >= 5,
    },
    Badge {
        id: "perfect_10",
        name: "Perfect 10",
        icon: "🎯",
        predicate: |s| s.longest_streak >= 10,
    },
    Badge {
        id: "math_wizard",
        name: "Math Wizard",
        icon: "🧙",
        predicate: |s| s.total_score >= 1_000,
    },
    Badge {
        id: "hint_helper",
        name: "Hint Helper",
        icon: "💡",
        predicate: |s| s.hints_used_correct >= 1,
    },
    Badge {
        id: "century_club",
        name: "Century Club",
        icon: "💯",
        predicate: |s| s.total_questions >= 100,
    },
    Badge {
        id: "accuracy_ace",
        name: "Accuracy Ace",
        icon: "🎪",
        predicate: |s| s.accuracy_pct >= 90.0 && s.total_questions >= 20,
    },
];

/// Badges newly unlocked by one session; almost always 0-2 entries.
pub type NewBadges = SmallVec<[&'static Badge; 4]>;

/// Evaluate the catalog against post-session cumulative stats, appending
/// newly earned ids to `unlocked` and returning the new badges in catalog
/// order. Already-unlocked badges are skipped, never duplicated.
pub fn evaluate_badges(stats: &BadgeStats, unlocked: &mut HashSet<String>) -> NewBadges {
    let mut new_badges = NewBadges::new();
    for badge in &BADGES {
        if !unlocked.contains(badge.id) && badge.earned_by(stats) {
            unlocked.insert(badge.id.to_string());
            new_badges.push(badge);
        }
    }
    new_badges
}
