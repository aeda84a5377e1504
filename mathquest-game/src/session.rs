//! Session orchestration: the game's phase machine.
//!
//! Phases run `Idle → Configuring → InProgress → Grading → (InProgress |
//! Ended)`. All methods are synchronous and run to completion; the two
//! asynchronous inputs (countdown ticks and provider resolutions) re-enter
//! through guarded methods that no-op once the session has moved on, so a
//! late tick or a stale provider response can never touch a torn-down or
//! advanced session.

use thiserror::Error;

use crate::StatsStorage;
use crate::config::{DifficultyId, ModeId};
use crate::constants::TIMER_WARNING_SECS;
use crate::problem::{Problem, ProblemGenerator, WordProblemRequest};
use crate::provider;
use crate::result::{SessionSummary, accuracy_pct};
use crate::scoring::{self, Grade};
use crate::stats::{SessionRecord, StatsStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerProfile {
    pub name: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    Idle,
    Configuring,
    InProgress,
    Grading,
    Ended,
}

/// Mutable state for one active game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub difficulty: DifficultyId,
    pub mode: ModeId,
    pub score: u32,
    /// Consecutive correct answers since the last wrong one.
    pub streak: u32,
    /// Session high-water mark of `streak`.
    pub best_streak: u32,
    /// `None` = unbounded lives.
    pub lives_remaining: Option<u32>,
    pub questions_answered: u32,
    pub correct_count: u32,
    /// Countdown seconds for timed modes.
    pub time_remaining: Option<u32>,
    /// `None` = unbounded hints.
    pub hints_remaining: Option<u32>,
    pub hint_used_this_question: bool,
    /// Session tallies folded into the durable stats only at the end, so an
    /// abandoned session leaves no trace.
    pub fast_answers: u64,
    pub hinted_correct: u64,
    pub session_started_ms: u64,
    pub question_started_ms: u64,
}

impl SessionState {
    fn new(difficulty: DifficultyId, mode: ModeId, now_ms: u64) -> Self {
        let cfg = mode.config();
        Self {
            difficulty,
            mode,
            score: 0,
            streak: 0,
            best_streak: 0,
            lives_remaining: cfg.lives,
            questions_answered: 0,
            correct_count: 0,
            time_remaining: cfg.timer_seconds,
            hints_remaining: cfg.hints_allowed,
            hint_used_this_question: false,
            fast_answers: 0,
            hinted_correct: 0,
            session_started_ms: now_ms,
            question_started_ms: now_ms,
        }
    }
}

/// An outstanding request for provider-generated hint text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintRequest {
    pub serial: u64,
    pub prompt: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    Correct,
    Wrong,
}

/// Feedback surfaced after a submission, cleared on advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub message: String,
    pub kind: FeedbackKind,
}

/// How the next question begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionStart {
    /// A numeric problem is installed and visible.
    Ready,
    /// The host must resolve this request through the text provider, then
    /// call [`SessionController::resolve_word_problem`].
    AwaitingProvider(WordProblemRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Unparseable input; no penalty, question still open.
    InvalidInput,
    Graded {
        correct: bool,
        points: u32,
        correct_answer: Option<i64>,
        fast: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    NextQuestion(QuestionStart),
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No timed session is running; late ticks land here.
    Ignored,
    Running {
        remaining: u32,
        low_time: bool,
    },
    /// Countdown hit zero; the session is now `Ended`.
    Expired,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("player name must not be empty")]
    EmptyName,
    #[error("an avatar must be selected")]
    MissingAvatar,
    #[error("cannot change player during an active session")]
    SessionActive,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("operation not valid in phase {phase:?}")]
    WrongPhase { phase: GamePhase },
    #[error("no player registered")]
    NoPlayer,
    #[error("no active problem")]
    NoProblem,
    #[error("session already finalized")]
    AlreadyFinalized,
}

/// Renderable snapshot for the host UI.
#[derive(Debug, Clone)]
pub struct GameView {
    pub phase: GamePhase,
    pub player: Option<PlayerProfile>,
    pub problem_text: Option<String>,
    pub narrative_text: Option<String>,
    /// True while a word-problem request is outstanding.
    pub awaiting_problem: bool,
    pub score: u32,
    pub streak: u32,
    pub lives_remaining: Option<u32>,
    pub time_remaining: Option<u32>,
    pub low_time: bool,
    pub questions_answered: u32,
    pub question_count: Option<u32>,
    /// Progress through a bounded question count, in percent.
    pub progress_pct: Option<u8>,
    pub hints_remaining: Option<u32>,
    pub hint_text: Option<String>,
    pub feedback: Option<Feedback>,
}

/// Orchestrates one game session end to end.
#[derive(Debug)]
pub struct SessionController {
    phase: GamePhase,
    player: Option<PlayerProfile>,
    generator: ProblemGenerator,
    session: Option<SessionState>,
    current_problem: Option<Problem>,
    pending_word: Option<u64>,
    pending_hint: Option<u64>,
    hint_text: Option<String>,
    feedback: Option<Feedback>,
}

impl SessionController {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_generator(ProblemGenerator::new(seed))
    }

    #[must_use]
    pub fn with_generator(generator: ProblemGenerator) -> Self {
        Self {
            phase: GamePhase::Idle,
            player: None,
            generator,
            session: None,
            current_problem: None,
            pending_word: None,
            pending_hint: None,
            hint_text: None,
            feedback: None,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn session(&self) -> Option<&SessionState> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn current_problem(&self) -> Option<&Problem> {
        self.current_problem.as_ref()
    }

    #[must_use]
    pub fn hint_text(&self) -> Option<&str> {
        self.hint_text.as_deref()
    }

    /// Register the player profile. Name must be non-empty after trimming
    /// and an avatar must be selected; success moves `Idle` to
    /// `Configuring`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when validation fails or a session is
    /// running; the phase is unchanged in both cases.
    pub fn register_player(&mut self, name: &str, avatar: &str) -> Result<(), ConfigError> {
        if matches!(self.phase, GamePhase::InProgress | GamePhase::Grading) {
            return Err(ConfigError::SessionActive);
        }
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if avatar.trim().is_empty() {
            return Err(ConfigError::MissingAvatar);
        }
        self.player = Some(PlayerProfile {
            name: trimmed.to_string(),
            avatar: avatar.to_string(),
        });
        self.phase = GamePhase::Configuring;
        Ok(())
    }

    /// Start a session for the chosen difficulty and mode, resetting all
    /// per-session state and requesting the first problem.
    ///
    /// # Errors
    ///
    /// Fails when no player is registered or a session is already running.
    pub fn start(
        &mut self,
        difficulty: DifficultyId,
        mode: ModeId,
        now_ms: u64,
    ) -> Result<QuestionStart, SessionError> {
        if !matches!(self.phase, GamePhase::Configuring | GamePhase::Ended) {
            return Err(SessionError::WrongPhase { phase: self.phase });
        }
        if self.player.is_none() {
            return Err(SessionError::NoPlayer);
        }
        log::debug!("starting session: difficulty={difficulty} mode={mode}");
        self.session = Some(SessionState::new(difficulty, mode, now_ms));
        self.current_problem = None;
        self.pending_word = None;
        self.feedback = None;
        self.phase = GamePhase::InProgress;
        Ok(self.begin_question(now_ms))
    }

    /// Grade a submitted answer. Invalid input leaves the question open;
    /// a graded answer moves to `Grading` until [`advance`](Self::advance).
    ///
    /// # Errors
    ///
    /// Fails outside `InProgress` or while the problem is still pending at
    /// the provider.
    pub fn submit_answer(
        &mut self,
        raw_input: &str,
        now_ms: u64,
    ) -> Result<AnswerOutcome, SessionError> {
        if self.phase != GamePhase::InProgress {
            return Err(SessionError::WrongPhase { phase: self.phase });
        }
        let problem = self.current_problem.as_ref().ok_or(SessionError::NoProblem)?;
        let session = self.session.as_mut().expect("session active in InProgress");
        let elapsed_ms = now_ms.saturating_sub(session.question_started_ms);

        match scoring::grade(
            raw_input,
            problem,
            session.streak,
            session.hint_used_this_question,
            elapsed_ms,
        ) {
            Grade::Invalid => {
                self.feedback = Some(Feedback {
                    message: "Please enter a number!".to_string(),
                    kind: FeedbackKind::Wrong,
                });
                Ok(AnswerOutcome::InvalidInput)
            }
            Grade::Correct(breakdown) => {
                session.correct_count += 1;
                session.streak += 1;
                session.best_streak = session.best_streak.max(session.streak);
                session.score += breakdown.total();
                if breakdown.fast {
                    session.fast_answers += 1;
                }
                if session.hint_used_this_question {
                    session.hinted_correct += 1;
                }
                session.questions_answered += 1;
                self.feedback = Some(Feedback {
                    message: "✓ Correct!".to_string(),
                    kind: FeedbackKind::Correct,
                });
                self.phase = GamePhase::Grading;
                Ok(AnswerOutcome::Graded {
                    correct: true,
                    points: breakdown.total(),
                    correct_answer: problem.answer,
                    fast: breakdown.fast,
                })
            }
            Grade::Incorrect { correct_answer } => {
                session.streak = 0;
                if let Some(lives) = session.lives_remaining.as_mut() {
                    *lives = lives.saturating_sub(1);
                }
                session.questions_answered += 1;
                let message = match correct_answer {
                    Some(answer) => format!("✗ Wrong! Answer: {answer}"),
                    None => "✗ Wrong!".to_string(),
                };
                self.feedback = Some(Feedback {
                    message,
                    kind: FeedbackKind::Wrong,
                });
                self.phase = GamePhase::Grading;
                Ok(AnswerOutcome::Graded {
                    correct: false,
                    points: 0,
                    correct_answer,
                    fast: false,
                })
            }
        }
    }

    /// Re-evaluate termination after the settle delay: either the session
    /// ends or the next question begins.
    ///
    /// # Errors
    ///
    /// Fails outside `Grading`.
    pub fn advance(&mut self, now_ms: u64) -> Result<Advance, SessionError> {
        if self.phase != GamePhase::Grading {
            return Err(SessionError::WrongPhase { phase: self.phase });
        }
        self.feedback = None;
        let session = self.session.as_ref().expect("session active in Grading");
        let lives_out = session.lives_remaining == Some(0);
        let questions_done = session
            .mode
            .config()
            .question_count
            .is_some_and(|count| session.questions_answered >= count);
        if lives_out || questions_done {
            self.end_session();
            Ok(Advance::Ended)
        } else {
            self.phase = GamePhase::InProgress;
            Ok(Advance::NextQuestion(self.begin_question(now_ms)))
        }
    }

    /// Advance the countdown by one second. Honored only while a timed
    /// session is `InProgress`/`Grading`; expiry ends the session on the
    /// spot, bypassing the settle delay.
    pub fn tick_second(&mut self) -> TickOutcome {
        if !matches!(self.phase, GamePhase::InProgress | GamePhase::Grading) {
            return TickOutcome::Ignored;
        }
        let remaining = {
            let Some(session) = self.session.as_mut() else {
                return TickOutcome::Ignored;
            };
            let Some(remaining) = session.time_remaining.as_mut() else {
                return TickOutcome::Ignored;
            };
            *remaining = remaining.saturating_sub(1);
            *remaining
        };
        if remaining == 0 {
            log::debug!("countdown expired, ending session");
            self.end_session();
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining,
                low_time: remaining <= TIMER_WARNING_SECS,
            }
        }
    }

    /// Install the provider's word-problem text (or its failure) for an
    /// outstanding request. Returns false when the resolution is stale —
    /// the session ended, was quit, or has moved past the request.
    pub fn resolve_word_problem(&mut self, serial: u64, response: Option<&str>) -> bool {
        if self.phase != GamePhase::InProgress || self.pending_word != Some(serial) {
            log::debug!("discarding stale word problem resolution (serial {serial})");
            return false;
        }
        let difficulty = self
            .session
            .as_ref()
            .expect("session active in InProgress")
            .difficulty;
        self.current_problem =
            Some(
                self.generator
                    .resolve_word(serial, response, difficulty.config()),
            );
        self.pending_word = None;
        true
    }

    /// Ask for a hint on the current question. Consumes one hint from the
    /// mode budget and marks the question hinted immediately; returns
    /// `None` when no hint is available (wrong phase, pending problem,
    /// already hinted, budget exhausted).
    pub fn request_hint(&mut self) -> Option<HintRequest> {
        if self.phase != GamePhase::InProgress {
            return None;
        }
        let problem = self.current_problem.as_ref()?;
        let session = self.session.as_mut()?;
        if session.hint_used_this_question || session.hints_remaining == Some(0) {
            return None;
        }
        if let Some(hints) = session.hints_remaining.as_mut() {
            *hints -= 1;
        }
        session.hint_used_this_question = true;
        self.pending_hint = Some(problem.serial);
        Some(HintRequest {
            serial: problem.serial,
            prompt: provider::hint_prompt(problem),
        })
    }

    /// Apply hint text for an outstanding request. Returns false for stale
    /// resolutions (the question already changed or the session ended).
    /// A hint landing while the same question grades is still shown.
    pub fn resolve_hint(&mut self, serial: u64, text: String) -> bool {
        if !matches!(self.phase, GamePhase::InProgress | GamePhase::Grading)
            || self.pending_hint != Some(serial)
        {
            log::debug!("discarding stale hint resolution (serial {serial})");
            return false;
        }
        self.pending_hint = None;
        self.hint_text = Some(text);
        true
    }

    /// Abandon the running session without persisting anything. The
    /// countdown is disarmed; any in-flight provider result becomes stale.
    pub fn quit(&mut self) {
        if !matches!(self.phase, GamePhase::InProgress | GamePhase::Grading) {
            return;
        }
        log::debug!("session abandoned");
        self.session = None;
        self.current_problem = None;
        self.pending_word = None;
        self.pending_hint = None;
        self.hint_text = None;
        self.feedback = None;
        self.phase = GamePhase::Idle;
    }

    /// Fold the ended session into the durable stats, evaluate badges,
    /// insert the leaderboard entry, persist the snapshot, and hand back
    /// the results summary. `date` is the host's display date for the
    /// score entry.
    ///
    /// # Errors
    ///
    /// Fails outside `Ended` or when called a second time.
    pub fn finalize<S: StatsStorage>(
        &mut self,
        store: &mut StatsStore<S>,
        now_ms: u64,
        date: &str,
    ) -> Result<SessionSummary, SessionError> {
        if self.phase != GamePhase::Ended {
            return Err(SessionError::WrongPhase { phase: self.phase });
        }
        let player = self.player.as_ref().ok_or(SessionError::NoPlayer)?;
        let session = self.session.take().ok_or(SessionError::AlreadyFinalized)?;

        let elapsed_minutes = now_ms.saturating_sub(session.session_started_ms) / 60_000;
        let new_badges = store.record_session(&SessionRecord {
            player_name: player.name.clone(),
            avatar: player.avatar.clone(),
            difficulty: session.difficulty,
            mode: session.mode,
            score: session.score,
            questions_answered: session.questions_answered,
            correct_count: session.correct_count,
            best_streak: session.best_streak,
            fast_answers: session.fast_answers,
            hinted_correct: session.hinted_correct,
            elapsed_minutes,
            date: date.to_string(),
        });
        if let Err(err) = store.save() {
            log::warn!("failed to persist stats snapshot: {err}");
        }

        Ok(SessionSummary {
            final_score: session.score,
            questions_answered: session.questions_answered,
            correct_count: session.correct_count,
            accuracy_pct: accuracy_pct(session.correct_count, session.questions_answered),
            best_streak: session.best_streak,
            new_badges,
        })
    }

    /// Renderable snapshot for the host UI.
    #[must_use]
    pub fn view(&self) -> GameView {
        let session = self.session.as_ref();
        let question_count = session.and_then(|s| s.mode.config().question_count);
        let questions_answered = session.map_or(0, |s| s.questions_answered);
        let time_remaining = session.and_then(|s| s.time_remaining);
        GameView {
            phase: self.phase,
            player: self.player.clone(),
            problem_text: self
                .current_problem
                .as_ref()
                .map(|p| p.display_text.clone()),
            narrative_text: self
                .current_problem
                .as_ref()
                .and_then(|p| p.narrative_text.clone()),
            awaiting_problem: self.pending_word.is_some(),
            score: session.map_or(0, |s| s.score),
            streak: session.map_or(0, |s| s.streak),
            lives_remaining: session.and_then(|s| s.lives_remaining),
            time_remaining,
            low_time: time_remaining.is_some_and(|t| t <= TIMER_WARNING_SECS),
            questions_answered,
            question_count,
            progress_pct: question_count.map(|count| {
                ((u64::from(questions_answered) * 100) / u64::from(count.max(1))).min(100) as u8
            }),
            hints_remaining: session.and_then(|s| s.hints_remaining),
            hint_text: self.hint_text.clone(),
            feedback: self.feedback.clone(),
        }
    }

    fn begin_question(&mut self, now_ms: u64) -> QuestionStart {
        {
            let session = self.session.as_mut().expect("session active");
            session.hint_used_this_question = false;
            session.question_started_ms = now_ms;
        }
        self.hint_text = None;
        self.pending_hint = None;

        let session = self.session.as_ref().expect("session active");
        let difficulty_cfg = session.difficulty.config();
        let mode_cfg = session.mode.config();
        if self.generator.wants_word_problem(difficulty_cfg, mode_cfg) {
            let request = self.generator.begin_word(difficulty_cfg);
            self.current_problem = None;
            self.pending_word = Some(request.serial);
            QuestionStart::AwaitingProvider(request)
        } else {
            self.pending_word = None;
            self.current_problem = Some(self.generator.generate(difficulty_cfg));
            QuestionStart::Ready
        }
    }

    fn end_session(&mut self) {
        self.phase = GamePhase::Ended;
        self.current_problem = None;
        self.pending_word = None;
        self.pending_hint = None;
        self.hint_text = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::MemoryStatsStorage;

    const T0: u64 = 1_000_000;

    fn ready_controller(difficulty: DifficultyId, mode: ModeId) -> SessionController {
        let mut controller = SessionController::new(0xC0FFEE);
        controller.register_player("Ada", "🦊").unwrap();
        let start = controller.start(difficulty, mode, T0).unwrap();
        assert_eq!(start, QuestionStart::Ready, "numeric difficulties start ready");
        controller
    }

    fn correct_answer(controller: &SessionController) -> String {
        controller
            .current_problem()
            .unwrap()
            .answer
            .unwrap()
            .to_string()
    }

    fn answer_correctly(controller: &mut SessionController, now_ms: u64) -> AnswerOutcome {
        let answer = correct_answer(controller);
        controller.submit_answer(&answer, now_ms).unwrap()
    }

    fn answer_wrong(controller: &mut SessionController, now_ms: u64) -> AnswerOutcome {
        let wrong = (controller.current_problem().unwrap().answer.unwrap() + 1).to_string();
        controller.submit_answer(&wrong, now_ms).unwrap()
    }

    #[test]
    fn registration_validates_name_and_avatar() {
        let mut controller = SessionController::new(1);
        assert_eq!(
            controller.register_player("   ", "🦊"),
            Err(ConfigError::EmptyName)
        );
        assert_eq!(
            controller.register_player("Ada", ""),
            Err(ConfigError::MissingAvatar)
        );
        assert_eq!(controller.phase(), GamePhase::Idle);

        controller.register_player(" Ada ", "🦊").unwrap();
        assert_eq!(controller.phase(), GamePhase::Configuring);
        assert_eq!(controller.view().player.unwrap().name, "Ada");
    }

    #[test]
    fn start_requires_configuration() {
        let mut controller = SessionController::new(1);
        assert!(matches!(
            controller.start(DifficultyId::Easy, ModeId::Practice, T0),
            Err(SessionError::WrongPhase { .. })
        ));
    }

    #[test]
    fn invalid_input_costs_nothing() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Challenge);
        let outcome = controller.submit_answer("banana", T0 + 100).unwrap();
        assert_eq!(outcome, AnswerOutcome::InvalidInput);

        let session = controller.session().unwrap();
        assert_eq!(session.questions_answered, 0);
        assert_eq!(session.streak, 0);
        assert_eq!(session.lives_remaining, Some(3));
        // Question stays open for a retry.
        assert_eq!(controller.phase(), GamePhase::InProgress);
        assert_eq!(controller.view().feedback.unwrap().kind, FeedbackKind::Wrong);
    }

    #[test]
    fn streak_grows_and_resets() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Practice);
        for expected in 1..=3 {
            answer_correctly(&mut controller, T0 + 100);
            assert_eq!(controller.session().unwrap().streak, expected);
            controller.advance(T0 + 200).unwrap();
        }
        answer_wrong(&mut controller, T0 + 300);
        let session = controller.session().unwrap();
        assert_eq!(session.streak, 0);
        assert_eq!(session.best_streak, 3);
    }

    #[test]
    fn three_wrong_answers_exhaust_three_lives_and_end() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Challenge);
        for remaining in [2u32, 1, 0] {
            answer_wrong(&mut controller, T0 + 100);
            assert_eq!(
                controller.session().unwrap().lives_remaining,
                Some(remaining)
            );
            let advance = controller.advance(T0 + 200).unwrap();
            if remaining == 0 {
                assert_eq!(advance, Advance::Ended);
            } else {
                assert!(matches!(advance, Advance::NextQuestion(_)));
            }
        }
        assert_eq!(controller.phase(), GamePhase::Ended);

        // Lives never go negative even if graded again somehow.
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Challenge);
        answer_wrong(&mut controller, T0);
        controller.advance(T0).unwrap();
        answer_wrong(&mut controller, T0);
        controller.advance(T0).unwrap();
        answer_wrong(&mut controller, T0);
        assert_eq!(controller.session().unwrap().lives_remaining, Some(0));
    }

    #[test]
    fn practice_mode_never_ends_on_its_own() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Practice);
        for _ in 0..30 {
            answer_wrong(&mut controller, T0);
            assert!(matches!(
                controller.advance(T0).unwrap(),
                Advance::NextQuestion(_)
            ));
        }
        assert!(controller.session().unwrap().lives_remaining.is_none());
    }

    #[test]
    fn timer_expiry_forces_immediate_end() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::TimeAttack);
        for _ in 0..59 {
            assert!(matches!(
                controller.tick_second(),
                TickOutcome::Running { .. }
            ));
        }
        match controller.tick_second() {
            TickOutcome::Expired => {}
            other => panic!("expected expiry, got {other:?}"),
        }
        assert_eq!(controller.phase(), GamePhase::Ended);

        // Ticks after the end are no-ops.
        assert_eq!(controller.tick_second(), TickOutcome::Ignored);
    }

    #[test]
    fn low_time_flag_trips_at_warning_threshold() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::TimeAttack);
        let mut low_seen_at = None;
        for _ in 0..59 {
            if let TickOutcome::Running { remaining, low_time } = controller.tick_second()
                && low_time
            {
                low_seen_at = Some(remaining);
                break;
            }
        }
        assert_eq!(low_seen_at, Some(TIMER_WARNING_SECS));
    }

    #[test]
    fn untimed_modes_ignore_ticks() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Challenge);
        assert_eq!(controller.tick_second(), TickOutcome::Ignored);
    }

    #[test]
    fn quit_discards_session_and_disarms_timer() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::TimeAttack);
        controller.tick_second();
        controller.quit();
        assert_eq!(controller.phase(), GamePhase::Idle);
        assert!(controller.session().is_none());
        // A straggler tick from the host's interval is harmless.
        assert_eq!(controller.tick_second(), TickOutcome::Ignored);
    }

    /// Resolve a possibly-pending word problem so a question is current.
    /// Resolving with `None` exercises the numeric fallback path.
    fn ensure_problem(controller: &mut SessionController, start: QuestionStart) {
        if let QuestionStart::AwaitingProvider(request) = start {
            assert!(controller.resolve_word_problem(request.serial, None));
        }
        assert!(controller.current_problem().is_some());
    }

    fn next_question(controller: &mut SessionController) {
        match controller.advance(T0).unwrap() {
            Advance::NextQuestion(start) => ensure_problem(controller, start),
            Advance::Ended => panic!("session ended unexpectedly"),
        }
    }

    #[test]
    fn hint_budget_is_enforced_per_session_and_question() {
        // Daily mode: word problems on, two hints total.
        let mut controller = SessionController::new(0xC0FFEE);
        controller.register_player("Ada", "🦊").unwrap();
        let start = controller
            .start(DifficultyId::Easy, ModeId::Daily, T0)
            .unwrap();
        ensure_problem(&mut controller, start);

        let first = controller.request_hint().expect("first hint");
        assert_eq!(controller.session().unwrap().hints_remaining, Some(1));
        // Second hint on the same question is refused.
        assert!(controller.request_hint().is_none());
        assert!(controller.resolve_hint(first.serial, "try counting".into()));
        assert_eq!(controller.hint_text(), Some("try counting"));

        // Burn the rest of the budget across questions.
        answer_correctly(&mut controller, T0);
        next_question(&mut controller);
        assert!(controller.request_hint().is_some());
        assert_eq!(controller.session().unwrap().hints_remaining, Some(0));

        answer_correctly(&mut controller, T0);
        next_question(&mut controller);
        assert!(controller.request_hint().is_none(), "budget exhausted");
    }

    #[test]
    fn stale_hint_resolution_is_discarded() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Challenge);
        let request = controller.request_hint().unwrap();
        answer_correctly(&mut controller, T0);
        controller.advance(T0).unwrap();
        // The next question is up; the old hint must not attach to it.
        assert!(!controller.resolve_hint(request.serial, "stale".into()));
        assert!(controller.hint_text().is_none());
    }

    #[test]
    fn finalize_persists_once_and_summarizes() {
        let storage = MemoryStatsStorage::new();
        let mut store = StatsStore::load(storage.clone());
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Challenge);

        // Three wrongs spread out so lives (3) only hit zero on the last
        // question, letting the bounded question count drive the end.
        for question in 0..10 {
            if [2, 5, 9].contains(&question) {
                answer_wrong(&mut controller, T0 + 100);
            } else {
                answer_correctly(&mut controller, T0 + 100);
            }
            let advance = controller.advance(T0 + 200).unwrap();
            if question == 9 {
                assert_eq!(advance, Advance::Ended);
            } else {
                assert!(matches!(advance, Advance::NextQuestion(_)));
            }
        }

        let summary = controller
            .finalize(&mut store, T0 + 240_000, "2025-06-01")
            .unwrap();
        assert_eq!(summary.questions_answered, 10);
        assert_eq!(summary.correct_count, 7);
        assert_eq!(summary.accuracy_pct, 70);
        assert!(summary.new_badges.iter().any(|b| b.id == "first_steps"));
        assert_eq!(store.stats().games_played, 1);
        assert_eq!(store.stats().time_spent_minutes, 4);
        assert!(storage.raw(crate::constants::STATS_STORAGE_KEY).is_some());

        assert!(matches!(
            controller.finalize(&mut store, T0, "2025-06-01"),
            Err(SessionError::AlreadyFinalized)
        ));
    }

    #[test]
    fn view_tracks_progress_and_problem() {
        let mut controller = ready_controller(DifficultyId::Easy, ModeId::Challenge);
        let view = controller.view();
        assert_eq!(view.phase, GamePhase::InProgress);
        assert!(view.problem_text.unwrap().ends_with("= ?"));
        assert_eq!(view.question_count, Some(10));
        assert_eq!(view.progress_pct, Some(0));

        answer_correctly(&mut controller, T0);
        controller.advance(T0).unwrap();
        assert_eq!(controller.view().progress_pct, Some(10));
    }
}
