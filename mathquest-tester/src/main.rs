mod bots;

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use bots::{Bot, BotKind, BotMove, ProviderKind, StubProvider};
use mathquest_game::{
    Advance, AnswerOutcome, DifficultyId, GamePhase, MemoryStatsStorage, ModeId, QuestionStart,
    SessionController, SessionSummary, StatsStore, TickOutcome, constants, fetch_hint,
    fetch_word_problem,
};

#[derive(Debug, Parser)]
#[command(name = "mathquest-tester", version)]
#[command(about = "Headless QA harness for the MathQuest engine")]
struct Args {
    /// Number of sessions to simulate
    #[arg(long, default_value_t = 10)]
    sessions: u64,

    /// Base seed; each session derives its own from this
    #[arg(long, default_value_t = 1337)]
    seed: u64,

    /// Difficulty to play
    #[arg(long, default_value = "medium")]
    difficulty: DifficultyId,

    /// Game mode to play
    #[arg(long, default_value = "challenge")]
    mode: ModeId,

    /// Answer bot driving the sessions
    #[arg(long, value_enum, default_value = "sloppy")]
    bot: BotKind,

    /// Stub text provider behavior
    #[arg(long, value_enum, default_value = "canned")]
    provider: ProviderKind,

    /// Question cap for unbounded modes
    #[arg(long, default_value_t = 25)]
    questions: u32,

    /// Verbose per-session output
    #[arg(short, long)]
    verbose: bool,
}

struct SessionOutcome {
    summary: SessionSummary,
    violations: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    println!(
        "🧪 MathQuest harness: {} sessions, {} {} with {:?} bot",
        args.sessions,
        args.difficulty.to_string().bright_white(),
        args.mode.to_string().bright_white(),
        args.bot,
    );

    let storage = MemoryStatsStorage::new();
    let mut store = StatsStore::load(storage);
    let provider = StubProvider::new(args.provider);

    let mut total_score = 0u64;
    let mut total_accuracy = 0u64;
    let mut all_violations = Vec::new();

    for index in 0..args.sessions {
        let outcome = run_session(&args, index, &provider, &mut store)
            .await
            .with_context(|| format!("session {index} failed"))?;

        total_score += u64::from(outcome.summary.final_score);
        total_accuracy += u64::from(outcome.summary.accuracy_pct);

        if args.verbose {
            let badge_note = if outcome.summary.new_badges.is_empty() {
                String::new()
            } else {
                format!(
                    " 🏅 {}",
                    outcome
                        .summary
                        .new_badges
                        .iter()
                        .map(|b| b.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            };
            println!(
                "  session {:>3}: score {:>4}, {}/{} correct ({}%){badge_note}",
                index + 1,
                outcome.summary.final_score,
                outcome.summary.correct_count,
                outcome.summary.questions_answered,
                outcome.summary.accuracy_pct,
            );
        }
        for violation in &outcome.violations {
            println!("  {} {}", "❌".red(), violation.red());
        }
        all_violations.extend(outcome.violations);
    }

    check_store_invariants(&store, &mut all_violations);

    let sessions = args.sessions.max(1);
    println!();
    println!(
        "📊 avg score {}, avg accuracy {}%, lifetime questions {}, badges {}",
        (total_score / sessions).to_string().bright_white(),
        (total_accuracy / sessions).to_string().bright_white(),
        store.stats().total_questions,
        store.stats().unlocked_badge_ids.len(),
    );
    for entry in store.top_scores(5) {
        println!(
            "   {} {} — {} pts ({} / {})",
            entry.avatar,
            entry.player_name,
            entry.score.to_string().bright_yellow(),
            entry.difficulty,
            entry.mode,
        );
    }

    if all_violations.is_empty() {
        println!("{}", "✅ all engine invariants held".green());
        Ok(())
    } else {
        bail!("{} invariant violation(s)", all_violations.len());
    }
}

async fn run_session(
    args: &Args,
    index: u64,
    provider: &StubProvider,
    store: &mut StatsStore<MemoryStatsStorage>,
) -> Result<SessionOutcome> {
    let session_seed = args.seed.wrapping_add(index.wrapping_mul(0x9E37_79B9));
    let mut controller = SessionController::new(session_seed);
    let mut bot = Bot::new(args.bot, SmallRng::seed_from_u64(session_seed ^ 0xB07));

    controller
        .register_player("Harness", "🤖")
        .context("register player")?;

    let mut now_ms: u64 = 1_700_000_000_000;
    let mut start = controller
        .start(args.difficulty, args.mode, now_ms)
        .context("start session")?;

    let mut violations = Vec::new();
    let mut submissions = 0u32;

    log::debug!("session {index}: seed {session_seed}");

    'session: while controller.phase() != GamePhase::Ended {
        if let QuestionStart::AwaitingProvider(request) =
            std::mem::replace(&mut start, QuestionStart::Ready)
        {
            let text = fetch_word_problem(provider, &request).await;
            if !controller.resolve_word_problem(request.serial, text.as_deref()) {
                violations.push("fresh word problem resolution was discarded".to_string());
            }
        }

        let problem = controller
            .current_problem()
            .context("no problem after question start")?
            .clone();
        let BotMove {
            input,
            think_ms,
            wants_hint,
        } = bot.respond(&problem);

        if wants_hint
            && let Some(request) = controller.request_hint()
        {
            let text = fetch_hint(provider, &request).await;
            controller.resolve_hint(request.serial, text);
        }

        // Walk the countdown through the bot's thinking time.
        for _ in 0..think_ms / 1_000 {
            if controller.tick_second() == TickOutcome::Expired {
                break 'session;
            }
        }
        now_ms += think_ms;

        submissions += 1;
        if submissions > 500 {
            bail!("session did not terminate after 500 submissions");
        }

        match controller.submit_answer(&input, now_ms)? {
            AnswerOutcome::InvalidInput => continue, // question stays open
            AnswerOutcome::Graded { .. } => {}
        }

        now_ms += constants::SETTLE_DELAY_MS;
        match controller.advance(now_ms)? {
            Advance::NextQuestion(next) => {
                start = next;
                let session = controller.session().context("session state missing")?;
                if session.correct_count > session.questions_answered {
                    violations.push("correct_count exceeded questions_answered".to_string());
                }
                // Cap unbounded modes so practice runs terminate.
                if session.mode.config().question_count.is_none()
                    && session.questions_answered >= args.questions
                {
                    break 'session;
                }
            }
            Advance::Ended => break 'session,
        }
    }

    if controller.phase() != GamePhase::Ended {
        // Capped unbounded run: report the in-flight numbers, then quit.
        // Quitting must leave the durable stats untouched.
        let session = controller.session().context("session state missing")?;
        let summary = SessionSummary {
            final_score: session.score,
            questions_answered: session.questions_answered,
            correct_count: session.correct_count,
            accuracy_pct: if session.questions_answered == 0 {
                0
            } else {
                (f64::from(session.correct_count) / f64::from(session.questions_answered) * 100.0)
                    .round() as u32
            },
            best_streak: session.best_streak,
            new_badges: mathquest_game::NewBadges::new(),
        };
        let games_before = store.stats().games_played;
        controller.quit();
        if store.stats().games_played != games_before {
            violations.push("quit mutated the durable stats".to_string());
        }
        return Ok(SessionOutcome {
            summary,
            violations,
        });
    }

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let summary = controller.finalize(store, now_ms, &date)?;

    if summary.correct_count > summary.questions_answered {
        violations.push("summary correct_count exceeded questions_answered".to_string());
    }
    if summary.accuracy_pct > 100 {
        violations.push(format!("accuracy out of range: {}", summary.accuracy_pct));
    }

    Ok(SessionOutcome {
        summary,
        violations,
    })
}

fn check_store_invariants(store: &StatsStore<MemoryStatsStorage>, violations: &mut Vec<String>) {
    let stats = store.stats();
    if stats.correct_answers > stats.total_questions {
        violations.push("lifetime correct_answers exceeded total_questions".to_string());
    }
    if stats.high_scores.len() > constants::HIGH_SCORE_CAP {
        violations.push("leaderboard exceeded its cap".to_string());
    }
    if !stats
        .high_scores
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score)
    {
        violations.push("leaderboard is not sorted descending".to_string());
    }
}
