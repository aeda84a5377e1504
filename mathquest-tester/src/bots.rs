//! Scripted answer bots and stub text providers for headless runs.

use async_trait::async_trait;
use clap::ValueEnum;
use mathquest_game::{Problem, ProviderError, TextProvider};
use rand::Rng;
use rand::rngs::SmallRng;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BotKind {
    /// Always correct, always fast.
    Ace,
    /// Mostly correct, human pacing, asks for hints.
    Sloppy,
    /// Wrong answers, garbage input, erratic pacing.
    Chaotic,
}

/// What the bot types for one question.
#[derive(Debug, Clone)]
pub struct BotMove {
    pub input: String,
    pub think_ms: u64,
    pub wants_hint: bool,
}

pub struct Bot {
    kind: BotKind,
    rng: SmallRng,
}

impl Bot {
    pub fn new(kind: BotKind, rng: SmallRng) -> Self {
        Self { kind, rng }
    }

    /// Decide a response for the current problem. The answer may be absent
    /// for degraded word problems; bots then guess.
    pub fn respond(&mut self, problem: &Problem) -> BotMove {
        let answer = problem.answer;
        match self.kind {
            BotKind::Ace => BotMove {
                input: answer.unwrap_or(0).to_string(),
                think_ms: self.rng.gen_range(500..3_000),
                wants_hint: false,
            },
            BotKind::Sloppy => {
                let correct = self.rng.gen_bool(0.8);
                let value = match answer {
                    Some(a) if correct => a,
                    Some(a) => a + self.rng.gen_range(1..10),
                    None => self.rng.gen_range(0..100),
                };
                BotMove {
                    input: value.to_string(),
                    think_ms: self.rng.gen_range(1_000..8_000),
                    wants_hint: self.rng.gen_bool(0.2),
                }
            }
            BotKind::Chaotic => {
                let input = match self.rng.gen_range(0..4u8) {
                    0 => answer.unwrap_or(7).to_string(),
                    1 => self.rng.gen_range(-50..50).to_string(),
                    2 => String::new(),
                    _ => "??".to_string(),
                };
                BotMove {
                    input,
                    think_ms: self.rng.gen_range(200..10_000),
                    wants_hint: self.rng.gen_bool(0.1),
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProviderKind {
    /// Well-formed canned responses.
    Canned,
    /// Every call fails; exercises the fallback paths.
    Offline,
}

/// Stub provider selected on the command line.
pub struct StubProvider {
    kind: ProviderKind,
}

impl StubProvider {
    pub const fn new(kind: ProviderKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl TextProvider for StubProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        match self.kind {
            ProviderKind::Canned => {
                if prompt.contains("word problem") {
                    Ok("A fox gathers 9 berries and eats 4 of them.\n9 - 4 = ?\n5".to_string())
                } else {
                    Ok("Look at the two numbers and take it one step at a time!".to_string())
                }
            }
            ProviderKind::Offline => {
                Err(ProviderError::Request("stub provider is offline".to_string()))
            }
        }
    }
}
