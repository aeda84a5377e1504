//! Text-generation provider boundary.
//!
//! The engine never talks to an LLM directly. Hosts implement
//! [`TextProvider`]; the fetch helpers here perform the call, catch every
//! failure, and hand back the documented fallback so nothing past this
//! module ever observes a raw provider error.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::DifficultyConfig;
use crate::constants::HINT_FALLBACK;
use crate::problem::{Problem, WordProblemRequest};
use crate::session::HintRequest;

/// Errors a provider implementation may surface. All of them degrade to a
/// fallback at the call site; none propagate into the session.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider credential missing")]
    MissingCredential,
    #[error("provider request failed: {0}")]
    Request(String),
    #[error("provider returned an empty response")]
    EmptyResponse,
}

/// External text generation capability.
/// Platform-specific implementations should provide this.
#[async_trait]
pub trait TextProvider {
    /// Generate free text for a free-text prompt.
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Fetch word-problem text for an open request. Returns `None` on any
/// provider failure; the caller resolves the request with that `None` and
/// the generator falls back to a numeric problem.
pub async fn fetch_word_problem<P>(provider: &P, request: &WordProblemRequest) -> Option<String>
where
    P: TextProvider + ?Sized,
{
    match provider.generate(&request.prompt).await {
        Ok(text) => Some(text),
        Err(err) => {
            log::warn!("word problem generation failed: {err}");
            None
        }
    }
}

/// Fetch hint text for an open request, degrading to the canned hint line.
pub async fn fetch_hint<P>(provider: &P, request: &HintRequest) -> String
where
    P: TextProvider + ?Sized,
{
    match provider.generate(&request.prompt).await {
        Ok(text) => text,
        Err(err) => {
            log::warn!("hint generation failed: {err}");
            HINT_FALLBACK.to_string()
        }
    }
}

pub(crate) fn word_problem_prompt(theme: &str, cfg: &DifficultyConfig) -> String {
    let operations = cfg
        .operations
        .iter()
        .map(|op| op.symbol())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Create a simple, fun math word problem for kids about {theme}. \
         Use numbers between {} and {}. \
         Use only these operations: {operations}. \
         Make it engaging and age-appropriate. \
         Format: first line is the word problem, second line is just the \
         math equation (like \"5 + 3 = ?\"), third line is just the numeric \
         answer. Keep it short and simple!",
        cfg.min_value, cfg.max_value,
    )
}

pub(crate) fn hint_prompt(problem: &Problem) -> String {
    format!(
        "You are a friendly math tutor for kids. Explain how to solve this \
         problem step-by-step in a fun, encouraging way: {}. \
         Use simple language and break it down into easy steps. Don't give \
         the final answer directly, but guide them to find it. Keep it \
         short (2-3 sentences max).",
        problem.hint_source(),
    )
}
