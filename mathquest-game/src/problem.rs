//! Arithmetic problem generation.
//!
//! The numeric path always succeeds and always yields an exact integer
//! answer. The word-problem path goes through the external text provider:
//! the generator emits a [`WordProblemRequest`], the host resolves it, and
//! [`ProblemGenerator::resolve_word`] either parses the response or falls
//! back to a numeric problem. No retries.

use rand::Rng;

use crate::config::{DifficultyConfig, ModeConfig, Op};
use crate::constants::{
    COMPOUND_TERM_MAX, COMPOUND_TERM_PROBABILITY, DIVISOR_MAX, DIVISOR_MIN,
    WORD_PROBLEM_MIN_LINES, WORD_PROBLEM_PROBABILITY, WORD_THEMES,
};
use crate::provider;
use crate::rng::RngStreams;

/// A single question, discarded after grading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    /// Equation text shown to the player, e.g. `7 × 8 = ?`.
    pub display_text: String,
    /// Story text for word problems.
    pub narrative_text: Option<String>,
    /// Exact expected answer. `None` only via the degraded word-problem
    /// path (unparseable answer line); it then matches no user answer.
    pub answer: Option<i64>,
    /// Monotonic per-generator counter; staleness guard for provider calls.
    pub serial: u64,
}

impl Problem {
    /// Text a hint prompt should describe: narrative plus equation for word
    /// problems, the bare equation otherwise.
    #[must_use]
    pub fn hint_source(&self) -> String {
        match &self.narrative_text {
            Some(narrative) => format!("{narrative} {}", self.display_text),
            None => self.display_text.clone(),
        }
    }
}

/// An outstanding request for provider-generated word-problem text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordProblemRequest {
    pub serial: u64,
    pub prompt: String,
}

/// Deterministic problem source for one session.
#[derive(Debug, Clone)]
pub struct ProblemGenerator {
    rng: RngStreams,
    serial: u64,
}

impl ProblemGenerator {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::from_streams(RngStreams::from_user_seed(seed))
    }

    #[must_use]
    pub fn from_streams(rng: RngStreams) -> Self {
        Self { rng, serial: 0 }
    }

    /// Generate the next numeric problem.
    pub fn generate(&mut self, cfg: &DifficultyConfig) -> Problem {
        let serial = self.next_serial();
        self.numeric_with_serial(serial, cfg)
    }

    /// Whether the upcoming question should attempt the word-problem path.
    /// A fair coin flip, gated on the difficulty or the mode enabling it.
    pub fn wants_word_problem(&mut self, cfg: &DifficultyConfig, mode: &ModeConfig) -> bool {
        (cfg.allows_word_problems || mode.uses_word_problems)
            && self.rng.word.gen_bool(WORD_PROBLEM_PROBABILITY)
    }

    /// Open a word-problem request for the next question.
    pub fn begin_word(&mut self, cfg: &DifficultyConfig) -> WordProblemRequest {
        let serial = self.next_serial();
        let theme = WORD_THEMES[self.rng.word.gen_range(0..WORD_THEMES.len())];
        WordProblemRequest {
            serial,
            prompt: provider::word_problem_prompt(theme, cfg),
        }
    }

    /// Resolve a word-problem request. `response` is `None` when the
    /// provider call failed outright. Malformed or short responses fall
    /// back to a numeric problem under the same serial.
    pub fn resolve_word(
        &mut self,
        serial: u64,
        response: Option<&str>,
        cfg: &DifficultyConfig,
    ) -> Problem {
        if let Some(text) = response
            && let Some(problem) = parse_word_problem(serial, text)
        {
            return problem;
        }
        if response.is_some() {
            log::warn!("word problem response unusable, falling back to numeric");
        }
        self.numeric_with_serial(serial, cfg)
    }

    fn next_serial(&mut self) -> u64 {
        self.serial += 1;
        self.serial
    }

    fn numeric_with_serial(&mut self, serial: u64, cfg: &DifficultyConfig) -> Problem {
        let a = self.rng.operands.gen_range(cfg.min_value..=cfg.max_value);
        let b = self.rng.operands.gen_range(cfg.min_value..=cfg.max_value);
        let op = cfg.operations[self.rng.operation.gen_range(0..cfg.operations.len())];

        let (mut display, mut answer) = match op {
            Op::Add => (format!("{a} + {b}"), a + b),
            Op::Sub => {
                // Larger minus smaller so the answer never goes negative.
                let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
                (format!("{hi} - {lo}"), hi - lo)
            }
            Op::Mul => (format!("{a} × {b}"), a * b),
            Op::Div => {
                let divisor = self.rng.operands.gen_range(DIVISOR_MIN..=DIVISOR_MAX);
                // Quotient range can collapse for small max_value; clamp so
                // the draw stays valid and division stays exact.
                let quotient_max = (cfg.max_value / divisor).max(cfg.min_value);
                let quotient = self.rng.operands.gen_range(cfg.min_value..=quotient_max);
                (format!("{} ÷ {divisor}", divisor * quotient), quotient)
            }
        };

        if cfg.allows_compound && self.rng.compound.gen_bool(COMPOUND_TERM_PROBABILITY) {
            let term_max = COMPOUND_TERM_MAX.max(cfg.min_value);
            let c = self.rng.compound.gen_range(cfg.min_value..=term_max);
            if self.rng.compound.gen_bool(0.5) {
                display = format!("{display} + {c}");
                answer += c;
            } else {
                display = format!("{display} - {c}");
                answer -= c;
            }
        }

        Problem {
            display_text: format!("{display} = ?"),
            narrative_text: None,
            answer: Some(answer),
            serial,
        }
    }
}

/// Parse a provider response into a word problem: first non-blank line is
/// the narrative, second the restated equation, third the answer. Returns
/// `None` when fewer than three usable lines are present; an unparseable
/// answer line keeps the problem but with `answer: None`.
fn parse_word_problem(serial: u64, text: &str) -> Option<Problem> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() < WORD_PROBLEM_MIN_LINES {
        return None;
    }
    Some(Problem {
        display_text: lines[1].to_string(),
        narrative_text: Some(lines[0].to_string()),
        answer: parse_answer_line(lines[2]),
        serial,
    })
}

/// Strip everything but digits and minus signs, then parse.
fn parse_answer_line(line: &str) -> Option<i64> {
    let cleaned: String = line
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    cleaned.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DifficultyId, ModeId};

    /// Evaluate a display string like `12 ÷ 4 + 3 = ?` left to right.
    fn eval_display(display: &str) -> i64 {
        let expr = display.strip_suffix(" = ?").expect("display suffix");
        let tokens: Vec<&str> = expr.split_whitespace().collect();
        let mut value: i64 = tokens[0].parse().expect("leading operand");
        let mut i = 1;
        while i < tokens.len() {
            let rhs: i64 = tokens[i + 1].parse().expect("operand");
            value = match tokens[i] {
                "+" => value + rhs,
                "-" => value - rhs,
                "×" => value * rhs,
                "÷" => value / rhs,
                other => panic!("unexpected operator {other}"),
            };
            i += 2;
        }
        value
    }

    #[test]
    fn numeric_answers_match_display_for_all_difficulties() {
        for id in DifficultyId::ALL {
            let cfg = id.config();
            let mut generator = ProblemGenerator::new(0xBEEF);
            for _ in 0..500 {
                let problem = generator.generate(cfg);
                let answer = problem.answer.expect("numeric path always has answer");
                assert_eq!(answer, eval_display(&problem.display_text), "{id}");
            }
        }
    }

    #[test]
    fn subtraction_never_goes_negative() {
        // Easy only has + and -, so subtraction shows up often.
        let cfg = DifficultyId::Easy.config();
        let mut generator = ProblemGenerator::new(99);
        for _ in 0..500 {
            let problem = generator.generate(cfg);
            assert!(problem.answer.unwrap() >= 0, "{}", problem.display_text);
        }
    }

    #[test]
    fn division_is_always_exact() {
        let cfg = DifficultyId::Medium.config();
        let mut generator = ProblemGenerator::new(7);
        let mut divisions = 0;
        for _ in 0..2_000 {
            let problem = generator.generate(cfg);
            let expr = problem.display_text.strip_suffix(" = ?").unwrap();
            if let Some((dividend, divisor)) = expr.split_once(" ÷ ") {
                let dividend: i64 = dividend.parse().unwrap();
                let divisor: i64 = divisor.parse().unwrap();
                assert_eq!(dividend % divisor, 0, "{}", problem.display_text);
                assert_eq!(problem.answer.unwrap(), dividend / divisor);
                divisions += 1;
            }
        }
        assert!(divisions > 0, "division never drew");
    }

    #[test]
    fn compound_terms_only_on_compound_difficulties() {
        let mut generator = ProblemGenerator::new(42);
        for _ in 0..500 {
            let problem = generator.generate(DifficultyId::Medium.config());
            let operators = problem.display_text.matches(['+', '×', '÷']).count()
                + problem.display_text.matches(" - ").count();
            assert_eq!(operators, 1, "{}", problem.display_text);
        }

        let mut saw_compound = false;
        for _ in 0..500 {
            let problem = generator.generate(DifficultyId::Hard.config());
            assert_eq!(
                problem.answer.unwrap(),
                eval_display(&problem.display_text)
            );
            let operators = problem.display_text.matches(['+', '×', '÷']).count()
                + problem.display_text.matches(" - ").count();
            saw_compound |= operators == 2;
        }
        assert!(saw_compound, "hard never appended a compound term");
    }

    #[test]
    fn serials_are_monotonic_across_paths() {
        let cfg = DifficultyId::Wizard.config();
        let mut generator = ProblemGenerator::new(5);
        let first = generator.generate(cfg);
        let request = generator.begin_word(cfg);
        assert_eq!(request.serial, first.serial + 1);
        let resolved = generator.resolve_word(request.serial, None, cfg);
        assert_eq!(resolved.serial, request.serial);
        assert_eq!(generator.generate(cfg).serial, request.serial + 1);
    }

    #[test]
    fn word_problem_coin_flip_respects_gating() {
        let easy = DifficultyId::Easy.config();
        let mut generator = ProblemGenerator::new(11);
        for _ in 0..100 {
            assert!(!generator.wants_word_problem(easy, ModeId::Challenge.config()));
        }
        // Daily mode forces word problems even on a numeric difficulty.
        let mut hits = 0;
        for _ in 0..200 {
            if generator.wants_word_problem(easy, ModeId::Daily.config()) {
                hits += 1;
            }
        }
        assert!(hits > 50 && hits < 150, "coin flip badly skewed: {hits}");
    }

    #[test]
    fn well_formed_word_response_parses() {
        let response = "\
Zara counted 7 comets and then spotted 3 more.

How many comets in total? 7 + 3 = ?
The answer is 10.";
        let problem = parse_word_problem(1, response).unwrap();
        assert_eq!(
            problem.narrative_text.as_deref(),
            Some("Zara counted 7 comets and then spotted 3 more.")
        );
        assert_eq!(problem.answer, Some(10));
    }

    #[test]
    fn short_response_falls_back_to_numeric() {
        let cfg = DifficultyId::Wizard.config();
        let mut generator = ProblemGenerator::new(3);
        let request = generator.begin_word(cfg);
        let problem = generator.resolve_word(request.serial, Some("just one line"), cfg);
        assert!(problem.narrative_text.is_none());
        assert!(problem.answer.is_some());
        assert_eq!(problem.serial, request.serial);
    }

    #[test]
    fn unparseable_answer_line_yields_unmatchable_problem() {
        let response = "A story.\n2 + 2 = ?\nno digits here";
        let problem = parse_word_problem(9, response).unwrap();
        assert_eq!(problem.answer, None);
    }

    #[test]
    fn answer_line_stripping() {
        assert_eq!(parse_answer_line("The answer is 42."), Some(42));
        assert_eq!(parse_answer_line("-8 apples"), Some(-8));
        assert_eq!(parse_answer_line("none"), None);
        assert_eq!(parse_answer_line("5 - 3"), None);
    }
}
