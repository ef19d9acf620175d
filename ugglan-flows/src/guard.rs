//! Declarative checks on generated text, with a single corrective retry.

use std::fmt;

use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};
use ugglan_core::Message;
use ugglan_llm::{CompletionOptions, TextGenerator};

use crate::WizardError;

const CORRECTION_HEADER: &str = "Ditt förra svar uppfyllde inte kraven. Rätta följande:";

#[derive(Clone, Debug, Default)]
pub struct Constraints {
    must_include: Vec<String>,
    required_prefix: Option<String>,
    forbidden: Option<Regex>,
    min_words: Option<usize>,
    max_words: Option<usize>,
}

impl Constraints {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn must_include<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.must_include = normalize_phrases(phrases);
        self
    }

    pub fn required_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.required_prefix = Some(prefix.into());
        self
    }

    /// Whole-word, case-insensitive ban on each of `terms`.
    pub fn forbidden_terms(mut self, terms: &[&str]) -> Self {
        if terms.is_empty() {
            self.forbidden = None;
            return self;
        }
        let alternation = terms
            .iter()
            .map(|term| regex::escape(term))
            .collect::<Vec<_>>()
            .join("|");
        match RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
            .case_insensitive(true)
            .build()
        {
            Ok(pattern) => self.forbidden = Some(pattern),
            Err(error) => warn!(%error, "ignoring forbidden terms that do not compile"),
        }
        self
    }

    pub fn word_bounds(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_words = min;
        self.max_words = max;
        self
    }

    pub fn phrases(&self) -> &[String] {
        &self.must_include
    }

    pub fn prefix(&self) -> Option<&str> {
        self.required_prefix.as_deref()
    }

    pub fn check(&self, text: &str) -> Vec<Violation> {
        let text = text.trim();
        if text.is_empty() {
            return vec![Violation::Empty];
        }

        let mut violations = Vec::new();
        if let Some(prefix) = &self.required_prefix {
            if !text.starts_with(prefix.as_str()) {
                violations.push(Violation::MissingPrefix(prefix.clone()));
            }
        }
        for phrase in &self.must_include {
            if !text.contains(phrase.as_str()) {
                violations.push(Violation::MissingPhrase(phrase.clone()));
            }
        }
        if let Some(pattern) = &self.forbidden {
            let mut seen: Vec<String> = Vec::new();
            for found in pattern.find_iter(text) {
                let term = found.as_str().to_lowercase();
                if !seen.contains(&term) {
                    seen.push(term.clone());
                    violations.push(Violation::ForbiddenTerm(term));
                }
            }
        }
        let count = text.split_whitespace().count();
        if let Some(min) = self.min_words {
            if count < min {
                violations.push(Violation::TooFewWords { count, min });
            }
        }
        if let Some(max) = self.max_words {
            if count > max {
                violations.push(Violation::TooManyWords { count, max });
            }
        }
        violations
    }

    /// Requirement lines to put in the instruction up front.
    pub fn instructions(&self) -> String {
        let mut lines = Vec::new();
        if let Some(prefix) = &self.required_prefix {
            lines.push(format!("Texten MÅSTE börja med \"{prefix}\"."));
        }
        if !self.must_include.is_empty() {
            lines.push("Följande uttryck MÅSTE finnas med ordagrant:".to_string());
            lines.extend(self.must_include.iter().map(|p| format!("- \"{p}\"")));
        }
        match (self.min_words, self.max_words) {
            (Some(min), Some(max)) => lines.push(format!("Längd: {min}–{max} ord.")),
            (None, Some(max)) => lines.push(format!("Längd: högst {max} ord.")),
            (Some(min), None) => lines.push(format!("Längd: minst {min} ord.")),
            (None, None) => {}
        }
        lines.join("\n")
    }
}

/// Trims, drops empties and duplicates, keeps first-seen order.
pub fn normalize_phrases<I, S>(phrases: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for phrase in phrases {
        let phrase = phrase.as_ref().trim();
        if !phrase.is_empty() && !out.iter().any(|p| p == phrase) {
            out.push(phrase.to_string());
        }
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    Empty,
    MissingPhrase(String),
    MissingPrefix(String),
    ForbiddenTerm(String),
    TooFewWords { count: usize, min: usize },
    TooManyWords { count: usize, max: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("Svaret var tomt. Skriv själva texten."),
            Self::MissingPhrase(phrase) => write!(
                f,
                "OBLIGATORISKT UTTRYCK SAKNAS: \"{phrase}\" måste finnas med exakt så här."
            ),
            Self::MissingPrefix(prefix) => write!(f, "Texten måste börja med \"{prefix}\"."),
            Self::ForbiddenTerm(term) => write!(f, "Använd inte ordet \"{term}\"."),
            Self::TooFewWords { count, min } => {
                write!(f, "Texten är för kort ({count} ord). Skriv minst {min} ord.")
            }
            Self::TooManyWords { count, max } => {
                write!(f, "Texten är för lång ({count} ord). Håll dig till högst {max} ord.")
            }
        }
    }
}

/// Outcome of a guarded generation. Empty `violations` means the text passed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Guarded {
    pub text: String,
    pub attempts: u8,
    pub violations: Vec<Violation>,
}

impl Guarded {
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Generates once, and if the text breaks `constraints`, once more with the
/// correction notes appended to the system instruction. The second attempt is
/// accepted whatever it contains. Adapter errors propagate without a retry.
pub async fn guarded_generate(
    generator: &TextGenerator,
    system: &str,
    user: &str,
    constraints: &Constraints,
    options: &CompletionOptions,
) -> Result<Guarded, WizardError> {
    let first = generator
        .generate_with(vec![Message::system(system), Message::user(user)], options)
        .await?;
    let violations = constraints.check(&first);
    if violations.is_empty() {
        return Ok(Guarded {
            text: first,
            attempts: 1,
            violations,
        });
    }

    debug!(violations = violations.len(), "first attempt failed validation, retrying");
    let amended = amend_instruction(system, &violations);
    let second = generator
        .generate_with(vec![Message::system(amended), Message::user(user)], options)
        .await?;
    let violations = constraints.check(&second);
    if !violations.is_empty() {
        let notes = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        warn!(%notes, "accepting second attempt that still fails validation");
    }
    Ok(Guarded {
        text: second,
        attempts: 2,
        violations,
    })
}

fn amend_instruction(system: &str, violations: &[Violation]) -> String {
    let mut amended = format!("{system}\n\n{CORRECTION_HEADER}");
    for violation in violations {
        amended.push_str("\n- ");
        amended.push_str(&violation.to_string());
    }
    amended
}
