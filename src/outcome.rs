//! Classification of package manager output into per-token outcomes.
//!
//! Homebrew has no machine-readable failure report, so outcomes are read
//! off its human-oriented messages. The matching lives behind
//! [`OutcomeClassifier`] so it can be replaced without touching process
//! handling.
use regex::Regex;

use crate::exec::ExecResult;

/// Output phrases that mean the cask is installed even when the exit status
/// says otherwise.
const SATISFIED_MARKERS: &[&str] = &["successfully", "already installed", "latest version"];

/// Decides which tokens failed based on package manager output.
pub trait OutcomeClassifier: std::fmt::Debug {
    /// Tokens reported as failed or disabled in bulk install output, in the
    /// order first reported, without duplicates.
    fn failed_tokens(&self, output: &str) -> Vec<String>;

    /// Whether a single-token install left the token installed. A timed
    /// out install never counts.
    fn install_succeeded(&self, result: &ExecResult) -> bool;
}

/// Line-pattern classifier for Homebrew messages.
///
/// Recognises `Error: ... '<token>' ...` and
/// `Cask '<token>' has been disabled ...` where the token starts with a
/// configured prefix. A failure worded any other way goes unnoticed.
#[derive(Debug, Clone)]
pub struct BrewOutputClassifier {
    error_line: Regex,
    disabled_line: Regex,
}

impl BrewOutputClassifier {
    /// Classifier for tokens beginning with `token_prefix` (e.g. `font-`).
    ///
    /// # Errors
    ///
    /// Returns an error if the patterns fail to compile.
    pub fn new(token_prefix: &str) -> Result<Self, regex::Error> {
        let token = format!(r#"({}[^'"\s]+)"#, regex::escape(token_prefix));
        Ok(Self {
            error_line: Regex::new(&format!(r#"Error:.*?['"]?{token}"#))?,
            disabled_line: Regex::new(&format!(r#"Cask ['"]?{token}['"]? has been disabled"#))?,
        })
    }

    fn token_in_line(&self, line: &str) -> Option<String> {
        let caps = self
            .error_line
            .captures(line)
            .or_else(|| self.disabled_line.captures(line))?;
        let token = caps
            .get(1)?
            .as_str()
            .trim_end_matches([':', ',', '.', ';', ')', '!']);
        (!token.is_empty()).then(|| token.to_string())
    }
}

impl OutcomeClassifier for BrewOutputClassifier {
    fn failed_tokens(&self, output: &str) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for token in output.lines().filter_map(|line| self.token_in_line(line)) {
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }

    fn install_succeeded(&self, result: &ExecResult) -> bool {
        if result.timed_out {
            return false;
        }
        if result.success {
            return true;
        }
        let output = result.combined();
        SATISFIED_MARKERS.iter().any(|m| output.contains(m))
    }
}
