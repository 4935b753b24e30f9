//! Installation strategies and the per-run failure accumulator.
use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};

use crate::brew::PackageManager;
use crate::error::SelectionError;
use crate::logging::Log;
use crate::manifest::InstallManifest;
use crate::outcome::OutcomeClassifier;

/// What to do with the manifest once it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Strategy {
    /// One `brew bundle` call for the whole manifest.
    Bulk,
    /// One `brew install --cask` call per token, continuing past failures.
    Sequential,
    /// Save the manifest as a Brewfile and stop.
    Export,
    /// Stop without doing anything.
    Cancel,
}

impl Strategy {
    /// Map a menu answer (`1` to `4`) to a strategy.
    ///
    /// Surrounding whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::Invalid`] for any other input.
    pub fn from_choice(input: &str) -> Result<Self, SelectionError> {
        match input.trim() {
            "1" => Ok(Self::Bulk),
            "2" => Ok(Self::Sequential),
            "3" => Ok(Self::Export),
            "4" => Ok(Self::Cancel),
            other => Err(SelectionError::Invalid(other.to_string())),
        }
    }

    /// Whether this strategy runs the package manager.
    #[must_use]
    pub const fn installs(self) -> bool {
        matches!(self, Self::Bulk | Self::Sequential)
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bulk => "bulk",
            Self::Sequential => "sequential",
            Self::Export => "export",
            Self::Cancel => "cancel",
        };
        f.write_str(name)
    }
}

/// Outcome of one install run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunResult {
    /// Tokens handed to the package manager.
    pub attempted: usize,
    /// Tokens known to be installed, or `None` when a bulk run ended in
    /// error and successes cannot be inferred from its output.
    pub succeeded: Option<usize>,
    /// Tokens that failed this run, in the order they failed.
    pub newly_failed: Vec<String>,
    /// Subset of `newly_failed` that hit the time limit.
    pub timed_out: Vec<String>,
}

impl RunResult {
    fn record_success(&mut self) {
        self.succeeded = Some(self.succeeded.unwrap_or(0) + 1);
    }

    fn record_failure(&mut self, token: &str) {
        if !self.newly_failed.iter().any(|t| t == token) {
            self.newly_failed.push(token.to_string());
        }
    }

    /// Number of failed tokens.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.newly_failed.len()
    }
}

/// Runs a manifest through a [`PackageManager`] and collects failures.
pub struct Installer<'a> {
    manager: &'a dyn PackageManager,
    classifier: &'a dyn OutcomeClassifier,
    log: &'a dyn Log,
}

impl std::fmt::Debug for Installer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Installer")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl<'a> Installer<'a> {
    /// Installer using `manager` for installs and `classifier` to read
    /// their output.
    #[must_use]
    pub fn new(
        manager: &'a dyn PackageManager,
        classifier: &'a dyn OutcomeClassifier,
        log: &'a dyn Log,
    ) -> Self {
        Self {
            manager,
            classifier,
            log,
        }
    }

    /// Install every token with a single bulk call.
    ///
    /// The package manager may stop at the first error, so tokens after it
    /// are neither installed nor reported. Only reported tokens that belong
    /// to the manifest are recorded as failed; the rest are retried on the
    /// next run.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary Brewfile cannot be written or the
    /// package manager cannot be started.
    pub fn bulk(&self, manifest: &InstallManifest, generated_at: DateTime<Local>) -> Result<RunResult> {
        let brewfile = manifest.write_temp(generated_at)?;
        self.log
            .debug(&format!("Brewfile: {}", brewfile.path().display()));
        self.log.warn("bulk install stops at the first error");
        self.log
            .info(&format!("Total casks to install: {}", manifest.len()));

        let result = self
            .manager
            .bulk_install(brewfile.path())
            .context("running bulk install")?;
        let output = result.combined();
        for line in output.lines() {
            self.log.output(line);
        }

        let mut run = RunResult {
            attempted: manifest.len(),
            ..RunResult::default()
        };
        for token in self.classifier.failed_tokens(&output) {
            if manifest.contains(&token) {
                run.record_failure(&token);
            } else {
                self.log
                    .debug(&format!("ignoring reported failure outside manifest: {token}"));
            }
        }
        run.succeeded = result
            .success
            .then(|| manifest.len().saturating_sub(run.failed()));
        if !result.success {
            self.log.warn(&format!(
                "bulk install exited with status {}; unreported casks will be retried next run",
                result
                    .code
                    .map_or_else(|| "unknown".to_string(), |c| c.to_string())
            ));
        }
        Ok(run)
    }

    /// Install tokens one at a time, in manifest order, continuing past
    /// failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be started. Failed or
    /// timed-out installs are recorded, not returned.
    pub fn sequential(&self, manifest: &InstallManifest) -> Result<RunResult> {
        self.log.warn("sequential install continues past failed casks");
        self.log
            .info(&format!("Total casks to install: {}", manifest.len()));

        let total = manifest.len();
        let mut run = RunResult {
            attempted: total,
            succeeded: Some(0),
            ..RunResult::default()
        };
        for (i, token) in manifest.tokens().iter().enumerate() {
            let result = self
                .manager
                .install(token)
                .with_context(|| format!("installing {token}"))?;
            if self.classifier.install_succeeded(&result) {
                run.record_success();
                self.log
                    .info(&format!("[{}/{total}] Installing: {token:<40} ✓", i + 1));
            } else {
                run.record_failure(token);
                if result.timed_out {
                    run.timed_out.push(token.clone());
                }
                let verdict = if result.timed_out { "✗ (timed out)" } else { "✗" };
                self.log
                    .info(&format!("[{}/{total}] Installing: {token:<40} {verdict}", i + 1));
                let detail = result.combined();
                if !detail.trim().is_empty() {
                    self.log.debug(detail.trim_end());
                }
            }
        }
        Ok(run)
    }
}
