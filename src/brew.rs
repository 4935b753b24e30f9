//! Package manager seam and its Homebrew implementation.
use anyhow::Result;
use std::path::Path;
use std::time::Duration;

use crate::exec::{ExecResult, Executor};

/// Installs casks, either all at once from a Brewfile or one at a time.
///
/// Both operations return the raw process result; deciding what failed is
/// left to an [`OutcomeClassifier`](crate::outcome::OutcomeClassifier).
#[cfg_attr(test, mockall::automock)]
pub trait PackageManager {
    /// Install everything listed in the Brewfile at `manifest` in one call.
    ///
    /// # Errors
    ///
    /// Returns an error only if the package manager cannot be started.
    fn bulk_install(&self, manifest: &Path) -> Result<ExecResult>;

    /// Install a single cask.
    ///
    /// # Errors
    ///
    /// Returns an error only if the package manager cannot be started.
    fn install(&self, token: &str) -> Result<ExecResult>;
}

/// [`PackageManager`] that shells out to `brew`.
#[derive(Debug)]
pub struct Homebrew<'a> {
    program: String,
    timeout: Option<Duration>,
    executor: &'a dyn Executor,
}

impl<'a> Homebrew<'a> {
    /// Homebrew invoked as `program`, with an optional limit on each
    /// single-cask install.
    #[must_use]
    pub fn new(program: &str, timeout: Option<Duration>, executor: &'a dyn Executor) -> Self {
        Self {
            program: program.to_string(),
            timeout,
            executor,
        }
    }

    /// Whether the configured program can be found.
    ///
    /// A program given as a path is checked for existence; a bare name is
    /// looked up on `PATH`.
    #[must_use]
    pub fn is_available(&self) -> bool {
        let program = Path::new(&self.program);
        if program.components().count() > 1 {
            return program.exists();
        }
        self.executor.which(&self.program)
    }
}

impl PackageManager for Homebrew<'_> {
    fn bulk_install(&self, manifest: &Path) -> Result<ExecResult> {
        let file_arg = format!("--file={}", manifest.display());
        self.executor
            .run_unchecked(&self.program, &["bundle", &file_arg])
    }

    fn install(&self, token: &str) -> Result<ExecResult> {
        self.executor
            .run_with_timeout(&self.program, &["install", "--cask", token], self.timeout)
    }
}
