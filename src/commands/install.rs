use anyhow::{Context as _, Result, bail};
use chrono::Local;
use std::path::PathBuf;

use super::{CommandSetup, select};
use crate::brew::{Homebrew, PackageManager};
use crate::cli::{GlobalOpts, InstallOpts};
use crate::config::Settings;
use crate::exec::SystemExecutor;
use crate::history::{HistoryStore, HistorySummary};
use crate::index::{self, IndexSource};
use crate::installer::{Installer, RunResult, Strategy};
use crate::logging::{Log, Logger};
use crate::marker;
use crate::outcome::{BrewOutputClassifier, OutcomeClassifier};
use crate::prompt::prompt_strategy;

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Casks were installed and a new exclusion list was written.
    Installed {
        /// Strategy used.
        strategy: Strategy,
        /// Per-run counts and failures.
        run: RunResult,
        /// Exclusion list written by this run.
        history_path: PathBuf,
        /// Sizes of the old, new, and merged exclusion lists.
        summary: HistorySummary,
        /// Marker file, when one was written.
        marker: Option<PathBuf>,
    },
    /// The manifest was saved as a Brewfile.
    Exported {
        /// Saved Brewfile.
        path: PathBuf,
    },
    /// Nothing was done.
    Cancelled,
}

/// One install run wired to its collaborators.
pub struct Workflow<'a> {
    /// Resolved settings.
    pub settings: &'a Settings,
    /// Where the index comes from.
    pub source: &'a dyn IndexSource,
    /// Runs the installs.
    pub manager: &'a dyn PackageManager,
    /// Reads install output.
    pub classifier: &'a dyn OutcomeClassifier,
    /// Progress output.
    pub log: &'a dyn Log,
}

impl std::fmt::Debug for Workflow<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("settings", &self.settings)
            .field("source", &self.source)
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

impl Workflow<'_> {
    /// Build the manifest, ask `choose` for a strategy, and carry it out.
    ///
    /// A new exclusion list is written only after an install strategy ran.
    /// Export and cancel leave the history untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be fetched, the history cannot
    /// be read or written, `choose` fails, or the package manager cannot be
    /// started.
    pub fn execute(&self, choose: impl FnOnce() -> Result<Strategy>) -> Result<RunReport> {
        let store = HistoryStore::new(&self.settings.work_dir, &self.settings.history_prefix);
        let selection = select(self.settings, &store, self.source, self.log)?;

        self.log.stage("Step 5/5: Choose installation method");
        let strategy = choose()?;
        let installer = Installer::new(self.manager, self.classifier, self.log);

        let run = match strategy {
            Strategy::Cancel => {
                self.log.info("Installation cancelled.");
                return Ok(RunReport::Cancelled);
            }
            Strategy::Export => {
                let path = selection.manifest.export(
                    &self.settings.work_dir,
                    &self.settings.export_label,
                    Local::now(),
                )?;
                return Ok(RunReport::Exported { path });
            }
            Strategy::Bulk => {
                self.log.stage("Installing with bulk method");
                installer.bulk(&selection.manifest, Local::now())?
            }
            Strategy::Sequential => {
                self.log.stage("Installing with sequential method");
                installer.sequential(&selection.manifest)?
            }
        };

        let (history_path, summary) = store
            .persist(&selection.previous, &run.newly_failed, Local::now())
            .context("saving exclusion list")?;
        let marker = self.write_marker();

        Ok(RunReport::Installed {
            strategy,
            run,
            history_path,
            summary,
            marker,
        })
    }

    fn write_marker(&self) -> Option<PathBuf> {
        let dir = self.settings.marker_dir.as_ref()?;
        match marker::write_marker(dir, Local::now()) {
            Ok(path) => Some(path),
            Err(e) => {
                self.log.warn(&format!("could not write marker file: {e:#}"));
                None
            }
        }
    }
}

/// Run the install command.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, the index cannot be
/// fetched, the selection is invalid, Homebrew is missing, or the history
/// cannot be written.
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    log.info(&format!("caskbatch {}", super::version::current()));

    let setup = CommandSetup::init(global, |o| o.timeout_secs = opts.timeout, log)?;
    let settings = &setup.settings;

    let executor = SystemExecutor;
    let brew = Homebrew::new(&settings.brew, settings.timeout, &executor);
    let source = index::source_for(&settings.index);
    let classifier = BrewOutputClassifier::new(&settings.token_prefix)
        .context("building output classifier")?;

    let workflow = Workflow {
        settings,
        source: source.as_ref(),
        manager: &brew,
        classifier: &classifier,
        log,
    };
    let report = workflow.execute(|| {
        let strategy = match opts.strategy {
            Some(strategy) => {
                log.info(&format!("strategy: {strategy}"));
                strategy
            }
            None => prompt_strategy(&mut std::io::stdin().lock(), &mut std::io::stdout())?,
        };
        if strategy.installs() && !brew.is_available() {
            bail!("{} not found; is Homebrew installed?", settings.brew);
        }
        Ok(strategy)
    })?;

    print_report(&report, log);
    log.print_log_location();
    Ok(())
}

/// Log the end-of-run summary.
pub fn print_report(report: &RunReport, log: &dyn Log) {
    match report {
        RunReport::Cancelled => {}
        RunReport::Exported { path } => {
            log.info(&format!("✓ Brewfile saved to: {}", path.display()));
            log.info("To install later, run:");
            log.info(&format!("  brew bundle --file={}", path.display()));
        }
        RunReport::Installed {
            strategy,
            run,
            history_path,
            summary,
            marker,
        } => {
            log.stage("Installation summary");
            log.info(&format!("Strategy:               {strategy}"));
            log.info(&format!("Total casks:            {}", run.attempted));
            match run.succeeded {
                Some(n) => log.info(&format!("Successfully installed: {n}")),
                None => log.info("Successfully installed: unknown (bulk install exited with an error)"),
            }
            log.info(&format!("Failed:                 {}", run.failed()));
            if !run.timed_out.is_empty() {
                log.info(&format!("Timed out:              {}", run.timed_out.len()));
            }

            log.stage("Exclusion list updated");
            log.info(&format!("Previous failures:      {}", summary.previous));
            log.info(&format!("Newly failed:           {}", summary.newly_failed));
            log.info(&format!("Total excluded:         {}", summary.total));
            log.info(&format!("Saved to: {}", history_path.display()));

            if !run.newly_failed.is_empty() {
                log.info("Newly failed casks this run:");
                for token in &run.newly_failed {
                    log.info(&format!("  - {token}"));
                }
            }
            if let Some(path) = marker {
                log.debug(&format!("marker: {}", path.display()));
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::brew::MockPackageManager;
    use crate::error::{FetchError, SelectionError};
    use crate::exec::ExecResult;
    use crate::index::PackageIndexEntry;
    use std::fs;

    #[derive(Debug)]
    struct StaticIndex;

    impl IndexSource for StaticIndex {
        fn origin(&self) -> String {
            "static".to_string()
        }

        fn fetch(&self) -> Result<Vec<PackageIndexEntry>, FetchError> {
            Ok(vec![
                PackageIndexEntry::new("font-a", "Casks/font/font-a/font-a.rb"),
                PackageIndexEntry::new("font-b", "Casks/font/font-b/font-b.rb"),
            ])
        }
    }

    fn settings(dir: &std::path::Path) -> Settings {
        Settings {
            marker_dir: Some(dir.join("marker")),
            ..Settings::defaults(dir)
        }
    }

    fn history_files(dir: &std::path::Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with("invalid_brew_fonts_list_"))
            })
            .collect();
        files.sort();
        files
    }

    fn run_with(
        dir: &std::path::Path,
        manager: &MockPackageManager,
        strategy: Result<Strategy, SelectionError>,
    ) -> Result<RunReport> {
        let (log, _tmp, _guard) = crate::logging::isolated_logger();
        let settings = settings(dir);
        let classifier = BrewOutputClassifier::new("font-").unwrap();
        let workflow = Workflow {
            settings: &settings,
            source: &StaticIndex,
            manager,
            classifier: &classifier,
            log: &log,
        };
        workflow.execute(|| Ok(strategy?))
    }

    #[test]
    fn sequential_run_writes_history_and_marker() {
        let dir = tempfile::tempdir().unwrap();
        let mut manager = MockPackageManager::new();
        manager.expect_install().returning(|token| {
            Ok(ExecResult {
                success: token == "font-a",
                ..ExecResult::default()
            })
        });

        let report = run_with(dir.path(), &manager, Ok(Strategy::Sequential)).unwrap();
        assert!(
            matches!(&report, RunReport::Installed { .. }),
            "sequential strategy installs"
        );
        if let RunReport::Installed {
            run,
            history_path,
            summary,
            marker,
            ..
        } = report
        {
            assert_eq!(run.succeeded, Some(1));
            assert_eq!(run.newly_failed, vec!["font-b"]);
            assert_eq!(fs::read_to_string(history_path).unwrap(), "font-b\n");
            assert_eq!(summary.total, 1);
            assert!(marker.unwrap().exists());
        }
    }

    #[test]
    fn export_writes_brewfile_and_no_history() {
        let dir = tempfile::tempdir().unwrap();
        let manager = MockPackageManager::new();

        let report = run_with(dir.path(), &manager, Ok(Strategy::Export)).unwrap();
        assert!(matches!(&report, RunReport::Exported { .. }));
        if let RunReport::Exported { path } = report {
            assert!(fs::read_to_string(path).unwrap().contains("cask \"font-b\""));
        }
        assert!(history_files(dir.path()).is_empty());
        assert!(!dir.path().join("marker").exists());
    }

    #[test]
    fn cancel_does_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let manager = MockPackageManager::new();

        let report = run_with(dir.path(), &manager, Ok(Strategy::Cancel)).unwrap();
        assert_eq!(report, RunReport::Cancelled);
        assert!(history_files(dir.path()).is_empty());
    }

    #[test]
    fn invalid_selection_fails_without_history() {
        let dir = tempfile::tempdir().unwrap();
        let manager = MockPackageManager::new();

        let err = run_with(
            dir.path(),
            &manager,
            Err(SelectionError::Invalid("9".to_string())),
        )
        .unwrap_err();
        assert!(err.downcast_ref::<SelectionError>().is_some());
        assert!(history_files(dir.path()).is_empty());
    }

    #[test]
    fn marker_failure_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("marker"), "not a directory").unwrap();
        let mut manager = MockPackageManager::new();
        manager.expect_bulk_install().returning(|_| {
            Ok(ExecResult {
                success: true,
                ..ExecResult::default()
            })
        });

        let report = run_with(dir.path(), &manager, Ok(Strategy::Bulk)).unwrap();
        assert!(matches!(report, RunReport::Installed { marker: None, .. }));
        assert_eq!(history_files(dir.path()).len(), 1);
    }
}
