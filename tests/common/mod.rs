// Shared helpers for integration tests.
//
// Provides a temporary working directory with a fixed in-memory cask index,
// a scripted package manager that never spawns Homebrew, and a fluent
// builder so each test can arrange history files without repeating
// filesystem boilerplate.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use caskbatch_cli::brew::PackageManager;
use caskbatch_cli::commands::install::{RunReport, Workflow};
use caskbatch_cli::commands::{Selection, select};
use caskbatch_cli::config::Settings;
use caskbatch_cli::error::FetchError;
use caskbatch_cli::exec::ExecResult;
use caskbatch_cli::history::{ExclusionList, HistoryStore};
use caskbatch_cli::index::{IndexSource, PackageIndexEntry};
use caskbatch_cli::installer::Strategy;
use caskbatch_cli::logging::Log;
use caskbatch_cli::outcome::BrewOutputClassifier;

/// File name prefix used by the default settings.
pub const HISTORY_PREFIX: &str = "invalid_brew_fonts_list_";

/// Index returning a fixed list of entries.
#[derive(Debug, Clone)]
pub struct StaticIndex(pub Vec<PackageIndexEntry>);

impl StaticIndex {
    /// Font casks with the given tokens, plus one cask outside the category.
    pub fn fonts(tokens: &[&str]) -> Self {
        let mut entries: Vec<PackageIndexEntry> = tokens
            .iter()
            .map(|t| PackageIndexEntry::new(t, &format!("Casks/font/{t}/{t}.rb")))
            .collect();
        entries.push(PackageIndexEntry::new("firefox", "Casks/f/firefox.rb"));
        Self(entries)
    }
}

impl IndexSource for StaticIndex {
    fn origin(&self) -> String {
        "static".to_string()
    }

    fn fetch(&self) -> Result<Vec<PackageIndexEntry>, FetchError> {
        Ok(self.0.clone())
    }
}

/// Package manager that answers from a script instead of running Homebrew.
///
/// Single installs fail for tokens in `failing` and succeed otherwise.
/// Bulk installs return `bulk_output` with the given exit status. Every
/// call is recorded.
#[derive(Debug, Default)]
pub struct ScriptedManager {
    failing: HashSet<String>,
    bulk_output: String,
    bulk_success: bool,
    calls: RefCell<Vec<String>>,
}

impl ScriptedManager {
    /// Manager for which every install succeeds.
    pub fn succeeding() -> Self {
        Self {
            bulk_success: true,
            ..Self::default()
        }
    }

    /// Manager for which single installs of `tokens` fail.
    pub fn failing(tokens: &[&str]) -> Self {
        Self {
            failing: tokens.iter().map(ToString::to_string).collect(),
            bulk_success: true,
            ..Self::default()
        }
    }

    /// Manager whose bulk install prints `output` and exits with `success`.
    pub fn bulk(output: &str, success: bool) -> Self {
        Self {
            bulk_output: output.to_string(),
            bulk_success: success,
            ..Self::default()
        }
    }

    /// Calls made so far, as `install <token>` or `bundle`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl PackageManager for ScriptedManager {
    fn bulk_install(&self, manifest: &Path) -> anyhow::Result<ExecResult> {
        assert!(manifest.exists(), "Brewfile must exist during bulk install");
        self.calls.borrow_mut().push("bundle".to_string());
        Ok(ExecResult {
            stdout: self.bulk_output.clone(),
            success: self.bulk_success,
            code: Some(i32::from(!self.bulk_success)),
            ..ExecResult::default()
        })
    }

    fn install(&self, token: &str) -> anyhow::Result<ExecResult> {
        self.calls.borrow_mut().push(format!("install {token}"));
        let ok = !self.failing.contains(token);
        Ok(ExecResult {
            stderr: if ok {
                String::new()
            } else {
                format!("Error: Cask '{token}' is unavailable\n")
            },
            success: ok,
            code: Some(i32::from(!ok)),
            ..ExecResult::default()
        })
    }
}

/// [`Log`] that keeps messages in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    messages: Mutex<Vec<String>>,
}

impl MemoryLog {
    /// All messages logged so far, prefixed with their level.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("log mutex").clone()
    }

    fn push(&self, level: &str, msg: &str) {
        self.messages
            .lock()
            .expect("log mutex")
            .push(format!("{level}: {msg}"));
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn output(&self, line: &str) {
        self.push("output", line);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
}

/// An isolated working directory backed by a [`tempfile::TempDir`].
#[derive(Debug)]
pub struct TestWorkspace {
    /// Temporary working directory; deleted on drop.
    pub dir: tempfile::TempDir,
    /// Index every run in this workspace reads.
    pub index: StaticIndex,
    /// Log shared by every run in this workspace.
    pub log: MemoryLog,
}

impl TestWorkspace {
    /// Workspace whose index holds font casks with `tokens`.
    pub fn new(tokens: &[&str]) -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
            index: StaticIndex::fonts(tokens),
            log: MemoryLog::default(),
        }
    }

    /// Path to the working directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Default settings rooted here, with the marker kept inside the
    /// workspace.
    pub fn settings(&self) -> Settings {
        Settings {
            marker_dir: Some(self.path().join("marker")),
            ..Settings::defaults(self.path())
        }
    }

    /// Run the install workflow with a fixed strategy.
    pub fn run(&self, manager: &dyn PackageManager, strategy: Strategy) -> anyhow::Result<RunReport> {
        self.run_choosing(manager, || Ok(strategy))
    }

    /// Run the install workflow, asking `choose` for the strategy.
    pub fn run_choosing(
        &self,
        manager: &dyn PackageManager,
        choose: impl FnOnce() -> anyhow::Result<Strategy>,
    ) -> anyhow::Result<RunReport> {
        let settings = self.settings();
        let classifier = BrewOutputClassifier::new(&settings.token_prefix).expect("classifier");
        let workflow = Workflow {
            settings: &settings,
            source: &self.index,
            manager,
            classifier: &classifier,
            log: &self.log,
        };
        workflow.execute(choose)
    }

    /// What an install would attempt right now.
    pub fn selection(&self) -> Selection {
        let settings = self.settings();
        let store = self.store();
        select(&settings, &store, &self.index, &self.log).expect("select")
    }

    /// History store for this workspace.
    pub fn store(&self) -> HistoryStore {
        HistoryStore::new(self.path(), HISTORY_PREFIX)
    }

    /// Write a history file with an explicit modification time, given in
    /// seconds after the Unix epoch.
    pub fn write_history(&self, name: &str, content: &str, mtime_secs: u64) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, content).expect("write history file");
        std::fs::File::options()
            .write(true)
            .open(&path)
            .expect("open history file")
            .set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(mtime_secs))
            .expect("set mtime");
        path
    }

    /// History files in the workspace, sorted by name.
    pub fn history_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.path())
            .expect("read workspace")
            .map(|e| e.expect("dir entry").path())
            .filter(|p| {
                p.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(HISTORY_PREFIX))
            })
            .collect();
        files.sort();
        files
    }

    /// The exclusion list a new run would load.
    pub fn latest_history(&self) -> ExclusionList {
        self.store().load_latest().expect("load history").1
    }
}
