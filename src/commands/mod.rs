pub mod completions;
pub mod history;
pub mod install;
pub mod plan;
pub mod version;

use anyhow::{Context as _, Result};
use std::collections::HashSet;
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::config::{Overrides, Settings};
use crate::history::{ExclusionList, HistoryStore};
use crate::index::{self, IndexSource};
use crate::logging::Log;
use crate::manifest::InstallManifest;

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Settings resolved for this invocation.
    pub settings: Settings,
}

impl CommandSetup {
    /// Resolve settings from the global options plus command-specific
    /// `extra` overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be read or is invalid.
    pub fn init(global: &GlobalOpts, extra: impl FnOnce(&mut Overrides), log: &dyn Log) -> Result<Self> {
        let mut overrides = global.overrides();
        extra(&mut overrides);
        let settings = Settings::load(&overrides).context("loading settings")?;

        log.debug(&format!("working directory: {}", settings.work_dir.display()));
        log.debug(&format!("index: {}", settings.index));
        log.debug(&format!("category: {}", settings.category));
        if let Some(timeout) = settings.timeout {
            log.debug(&format!("per-cask timeout: {}s", timeout.as_secs()));
        }
        Ok(Self { settings })
    }

    /// Exclusion history store for the working directory.
    #[must_use]
    pub fn history_store(&self) -> HistoryStore {
        HistoryStore::new(&self.settings.work_dir, &self.settings.history_prefix)
    }
}

/// Everything known about a run before a strategy is chosen.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Entries in the downloaded index.
    pub indexed: usize,
    /// Entries matching the category.
    pub in_category: usize,
    /// Exclusion list the manifest was built against, if one existed.
    pub history_file: Option<PathBuf>,
    /// Tokens excluded from earlier runs.
    pub previous: ExclusionList,
    /// Tokens to attempt.
    pub manifest: InstallManifest,
    /// Manifest tokens the index marks deprecated or disabled.
    pub retired: Vec<String>,
}

impl Selection {
    /// Category entries dropped because they failed before.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.in_category.saturating_sub(self.manifest.len())
    }
}

/// Fetch and filter the index, load history, and build the manifest,
/// logging steps 1 to 4 of the install workflow.
///
/// # Errors
///
/// Returns an error if the index cannot be fetched or parsed, or the
/// history cannot be read.
pub fn select(
    settings: &Settings,
    store: &HistoryStore,
    source: &dyn IndexSource,
    log: &dyn Log,
) -> Result<Selection> {
    log.stage("Step 1/5: Downloading cask list");
    log.debug(&format!("source: {}", source.origin()));
    let entries = source.fetch()?;
    let indexed = entries.len();
    log.info(&format!("✓ Downloaded {indexed} casks"));

    log.stage(&format!("Step 2/5: Filtering for {}", settings.category));
    let filtered = index::filter_by_category(entries, &settings.category);
    let in_category = filtered.len();
    log.info(&format!("✓ Found {in_category} matching casks"));
    if filtered.is_empty() {
        log.warn(&format!("no casks matched category {}", settings.category));
    }

    log.stage("Step 3/5: Filtering out known failures");
    let (history_file, previous) = store.load_latest()?;
    match &history_file {
        Some(path) => {
            log.info(&format!("Using exclusion list: {}", path.display()));
            log.info(&format!("Loaded {} casks from previous runs", previous.len()));
        }
        None => log.info("No exclusion list found, starting fresh"),
    }

    log.stage("Step 4/5: Building manifest");
    let manifest = InstallManifest::build(&settings.title, &filtered, &previous);
    let flagged: HashSet<&str> = filtered
        .iter()
        .filter(|entry| entry.retired())
        .map(|entry| entry.token.as_str())
        .collect();
    let retired: Vec<String> = manifest
        .tokens()
        .iter()
        .filter(|token| flagged.contains(token.as_str()))
        .cloned()
        .collect();
    if !retired.is_empty() {
        log.warn(&format!(
            "{} casks are deprecated or disabled upstream and will likely fail",
            retired.len()
        ));
    }
    let selection = Selection {
        indexed,
        in_category,
        history_file,
        previous,
        manifest,
        retired,
    };
    log.info(&format!("✓ Filtered out {} known failures", selection.excluded()));
    log.info(&format!("Final cask count: {}", selection.manifest.len()));
    Ok(selection)
}
