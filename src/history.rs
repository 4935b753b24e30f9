//! Exclusion lists of tokens that failed to install in earlier runs.
//!
//! Each run that installs anything writes a new
//! `<prefix><YYYYmmdd_HHMMSS>.txt` file holding every token ever recorded
//! as failed. Only the most recently modified file is read back, so the
//! files form an append-only series in which the newest one is a superset
//! of all earlier ones. Nothing here deletes or rewrites an existing file.
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::error::HistoryError;

/// Set of tokens to skip, kept sorted so written files are stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionList {
    tokens: BTreeSet<String>,
}

impl ExclusionList {
    /// Parse newline-delimited text. Lines are trimmed and blank lines are
    /// dropped; every other line is taken verbatim as a token.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect()
    }

    /// Whether `token` is excluded.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Number of excluded tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether nothing is excluded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Tokens in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// A new list holding this list plus `failed`.
    #[must_use]
    pub fn union<'a>(&self, failed: impl IntoIterator<Item = &'a str>) -> Self {
        let mut merged = self.clone();
        merged
            .tokens
            .extend(failed.into_iter().map(str::to_string));
        merged
    }

    /// Newline-terminated file content; empty for an empty list.
    #[must_use]
    pub fn to_file_content(&self) -> String {
        self.tokens.iter().map(|t| format!("{t}\n")).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Counts reported after the history is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistorySummary {
    /// Tokens in the list read at the start of the run.
    pub previous: usize,
    /// Tokens newly recorded as failed by this run.
    pub newly_failed: usize,
    /// Tokens in the list written at the end of the run.
    pub total: usize,
}

/// Directory of exclusion list files sharing a name prefix.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    dir: PathBuf,
    prefix: String,
}

impl HistoryStore {
    /// Store for files named `<prefix>*.txt` in `dir`.
    #[must_use]
    pub fn new(dir: &Path, prefix: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            prefix: prefix.to_string(),
        }
    }

    /// Whether `name` follows this store's naming pattern.
    fn matches(&self, name: &str) -> bool {
        name.len() >= self.prefix.len() + ".txt".len()
            && name.starts_with(&self.prefix)
            && name.ends_with(".txt")
    }

    /// The most recently modified exclusion list, if any.
    ///
    /// Files with equal modification times are ordered by name, the greatest
    /// winning, so the result is deterministic on coarse-grained filesystems.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed. A missing
    /// directory is treated as having no history.
    pub fn latest_file(&self) -> Result<Option<PathBuf>, HistoryError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(HistoryError::Scan {
                    path: self.dir.clone(),
                    source,
                });
            }
        };

        let mut latest: Option<(SystemTime, String, PathBuf)> = None;
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if !self.matches(&name) {
                continue;
            }
            // Follows symlinks, unlike `DirEntry::metadata`.
            let Ok(meta) = fs::metadata(entry.path()) else {
                continue;
            };
            if !meta.is_file() {
                continue;
            }
            let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            let newer = latest
                .as_ref()
                .is_none_or(|(t, n, _)| (modified, &name) > (*t, n));
            if newer {
                latest = Some((modified, name, entry.path()));
            }
        }
        Ok(latest.map(|(_, _, path)| path))
    }

    /// Load the most recent exclusion list, or an empty one if none exists.
    ///
    /// Returns the path it was read from alongside the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be scanned or the latest file
    /// cannot be read.
    pub fn load_latest(&self) -> Result<(Option<PathBuf>, ExclusionList), HistoryError> {
        let Some(path) = self.latest_file()? else {
            return Ok((None, ExclusionList::default()));
        };
        let text = fs::read_to_string(&path).map_err(|source| HistoryError::Read {
            path: path.clone(),
            source,
        })?;
        Ok((Some(path), ExclusionList::parse(&text)))
    }

    /// Write `previous ∪ newly_failed` to a new timestamped file.
    ///
    /// The file is always written, even when the union is empty. If a file
    /// with the same timestamp already exists a numeric suffix is appended
    /// rather than overwriting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn persist(
        &self,
        previous: &ExclusionList,
        newly_failed: &[String],
        now: DateTime<Local>,
    ) -> Result<(PathBuf, HistorySummary), HistoryError> {
        let merged = previous.union(newly_failed.iter().map(String::as_str));
        let path = self.next_path(now);
        write_new(&path, &merged.to_file_content()).map_err(|source| HistoryError::Write {
            path: path.clone(),
            source,
        })?;
        let summary = HistorySummary {
            previous: previous.len(),
            newly_failed: newly_failed.len(),
            total: merged.len(),
        };
        Ok((path, summary))
    }

    fn next_path(&self, now: DateTime<Local>) -> PathBuf {
        let stamp = now.format("%Y%m%d_%H%M%S");
        let first = self.dir.join(format!("{}{stamp}.txt", self.prefix));
        if !first.exists() {
            return first;
        }
        (1u32..)
            .map(|n| self.dir.join(format!("{}{stamp}_{n}.txt", self.prefix)))
            .find(|candidate| !candidate.exists())
            .unwrap_or(first)
    }
}

/// Create `path` exclusively and write `content` to it.
fn write_new(path: &Path, content: &str) -> std::io::Result<()> {
    use std::io::Write as _;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()
}
