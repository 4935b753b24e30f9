//! Package index: entry type, sources, and the category filter.
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::IndexLocation;
use crate::error::FetchError;

/// One cask from the package index.
///
/// Only the fields this tool reads are deserialized; the rest of the
/// document is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PackageIndexEntry {
    /// Unique cask identifier, e.g. `font-fira-code`.
    pub token: String,
    /// Path of the cask definition inside its tap, e.g. `Casks/font/font-f/font-fira-code.rb`.
    #[serde(default)]
    pub ruby_source_path: Option<String>,
    /// Whether the cask is deprecated upstream.
    #[serde(default)]
    pub deprecated: bool,
    /// Whether the cask is disabled upstream.
    #[serde(default)]
    pub disabled: bool,
}

impl PackageIndexEntry {
    /// Whether the index marks the cask deprecated or disabled. Such casks
    /// are still attempted, but usually fail.
    #[must_use]
    pub const fn retired(&self) -> bool {
        self.deprecated || self.disabled
    }

    /// Entry with only a token and source path; used by tests and fixtures.
    #[must_use]
    pub fn new(token: &str, ruby_source_path: &str) -> Self {
        Self {
            token: token.to_string(),
            ruby_source_path: Some(ruby_source_path.to_string()),
            deprecated: false,
            disabled: false,
        }
    }
}

/// Anything that can produce the package index.
pub trait IndexSource: std::fmt::Debug {
    /// Human-readable origin (URL or path) for log messages.
    fn origin(&self) -> String;

    /// Retrieve and parse the whole index.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] when the document cannot be obtained, is
    /// empty, or is not a JSON array of entries.
    fn fetch(&self) -> Result<Vec<PackageIndexEntry>, FetchError>;
}

/// Index downloaded over HTTP.
#[derive(Debug, Clone)]
pub struct HttpIndex {
    url: String,
    timeout: Duration,
}

impl HttpIndex {
    /// Index at `url` with the default five-minute download limit.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            timeout: Duration::from_secs(300),
        }
    }
}

impl IndexSource for HttpIndex {
    fn origin(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<Vec<PackageIndexEntry>, FetchError> {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .timeout_global(Some(self.timeout))
                .http_status_as_error(false)
                .build(),
        );
        let transport = |e: ureq::Error| FetchError::Transport {
            url: self.url.clone(),
            message: e.to_string(),
        };

        let mut response = agent.get(self.url.as_str()).call().map_err(transport)?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status,
            });
        }

        // The full cask index is larger than ureq's default body limit.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_string()
            .map_err(transport)?;
        parse_index(&body, &self.url)
    }
}

/// Index read from a local JSON file.
#[derive(Debug, Clone)]
pub struct FileIndex {
    path: PathBuf,
}

impl FileIndex {
    /// Index stored at `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl IndexSource for FileIndex {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<PackageIndexEntry>, FetchError> {
        let body = std::fs::read_to_string(&self.path).map_err(|source| FetchError::Read {
            path: self.path.clone(),
            source,
        })?;
        parse_index(&body, &self.origin())
    }
}

/// Build the source named by `location`.
#[must_use]
pub fn source_for(location: &IndexLocation) -> Box<dyn IndexSource> {
    match location {
        IndexLocation::Url(url) => Box::new(HttpIndex::new(url)),
        IndexLocation::File(path) => Box::new(FileIndex::new(path.clone())),
    }
}

/// Parse an index document.
///
/// # Errors
///
/// Returns [`FetchError::Empty`] for a blank document and
/// [`FetchError::Parse`] for anything that is not a JSON array of entries.
pub fn parse_index(body: &str, origin: &str) -> Result<Vec<PackageIndexEntry>, FetchError> {
    if body.trim().is_empty() {
        return Err(FetchError::Empty(origin.to_string()));
    }
    serde_json::from_str(body).map_err(|source| FetchError::Parse {
        origin: origin.to_string(),
        source,
    })
}

/// Keep the entries whose source path contains `category`, in index order.
///
/// Entries without a source path never match. No match yields an empty
/// vector, which callers treat as a valid (empty) selection.
#[must_use]
pub fn filter_by_category(entries: Vec<PackageIndexEntry>, category: &str) -> Vec<PackageIndexEntry> {
    entries
        .into_iter()
        .filter(|entry| {
            entry
                .ruby_source_path
                .as_deref()
                .is_some_and(|path| path.contains(category))
        })
        .collect()
}
