//! Domain-specific error types for the batch installer.
//!
//! Internal modules return typed errors (e.g., [`FetchError`],
//! [`HistoryError`]) while command handlers at the CLI boundary convert them
//! to [`anyhow::Error`] via the standard `?` operator.
//!
//! | Error              | Raised by                                  |
//! |--------------------|--------------------------------------------|
//! | [`FetchError`]     | package index download and parsing (fatal) |
//! | [`HistoryError`]   | exclusion list files                       |
//! | [`SelectionError`] | installation strategy choice (fatal)       |
//! | [`ConfigError`]    | settings file loading                      |

use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort the run before any install is attempted.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The server answered with something other than `200 OK`.
    #[error("GET {url} returned HTTP {status}")]
    Status {
        /// Requested URL.
        url: String,
        /// HTTP status code received.
        status: u16,
    },

    /// The request never produced a response.
    #[error("GET {url} failed: {message}")]
    Transport {
        /// Requested URL.
        url: String,
        /// Transport-level failure description.
        message: String,
    },

    /// The index document was empty.
    #[error("package index from {0} is empty")]
    Empty(String),

    /// A local index file could not be read.
    #[error("cannot read package index {path}: {source}")]
    Read {
        /// Path of the index file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The index document is not a JSON array of package entries.
    #[error("package index from {origin} is not valid JSON: {source}")]
    Parse {
        /// URL or path the document came from.
        origin: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Errors that arise from exclusion list files.
#[derive(Error, Debug)]
pub enum HistoryError {
    /// The history directory could not be listed.
    #[error("cannot scan {path} for exclusion lists: {source}")]
    Scan {
        /// Directory being scanned.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An exclusion list file could not be read.
    #[error("cannot read exclusion list {path}: {source}")]
    Read {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A new exclusion list file could not be written.
    #[error("cannot write exclusion list {path}: {source}")]
    Write {
        /// File being written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise from choosing an installation strategy.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    /// The menu input did not name one of the offered choices.
    #[error("invalid choice '{0}', installation cancelled")]
    Invalid(String),

    /// No input was available on standard input.
    #[error("no selection was entered")]
    NoInput,
}

/// Errors that arise from loading the settings file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid TOML or has unknown keys.
    #[error("Invalid TOML in {path}: {message}")]
    InvalidSyntax {
        /// Path to the offending file.
        path: PathBuf,
        /// Parser message.
        message: String,
    },
}
