//! Batch installer for Homebrew casks that remembers what failed.
//!
//! Each run downloads the cask index, keeps the casks of one category
//! (fonts by default), drops every token recorded as failed by an earlier
//! run, and installs the rest. Tokens that fail this run are merged into a
//! new timestamped exclusion list, so the set of skipped casks only grows
//! until the user deletes the files.
//!
//! The crate is organised in layers:
//!
//! - **[`index`]**, **[`history`]**, **[`manifest`]**: data in and out
//! - **[`exec`]**, **[`brew`]**, **[`outcome`]**: running Homebrew and reading its output
//! - **[`installer`]**, **[`prompt`]**, **[`marker`]**: carrying out a chosen strategy
//! - **[`commands`]**: top-level subcommand orchestration (`install`, `plan`, `history`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod brew;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod history;
pub mod index;
pub mod installer;
pub mod logging;
pub mod manifest;
pub mod marker;
pub mod outcome;
pub mod prompt;
