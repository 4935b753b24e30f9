//! Install manifest and its Brewfile rendering.
use std::collections::HashSet;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tempfile::NamedTempFile;

use crate::history::ExclusionList;
use crate::index::PackageIndexEntry;

/// Ordered list of tokens to attempt in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallManifest {
    title: String,
    tokens: Vec<String>,
}

impl InstallManifest {
    /// Category-filtered entries minus excluded tokens, in index order.
    ///
    /// A token listed twice in the index appears once, at its first position.
    #[must_use]
    pub fn build(title: &str, filtered: &[PackageIndexEntry], excluded: &ExclusionList) -> Self {
        let mut seen = HashSet::new();
        let tokens = filtered
            .iter()
            .map(|entry| entry.token.as_str())
            .filter(|token| !excluded.contains(token))
            .filter(|token| seen.insert(*token))
            .map(str::to_string)
            .collect();
        Self {
            title: title.to_string(),
            tokens,
        }
    }

    /// Tokens in install order.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether there is nothing to install.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Whether `token` is part of this manifest.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Brewfile text: a comment header followed by one `cask` line per token.
    #[must_use]
    pub fn render(&self, generated_at: DateTime<Local>) -> String {
        let mut out = format!(
            "# {}\n# Generated: {}\n# Total casks: {}\n\n",
            self.title,
            generated_at.format("%Y-%m-%d %H:%M:%S %z"),
            self.tokens.len()
        );
        for token in &self.tokens {
            out.push_str(&format!("cask \"{token}\"\n"));
        }
        out
    }

    /// Write the Brewfile to a temporary file that is removed on drop.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary file cannot be created or written.
    pub fn write_temp(&self, generated_at: DateTime<Local>) -> Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("caskbatch-")
            .suffix(".Brewfile")
            .tempfile()
            .context("creating temporary Brewfile")?;
        file.write_all(self.render(generated_at).as_bytes())
            .context("writing temporary Brewfile")?;
        file.flush().context("flushing temporary Brewfile")?;
        Ok(file)
    }

    /// Write the Brewfile to `dir/Brewfile.<label>.<YYYYmmdd_HHMMSS>` for
    /// later manual use and return its path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn export(&self, dir: &Path, label: &str, generated_at: DateTime<Local>) -> Result<PathBuf> {
        let path = dir.join(format!(
            "Brewfile.{label}.{}",
            generated_at.format("%Y%m%d_%H%M%S")
        ));
        std::fs::write(&path, self.render(generated_at))
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
