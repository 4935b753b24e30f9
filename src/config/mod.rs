//! Run settings: built-in defaults, an optional `caskbatch.toml`, and
//! command-line overrides, applied in that order.
pub mod toml_loader;

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;

/// Homebrew's public cask index.
pub const DEFAULT_INDEX_URL: &str = "https://formulae.brew.sh/api/cask.json";
/// Source-path fragment shared by every font cask.
pub const DEFAULT_CATEGORY: &str = "Casks/font/";
/// Prefix every font cask token starts with.
pub const DEFAULT_TOKEN_PREFIX: &str = "font-";
/// File name prefix of exclusion list files.
pub const DEFAULT_HISTORY_PREFIX: &str = "invalid_brew_fonts_list_";
/// Label embedded in exported Brewfile names.
pub const DEFAULT_EXPORT_LABEL: &str = "all-fonts";
/// Title written into the Brewfile header.
pub const DEFAULT_TITLE: &str = "Homebrew All Fonts";
/// Directory name of the marker file under the user data directory.
pub const DEFAULT_MARKER_DIR_NAME: &str = "homebrew-all-fonts";
/// Settings file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "caskbatch.toml";

/// Where the package index comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLocation {
    /// Download over HTTP(S).
    Url(String),
    /// Read a previously downloaded JSON document.
    File(PathBuf),
}

impl std::fmt::Display for IndexLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory scanned for exclusion lists and receiving new ones.
    pub work_dir: PathBuf,
    /// Package index source.
    pub index: IndexLocation,
    /// Substring a cask's source path must contain to be selected.
    pub category: String,
    /// Prefix used to recognise tokens in package manager error output.
    pub token_prefix: String,
    /// File name prefix of exclusion list files.
    pub history_prefix: String,
    /// Label embedded in exported Brewfile names.
    pub export_label: String,
    /// Title written into the Brewfile header.
    pub title: String,
    /// Package manager executable.
    pub brew: String,
    /// Time limit for each single-cask install; `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Directory holding the marker file; `None` disables the marker.
    pub marker_dir: Option<PathBuf>,
}

/// On-disk representation of `caskbatch.toml`. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct SettingsFile {
    index_url: Option<String>,
    index_file: Option<PathBuf>,
    category: Option<String>,
    token_prefix: Option<String>,
    history_prefix: Option<String>,
    export_label: Option<String>,
    title: Option<String>,
    brew: Option<String>,
    timeout_secs: Option<u64>,
    marker_dir: Option<PathBuf>,
    marker: Option<bool>,
}

/// Values supplied on the command line, which win over the settings file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Working directory.
    pub dir: Option<PathBuf>,
    /// Explicit settings file; must exist when given.
    pub config: Option<PathBuf>,
    /// Index URL.
    pub index_url: Option<String>,
    /// Local index file.
    pub index_file: Option<PathBuf>,
    /// Category substring.
    pub category: Option<String>,
    /// Package manager executable.
    pub brew: Option<String>,
    /// Per-install time limit in seconds.
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Built-in defaults rooted at `work_dir`.
    #[must_use]
    pub fn defaults(work_dir: &Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            index: IndexLocation::Url(DEFAULT_INDEX_URL.to_string()),
            category: DEFAULT_CATEGORY.to_string(),
            token_prefix: DEFAULT_TOKEN_PREFIX.to_string(),
            history_prefix: DEFAULT_HISTORY_PREFIX.to_string(),
            export_label: DEFAULT_EXPORT_LABEL.to_string(),
            title: DEFAULT_TITLE.to_string(),
            brew: "brew".to_string(),
            timeout: None,
            marker_dir: dirs::data_dir().map(|d| d.join(DEFAULT_MARKER_DIR_NAME)),
        }
    }

    /// Resolve settings from defaults, the settings file, and `overrides`.
    ///
    /// # Errors
    ///
    /// Returns an error if the working directory cannot be determined, an
    /// explicit settings file is missing, or the settings file is invalid.
    pub fn load(overrides: &Overrides) -> Result<Self, ConfigError> {
        let work_dir = match &overrides.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().map_err(|source| ConfigError::Io {
                path: PathBuf::from("."),
                source,
            })?,
        };

        let config_path = match &overrides.config {
            Some(path) if !path.exists() => {
                return Err(ConfigError::Io {
                    path: path.clone(),
                    source: std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "settings file does not exist",
                    ),
                });
            }
            Some(path) => path.clone(),
            None => work_dir.join(CONFIG_FILE_NAME),
        };
        let file: SettingsFile = toml_loader::load_config(&config_path)?;

        let mut settings = Self::defaults(&work_dir);
        settings.apply_file(file);
        settings.apply_overrides(overrides);
        Ok(settings)
    }

    fn apply_file(&mut self, file: SettingsFile) {
        if let Some(url) = file.index_url {
            self.index = IndexLocation::Url(url);
        }
        if let Some(path) = file.index_file {
            self.index = IndexLocation::File(self.relative_to_work_dir(path));
        }
        if let Some(category) = file.category {
            self.category = category;
        }
        if let Some(prefix) = file.token_prefix {
            self.token_prefix = prefix;
        }
        if let Some(prefix) = file.history_prefix {
            self.history_prefix = prefix;
        }
        if let Some(label) = file.export_label {
            self.export_label = label;
        }
        if let Some(title) = file.title {
            self.title = title;
        }
        if let Some(brew) = file.brew {
            self.brew = brew;
        }
        if let Some(secs) = file.timeout_secs {
            self.timeout = timeout_from_secs(secs);
        }
        if let Some(dir) = file.marker_dir {
            self.marker_dir = Some(dir);
        }
        if file.marker == Some(false) {
            self.marker_dir = None;
        }
    }

    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.index_url {
            self.index = IndexLocation::Url(url.clone());
        }
        if let Some(path) = &overrides.index_file {
            self.index = IndexLocation::File(path.clone());
        }
        if let Some(category) = &overrides.category {
            self.category.clone_from(category);
        }
        if let Some(brew) = &overrides.brew {
            self.brew.clone_from(brew);
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout = timeout_from_secs(secs);
        }
    }

    fn relative_to_work_dir(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.work_dir.join(path)
        }
    }
}

/// A zero timeout means "no limit".
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_font_casks() {
        let settings = Settings::defaults(Path::new("/work"));
        assert_eq!(
            settings.index,
            IndexLocation::Url(DEFAULT_INDEX_URL.to_string())
        );
        assert_eq!(settings.category, "Casks/font/");
        assert_eq!(settings.history_prefix, "invalid_brew_fonts_list_");
        assert_eq!(settings.brew, "brew");
        assert!(settings.timeout.is_none());
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&Overrides {
            dir: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        })
        .unwrap();
        assert_eq!(settings.work_dir, dir.path());
        assert_eq!(settings.token_prefix, DEFAULT_TOKEN_PREFIX);
    }

    #[test]
    fn file_values_apply() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "category = \"Casks/q/\"\nindex-file = \"cask.json\"\ntimeout-secs = 90\nmarker = false\n",
        )
        .unwrap();
        let settings = Settings::load(&Overrides {
            dir: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        })
        .unwrap();
        assert_eq!(settings.category, "Casks/q/");
        assert_eq!(
            settings.index,
            IndexLocation::File(dir.path().join("cask.json"))
        );
        assert_eq!(settings.timeout, Some(Duration::from_secs(90)));
        assert!(settings.marker_dir.is_none());
    }

    #[test]
    fn overrides_win_over_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "brew = \"/opt/homebrew/bin/brew\"\ntimeout-secs = 90\n",
        )
        .unwrap();
        let settings = Settings::load(&Overrides {
            dir: Some(dir.path().to_path_buf()),
            brew: Some("fake-brew".to_string()),
            timeout_secs: Some(0),
            ..Overrides::default()
        })
        .unwrap();
        assert_eq!(settings.brew, "fake-brew");
        assert!(settings.timeout.is_none(), "zero disables the limit");
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(&Overrides {
            dir: Some(dir.path().to_path_buf()),
            config: Some(dir.path().join("nope.toml")),
            ..Overrides::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn unknown_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "retries = 3\n").unwrap();
        let err = Settings::load(&Overrides {
            dir: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSyntax { .. }));
    }

    #[test]
    fn index_location_display() {
        assert_eq!(
            IndexLocation::Url("https://x.test/c.json".to_string()).to_string(),
            "https://x.test/c.json"
        );
        assert_eq!(
            IndexLocation::File(PathBuf::from("c.json")).to_string(),
            "c.json"
        );
    }
}
