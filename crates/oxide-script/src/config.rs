//! Runner configuration.

use std::fs;
use std::path::{Path, PathBuf};

use oxide_script_core::DEFAULT_EXCLUDED_PREFIXES;
use serde::{Deserialize, Serialize};

use crate::archive::ArchiveMode;
use crate::connection::DEFAULT_RECONNECT_ATTEMPTS;
use crate::error::{Result, ScriptError};

/// Default number of retry rounds over archived failures.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default directory archive batches are written under.
pub const DEFAULT_ARCHIVE_ROOT: &str = "fails";

/// How script text is divided into statements.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SplitMode {
    /// Lexical scan that respects quotes and comments.
    #[default]
    Scan,
    /// Cut on every occurrence of a delimiter.
    Delimiter {
        /// The delimiter character.
        delimiter: char,
    },
}

/// Configuration for a [`ScriptRunner`](crate::runner::ScriptRunner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Statements starting with any of these are not executed.
    pub excluded_prefixes: Vec<String>,
    /// Maximum retry rounds over archived failures.
    pub max_attempts: u32,
    /// Maximum attempts per connection call, reconnects included.
    pub reconnect_attempts: u32,
    /// Directory archive batches are written under.
    pub archive_root: PathBuf,
    /// Archive failures and retry them. When off, failures are only reported.
    pub archive_failures: bool,
    /// How archive files are written.
    pub archive_mode: ArchiveMode,
    /// Apply `excluded_prefixes` again to re-split statements in retry rounds.
    pub reapply_filter_on_retry: bool,
    /// How script text is split.
    pub split_mode: SplitMode,
    /// Substrings removed from every statement before execution.
    pub strip_patterns: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            excluded_prefixes: DEFAULT_EXCLUDED_PREFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            reconnect_attempts: DEFAULT_RECONNECT_ATTEMPTS,
            archive_root: PathBuf::from(DEFAULT_ARCHIVE_ROOT),
            archive_failures: true,
            archive_mode: ArchiveMode::default(),
            reapply_filter_on_retry: false,
            split_mode: SplitMode::default(),
            strip_patterns: Vec::new(),
        }
    }
}

impl RunnerConfig {
    /// Loads and validates a JSON configuration file.
    ///
    /// Missing keys take their default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for values that cannot work.
    pub fn validate(&self) -> Result<()> {
        if self.reconnect_attempts == 0 {
            return Err(ScriptError::InvalidConfig(
                "reconnect_attempts must be at least 1".into(),
            ));
        }
        if self.excluded_prefixes.iter().any(String::is_empty) {
            return Err(ScriptError::InvalidConfig(
                "excluded_prefixes must not contain an empty prefix".into(),
            ));
        }
        if self.strip_patterns.iter().any(String::is_empty) {
            return Err(ScriptError::InvalidConfig(
                "strip_patterns must not contain an empty pattern".into(),
            ));
        }
        if self.archive_failures && self.archive_root.as_os_str().is_empty() {
            return Err(ScriptError::InvalidConfig(
                "archive_root must be set when archiving failures".into(),
            ));
        }
        if let SplitMode::Delimiter { delimiter } = self.split_mode {
            if delimiter.is_whitespace() {
                return Err(ScriptError::InvalidConfig(
                    "split delimiter must not be whitespace".into(),
                ));
            }
        }
        Ok(())
    }
}
