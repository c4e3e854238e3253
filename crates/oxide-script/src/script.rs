//! Raw script sources.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, ScriptError};

/// Where a script's text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptOrigin {
    /// Loaded from a file.
    File(PathBuf),
    /// Supplied directly as a string.
    Inline,
}

/// An immutable script blob plus the label used for diagnostics and archive
/// directory names.
#[derive(Debug, Clone)]
pub struct RawScript {
    label: String,
    origin: ScriptOrigin,
    text: String,
}

impl RawScript {
    /// Loads a UTF-8 script from disk. The label is the file stem.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ScriptError::ScriptRead {
            path: path.to_path_buf(),
            source,
        })?;
        let label = path
            .file_stem()
            .map_or_else(|| "script".to_string(), |s| s.to_string_lossy().into_owned());

        Ok(Self {
            label,
            origin: ScriptOrigin::File(path.to_path_buf()),
            text,
        })
    }

    /// Wraps an in-memory script.
    #[must_use]
    pub fn from_text(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            origin: ScriptOrigin::Inline,
            text: text.into(),
        }
    }

    /// Returns the label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns where the script came from.
    #[must_use]
    pub fn origin(&self) -> &ScriptOrigin {
        &self.origin
    }

    /// Returns the script text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }
}
