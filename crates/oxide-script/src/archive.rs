//! Archiving of failed statements.
//!
//! Each archive batch is a directory `<root>/<label>_<timestamp>/` holding one
//! `<ordinal>.sql` file per failed statement, with the statement text written
//! verbatim.

use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use oxide_script_core::Statement;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, ScriptError};

/// Timestamp format used in batch directory names.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Extension of archived statement files.
pub const STATEMENT_EXTENSION: &str = "sql";

/// How statement files are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveMode {
    /// Fan out over a worker pool sized to the available cores.
    #[default]
    Parallel,
    /// Write one file after another on the calling thread.
    Sequential,
}

/// One archived statement file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchivedStatement {
    /// Position in the batch.
    pub ordinal: usize,
    /// Path of the `.sql` file.
    pub path: PathBuf,
}

/// An on-disk snapshot of one round's failed statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBatch {
    directory: PathBuf,
    entries: Vec<ArchivedStatement>,
}

impl ArchiveBatch {
    /// Opens an existing batch directory.
    ///
    /// Only files named `<n>.sql` are part of the batch. They are ordered by
    /// `n` numerically, so `10.sql` comes after `9.sql`.
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        if !directory.is_dir() {
            return Err(ScriptError::InvalidArchive(directory));
        }

        let read_dir = fs::read_dir(&directory).map_err(|source| ScriptError::Archive {
            path: directory.clone(),
            source,
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(|source| ScriptError::Archive {
                path: directory.clone(),
                source,
            })?;
            let path = entry.path();
            if let Some(ordinal) = statement_ordinal(&path) {
                entries.push(ArchivedStatement { ordinal, path });
            }
        }
        entries.sort_by_key(|e| e.ordinal);

        Ok(Self { directory, entries })
    }

    /// Returns the batch directory.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns the number of archived statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the batch holds no statements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Reads every archived statement back, in ordinal order.
    pub fn read_statements(&self) -> Result<Vec<String>> {
        self.entries
            .iter()
            .map(|entry| {
                fs::read_to_string(&entry.path).map_err(|source| ScriptError::Archive {
                    path: entry.path.clone(),
                    source,
                })
            })
            .collect()
    }
}

/// Returns `n` for a file named `<n>.sql`.
fn statement_ordinal(path: &Path) -> Option<usize> {
    if !path.is_file() || path.extension()? != STATEMENT_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

/// Writes failed statements to archive batches under a root directory.
#[derive(Debug, Clone)]
pub struct Archiver {
    root: PathBuf,
    mode: ArchiveMode,
}

impl Archiver {
    /// Creates an archiver writing under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mode: ArchiveMode::default(),
        }
    }

    /// Sets how files are written.
    #[must_use]
    pub fn mode(mut self, mode: ArchiveMode) -> Self {
        self.mode = mode;
        self
    }

    /// Archives `failed` into a new batch named after `label` and the
    /// current local time.
    pub fn archive(&self, failed: &[Statement], label: &str) -> Result<ArchiveBatch> {
        self.archive_at(failed, label, Local::now())
    }

    /// Archives `failed` into a new batch named after `label` and
    /// `timestamp`.
    ///
    /// Any write error aborts the archive; a partially written batch is
    /// reported, never returned.
    pub fn archive_at(
        &self,
        failed: &[Statement],
        label: &str,
        timestamp: DateTime<Local>,
    ) -> Result<ArchiveBatch> {
        let directory = self.create_batch_dir(label, timestamp)?;

        let entries: Vec<ArchivedStatement> = (0..failed.len())
            .map(|ordinal| ArchivedStatement {
                ordinal,
                path: directory.join(format!("{ordinal}.{STATEMENT_EXTENSION}")),
            })
            .collect();
        let jobs: Vec<(&Path, &str)> = entries
            .iter()
            .zip(failed)
            .map(|(entry, stmt)| (entry.path.as_path(), stmt.text.as_str()))
            .collect();

        match self.mode {
            ArchiveMode::Parallel => write_parallel(&jobs)?,
            ArchiveMode::Sequential => write_sequential(&jobs)?,
        }

        info!(
            statements = entries.len(),
            mode = ?self.mode,
            directory = %directory.display(),
            "Archived failed statements"
        );

        Ok(ArchiveBatch { directory, entries })
    }

    /// Creates a fresh batch directory, appending `-1`, `-2`, ... if the
    /// name is taken.
    fn create_batch_dir(&self, label: &str, timestamp: DateTime<Local>) -> Result<PathBuf> {
        fs::create_dir_all(&self.root).map_err(|source| ScriptError::Archive {
            path: self.root.clone(),
            source,
        })?;

        let base = format!(
            "{}_{}",
            sanitize_label(label),
            timestamp.format(TIMESTAMP_FORMAT)
        );
        let mut suffix = 0u32;
        loop {
            let name = if suffix == 0 {
                base.clone()
            } else {
                format!("{base}-{suffix}")
            };
            let path = self.root.join(name);
            match fs::create_dir(&path) {
                Ok(()) => return Ok(path),
                Err(err) if err.kind() == io::ErrorKind::AlreadyExists => suffix += 1,
                Err(source) => return Err(ScriptError::Archive { path, source }),
            }
        }
    }
}

/// Makes a label safe to use as a directory name component.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    let cleaned: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "script".to_string()
    } else {
        cleaned
    }
}

fn write_one((path, text): &(&Path, &str)) -> Result<()> {
    fs::write(path, text).map_err(|source| ScriptError::Archive {
        path: path.to_path_buf(),
        source,
    })
}

fn write_sequential(jobs: &[(&Path, &str)]) -> Result<()> {
    jobs.iter().try_for_each(write_one)
}

fn write_parallel(jobs: &[(&Path, &str)]) -> Result<()> {
    let workers = std::thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(jobs.len())
        .max(1);

    match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
        Ok(pool) => pool.install(|| jobs.par_iter().try_for_each(write_one)),
        Err(err) => {
            warn!("failed to create archive worker pool ({err}), writing sequentially");
            write_sequential(jobs)
        }
    }
}
