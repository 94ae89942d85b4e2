//! core::manifest
//!
//! The persisted list of every repository reference ever discovered.
//!
//! # Format
//!
//! Plain text at `<backup_root>/gh_repos`, one serialized
//! [`RepositoryReference`](crate::core::types::RepositoryReference) per
//! line, each line newline-terminated. No header.
//!
//! # Merge rule
//!
//! Previously persisted lines that were not discovered in this run come
//! first, in their prior relative order. Every discovered line follows, in
//! discovery order. A reference that disappeared upstream is therefore
//! kept, and a reference seen again moves to the discovered block instead
//! of being duplicated.
//!
//! # Example
//!
//! ```
//! use ghbackup::core::manifest::merge;
//!
//! let persisted = vec!["A".to_string(), "B".to_string(), "C".to_string()];
//! let discovered = vec!["B".to_string(), "D".to_string()];
//!
//! assert_eq!(merge(&persisted, &discovered), vec!["A", "C", "B", "D"]);
//! ```

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from manifest operations.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to open manifest '{path}': {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read manifest '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write manifest '{path}': {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Merge discovered references into previously persisted ones.
///
/// Returns the stale persisted lines (those absent from `discovered`, in
/// their original order) followed by `discovered` as given. Duplicates
/// inside `discovered` are kept; the listing API does not return them
/// within one run.
pub fn merge(persisted: &[String], discovered: &[String]) -> Vec<String> {
    let current: HashSet<&str> = discovered.iter().map(String::as_str).collect();

    persisted
        .iter()
        .filter(|line| !current.contains(line.as_str()))
        .chain(discovered.iter())
        .cloned()
        .collect()
}

/// Serialize lines in manifest format: every line newline-terminated.
pub fn render(lines: &[String]) -> String {
    lines.iter().fold(String::new(), |mut out, line| {
        out.push_str(line);
        out.push('\n');
        out
    })
}

/// An open manifest file.
///
/// The file is opened read-write for the lifetime of this value and is
/// rewritten in place by [`Manifest::persist`].
#[derive(Debug)]
pub struct Manifest {
    path: PathBuf,
    file: File,
    lines: Vec<String>,
}

impl Manifest {
    /// Open the manifest at `path`, creating an empty one if absent.
    ///
    /// # Errors
    ///
    /// - [`ManifestError::Open`] if the file cannot be opened read-write
    /// - [`ManifestError::Read`] if its contents cannot be read
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| ManifestError::Open {
                path: path.clone(),
                source,
            })?;

        let lines = BufReader::new(&file)
            .lines()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| ManifestError::Read {
                path: path.clone(),
                source,
            })?;

        Ok(Self { path, file, lines })
    }

    /// Path of the manifest file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines as currently known (persisted or last written).
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Merge `discovered` into the manifest and rewrite the file in place.
    ///
    /// Seeks to the start, writes the merged content and truncates the
    /// file to exactly that length. Returns the merged lines.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Write`] if any step of the rewrite fails.
    pub fn merge_and_persist(
        &mut self,
        discovered: &[String],
    ) -> Result<&[String], ManifestError> {
        let merged = merge(&self.lines, discovered);
        self.persist(merged)?;
        Ok(&self.lines)
    }

    fn persist(&mut self, lines: Vec<String>) -> Result<(), ManifestError> {
        let content = render(&lines);
        let write_err = |source| ManifestError::Write {
            path: self.path.clone(),
            source,
        };

        self.file.seek(SeekFrom::Start(0)).map_err(write_err)?;
        self.file.write_all(content.as_bytes()).map_err(write_err)?;
        self.file.set_len(content.len() as u64).map_err(write_err)?;
        self.file.flush().map_err(write_err)?;

        self.lines = lines;
        Ok(())
    }
}
