//! Placeholder file creation.
//!
//! Every created file holds the two bytes `{}` and is named
//! `fba_<u128>_<u128>.json`. Failures are returned as [`FileOutcome::Failed`]
//! values rather than errors so a single bad directory never stops a worker.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Content written to every placeholder file: an empty JSON object.
pub const PLACEHOLDER: &[u8] = b"{}";

const PREFIX: &str = "fba_";
const EXTENSION: &str = ".json";

/// Result of a single file-creation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Created {
        file_name: String,
        #[serde(with = "crate::wire::path")]
        directory: PathBuf,
    },
    Failed {
        #[serde(with = "crate::wire::path")]
        directory: PathBuf,
        error: String,
    },
}

impl FileOutcome {
    pub fn is_created(&self) -> bool {
        matches!(self, FileOutcome::Created { .. })
    }

    pub fn directory(&self) -> &Path {
        match self {
            FileOutcome::Created { directory, .. } | FileOutcome::Failed { directory, .. } => {
                directory
            }
        }
    }
}

impl fmt::Display for FileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileOutcome::Created {
                file_name,
                directory,
            } => write!(f, "File {} created in {}", file_name, directory.display()),
            FileOutcome::Failed { directory, error } => {
                write!(f, "Error creating file in {}: {}", directory.display(), error)
            }
        }
    }
}

/// Builds a placeholder file name from two random 128-bit values.
pub fn placeholder_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    let first: u128 = rng.random();
    let second: u128 = rng.random();
    format!("{PREFIX}{first}_{second}{EXTENSION}")
}

/// Returns true if `name` has the shape produced by [`placeholder_name`].
#[cfg(test)]
pub(crate) fn is_placeholder_name(name: &str) -> bool {
    let Some(body) = name
        .strip_prefix(PREFIX)
        .and_then(|rest| rest.strip_suffix(EXTENSION))
    else {
        return false;
    };
    let Some((first, second)) = body.split_once('_') else {
        return false;
    };
    let is_number = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    is_number(first) && is_number(second)
}

/// Creates one placeholder file in `directory`.
pub fn create_placeholder(directory: &Path) -> FileOutcome {
    let file_name = placeholder_name(&mut rand::rng());
    match write_placeholder(&directory.join(&file_name)) {
        Ok(()) => FileOutcome::Created {
            file_name,
            directory: directory.to_path_buf(),
        },
        Err(e) => FileOutcome::Failed {
            directory: directory.to_path_buf(),
            error: e.to_string(),
        },
    }
}

fn write_placeholder(path: &Path) -> io::Result<()> {
    // create_new: an existing file with the same name is left untouched.
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    if let Err(e) = file.write_all(PLACEHOLDER) {
        drop(file);
        let _ = fs::remove_file(path);
        return Err(e);
    }
    Ok(())
}
