use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Every directory found below a root.
#[derive(Debug, Default)]
pub struct Enumeration {
    pub directories: Vec<PathBuf>,
    /// Entries that could not be read and were left out of the walk.
    pub skipped: usize,
}

/// Walks `root` and collects all descendant directories, excluding `root`
/// itself.
///
/// Unreadable subtrees are logged and skipped. Symbolic links are not
/// followed, so a link to a directory is neither listed nor descended into.
pub fn enumerate_directories(root: &Path) -> Result<Enumeration> {
    let metadata = fs::metadata(root).map_err(|source| Error::Root {
        path: root.to_path_buf(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(Error::RootNotDirectory(root.to_path_buf()));
    }

    info!(root = %root.display(), "scanning directories");

    let mut found = Enumeration::default();
    for entry in WalkDir::new(root).min_depth(1) {
        match entry {
            Ok(entry) if entry.file_type().is_dir() => found.directories.push(entry.into_path()),
            Ok(_) => {}
            Err(e) => {
                found.skipped += 1;
                warn!(path = ?e.path(), "skipping unreadable entry: {e}");
            }
        }
    }

    info!(
        directories = found.directories.len(),
        skipped = found.skipped,
        "scan complete"
    );
    Ok(found)
}
