use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::model::EntryKind;

#[derive(Debug, Clone)]
pub struct DirEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
}

/// Single-pass listing of one directory.
///
/// Opening or reading the directory can fail at any point (permissions, the
/// directory vanishing mid-scan); the iterator then simply ends.
pub struct Entries {
    dir: PathBuf,
    read_dir: Option<fs::ReadDir>,
}

pub fn enumerate(dir: &Path) -> Entries {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => Some(read_dir),
        Err(error) => {
            debug!("skipping unreadable directory {}: {error}", dir.display());
            None
        }
    };

    Entries {
        dir: dir.to_path_buf(),
        read_dir,
    }
}

impl Iterator for Entries {
    type Item = DirEntryInfo;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.read_dir.as_mut()?.next()? {
            Ok(entry) => entry,
            Err(error) => {
                debug!(
                    "stopped reading directory {}: {error}",
                    self.dir.display()
                );
                self.read_dir = None;
                return None;
            }
        };

        // `DirEntry::file_type` never follows symlinks.
        let kind = match entry.file_type() {
            Ok(file_type) if file_type.is_symlink() => EntryKind::Symlink,
            Ok(file_type) if file_type.is_dir() => EntryKind::Dir,
            Ok(file_type) if file_type.is_file() => EntryKind::File,
            Ok(_) => EntryKind::Other,
            Err(error) => {
                debug!("cannot read type of {}: {error}", entry.path().display());
                EntryKind::Other
            }
        };

        Some(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path(),
            kind,
        })
    }
}
