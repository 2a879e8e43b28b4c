use std::fs::{self, Metadata};
use std::io;
use std::path::Path;
#[cfg(any(target_os = "macos", windows))]
use std::process::Command;

/// Filesystem calls made by guarded operations.
///
/// Every method defaults to `std::fs`; substitutes override only what they
/// need to fake (for example a rename that always crosses devices).
pub trait Filesystem: Send + Sync {
    fn symlink_metadata(&self, path: &Path) -> io::Result<Metadata> {
        fs::symlink_metadata(path)
    }

    fn metadata(&self, path: &Path) -> io::Result<Metadata> {
        fs::metadata(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    /// Moves `path` to the platform recycle bin.
    fn trash(&self, path: &Path) -> io::Result<()> {
        trash::delete(path).map_err(io::Error::other)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFilesystem;

impl Filesystem for StdFilesystem {}

pub fn is_filesystem_root(path: &Path) -> bool {
    path.has_root() && path.parent().is_none()
}

pub fn is_cross_device(error: &io::Error) -> bool {
    if error.kind() == io::ErrorKind::CrossesDevices {
        return true;
    }

    #[cfg(unix)]
    {
        if error.raw_os_error() == Some(libc::EXDEV) {
            return true;
        }
    }

    false
}

/// Shows `path` selected in the platform file manager.
#[cfg(target_os = "macos")]
pub fn reveal_in_file_manager(path: &Path) -> io::Result<()> {
    Command::new("open").arg("-R").arg(path).spawn().map(|_| ())
}

#[cfg(windows)]
pub fn reveal_in_file_manager(path: &Path) -> io::Result<()> {
    let mut select = std::ffi::OsString::from("/select,");
    select.push(path.as_os_str());
    Command::new("explorer").arg(select).spawn().map(|_| ())
}

/// No portable way to select a file here, so the containing directory opens.
#[cfg(not(any(target_os = "macos", windows)))]
pub fn reveal_in_file_manager(path: &Path) -> io::Result<()> {
    open::that(path.parent().unwrap_or(path))
}

/// Opens `path` with its default application.
pub fn open_with_default_app(path: &Path) -> io::Result<()> {
    open::that(path)
}
