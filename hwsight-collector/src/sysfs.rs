//! File access layer for sysfs/procfs reads.
//!
//! Collectors address files by their absolute host path (`/proc/cpuinfo`,
//! `/sys/class/hwmon/hwmon0/name`). [`HostFs`] can re-root those paths under
//! another directory, which is how containers that bind-mount the host's
//! `/sys` and `/proc` elsewhere are supported.

use std::io;
use std::path::{Path, PathBuf};

/// Read-only file access used by the collectors.
pub trait FileSystem {
    /// Read the whole file as bytes.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Check whether a file exists.
    fn exists(&self, path: &Path) -> bool;

    /// Read a file and return its contents as trimmed text.
    fn read_trimmed(&self, path: &Path) -> io::Result<String> {
        let bytes = self.read(path)?;
        Ok(String::from_utf8_lossy(&bytes).trim().to_string())
    }
}

/// [`FileSystem`] backed by the real host filesystem.
#[derive(Debug, Clone)]
pub struct HostFs {
    root: PathBuf,
}

impl HostFs {
    /// Access files at their real locations.
    pub fn new() -> Self {
        Self {
            root: PathBuf::from("/"),
        }
    }

    /// Resolve every absolute path under `root` instead of `/`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory absolute paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match path.strip_prefix("/") {
            Ok(relative) => self.root.join(relative),
            Err(_) => self.root.join(path),
        }
    }
}

impl Default for HostFs {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystem for HostFs {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(self.resolve(path))
    }

    fn exists(&self, path: &Path) -> bool {
        self.resolve(path).exists()
    }
}
