//! Atomic whole-file replacement
//!
//! Writers stage the new content in a temp file next to the target and
//! rename it into place, so readers see either the old or the new file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Backing store for the usage file
pub trait AtomicFile: Send + Sync {
    /// Read the whole file, `None` if it does not exist
    fn read(&self) -> io::Result<Option<String>>;

    /// Replace the whole file with `contents`
    fn write(&self, contents: &str) -> io::Result<()>;

    /// Human-readable location for logs
    fn describe(&self) -> String;
}

/// `AtomicFile` on the local filesystem
#[derive(Debug, Clone)]
pub struct FsAtomicFile {
    path: PathBuf,
}

impl FsAtomicFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AtomicFile for FsAtomicFile {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, contents: &str) -> io::Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        // Dropping the temp file on error removes it; the target is untouched.
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
