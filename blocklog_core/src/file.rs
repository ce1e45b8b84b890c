//! Append-mode file sink.
//!
//! Each write takes an exclusive advisory lock so that several processes
//! appending to the same log file never interleave partial lines.

use crate::Result;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// File-backed writer for one log channel
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    file: File,
}

impl FileSink {
    /// Open `path` for appending, creating it and its parent directory
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        tracing::debug!("Opened log file {:?}", path);
        Ok(Self { path, file })
    }

    /// Resolved absolute path of the file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.lock_exclusive()?;
        let written = self.file.write_all(buf);
        // Lock is released even if the write failed
        self.file.unlock()?;
        written.map(|_| buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
