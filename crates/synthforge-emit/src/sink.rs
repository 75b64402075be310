//! Output targets for generated artifacts.
//!
//! Paths are relative to the output base path.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use synthforge_core::{CompileError, Result};

/// Filesystem abstraction used by the emitter.
pub trait ArtifactSink {
    /// Create `dir` and its parents; succeeds if it already exists.
    fn ensure_dir(&mut self, dir: &Path) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn read(&self, path: &Path) -> Result<String>;

    /// Replace the contents of `path`.
    fn write(&mut self, path: &Path, contents: &str) -> Result<()>;
}

/// Writes under a root directory; file writes are atomic.
#[derive(Debug, Clone)]
pub struct DiskSink {
    root: PathBuf,
}

impl DiskSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ArtifactSink for DiskSink {
    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        create_dir_all(self.root.join(dir))?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.root.join(path).exists()
    }

    fn read(&self, path: &Path) -> Result<String> {
        Ok(fs::read_to_string(self.root.join(path))?)
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        write_bytes_atomic(&self.root.join(path), contents.as_bytes())
    }
}

/// Write through a sibling temp file and rename it into place.
pub fn write_bytes_atomic(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|parent| !parent.as_os_str().is_empty());
    if let Some(parent) = parent {
        create_dir_all(parent)?;
    }

    let tmp_path = temp_path(path)?;
    let mut file = OpenOptions::new()
        .create(true)
        .truncate(true)
        .write(true)
        .open(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;

    fs::rename(&tmp_path, path)?;
    if let Some(parent) = parent {
        sync_dir(parent)?;
    }
    Ok(())
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        CompileError::Config(format!("invalid artifact path '{}'", path.display()))
    })?;
    let tmp_name = format!("{}.tmp", file_name.to_string_lossy());
    Ok(path.with_file_name(tmp_name))
}

#[cfg(unix)]
fn sync_dir(path: &Path) -> io::Result<()> {
    let dir = OpenOptions::new().read(true).open(path)?;
    dir.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}

/// In-memory sink.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &BTreeMap<PathBuf, String> {
        &self.files
    }

    pub fn dirs(&self) -> &BTreeSet<PathBuf> {
        &self.dirs
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.files.get(path.as_ref()).map(String::as_str)
    }
}

impl ArtifactSink for MemorySink {
    fn ensure_dir(&mut self, dir: &Path) -> Result<()> {
        let mut current = PathBuf::new();
        for component in dir.components() {
            current.push(component);
            self.dirs.insert(current.clone());
        }
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.dirs.contains(path)
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            CompileError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no artifact at '{}'", path.display()),
            ))
        })
    }

    fn write(&mut self, path: &Path, contents: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }
        self.files.insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
