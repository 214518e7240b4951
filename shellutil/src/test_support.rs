//! Test-only helpers: scratch directories seeded with sample data.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

/// Comma-separated rows used by the sort and tar tests.
pub const SAMPLE_ROWS: &str = "1,1,2,1,1\n2,3,1,4,5\n4,2,3,2,3\n4,2,2,2,3\n";

/// `SAMPLE_ROWS` sorted by `-f -b -i -t, -k4,4 -k1,3`.
pub const SORTED_ROWS: &str = "1,1,2,1,1\n4,2,2,2,3\n4,2,3,2,3\n2,3,1,4,5\n";

/// Relative paths created by [`Scratch::with_tar_inputs`].
pub const TAR_INPUTS: [&str; 3] = ["file1.txt", "test2/file2.txt", "test3/file3.txt"];

/// Temporary directory removed on drop.
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create tempdir")?;
        Ok(Self { dir })
    }

    /// Scratch dir containing `TAR_INPUTS`, each holding `SAMPLE_ROWS`.
    pub fn with_tar_inputs() -> Result<Self> {
        let scratch = Self::new()?;
        for rel in TAR_INPUTS {
            scratch.write(rel, SAMPLE_ROWS)?;
        }
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` to `rel`, creating parent directories.
    pub fn write(&self, rel: impl AsRef<Path>, contents: &str) -> Result<PathBuf> {
        let path = self.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))?;
        Ok(path)
    }

    pub fn read(&self, rel: impl AsRef<Path>) -> Result<String> {
        let path = self.join(rel);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }
}
