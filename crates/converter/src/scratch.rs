//! Scratch area for intermediate files
//!
//! One fresh directory per batch run, removed when the area is closed or
//! dropped, whichever comes first.

use std::io;
use std::path::Path;
use tempfile::{Builder, TempDir};

/// Prefix of every scratch directory name.
pub const SCRATCH_PREFIX: &str = "raf2img_";

/// A process-private temporary directory
#[derive(Debug)]
pub struct ScratchArea {
    dir: TempDir,
}

impl ScratchArea {
    /// Create a new scratch directory in the system temp location
    pub fn create() -> io::Result<Self> {
        let dir = Builder::new().prefix(SCRATCH_PREFIX).tempdir()?;
        Ok(Self { dir })
    }

    /// Create a new scratch directory under `parent`
    pub fn create_in(parent: &Path) -> io::Result<Self> {
        let dir = Builder::new().prefix(SCRATCH_PREFIX).tempdir_in(parent)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and everything in it, reporting failures
    pub fn close(self) -> io::Result<()> {
        self.dir.close()
    }
}
