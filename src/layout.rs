use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Cache directory layout shared by the mirror and merge flows.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Mirrored trees live here, one subdirectory per host.
    pub fn downloads_dir(&self) -> PathBuf {
        self.root.join("downloads")
    }

    /// Merged single-file documents live here.
    pub fn merged_dir(&self) -> PathBuf {
        self.root.join("merged")
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [self.downloads_dir(), self.merged_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
