use std::fs;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};

/// Writes mirrored files under a fixed root directory. Every write target
/// must stay inside the root; a path with `..` or absolute components is
/// refused outright.
#[derive(Debug, Clone)]
pub struct SiteStore {
    root: PathBuf,
}

impl SiteStore {
    pub fn new(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)
            .with_context(|| format!("failed to create mirror root {}", root.display()))?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save content at a tree-relative path, creating parent directories as
    /// needed. Saving to an existing path overwrites it.
    pub fn save(&self, relative: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf> {
        let relative = Path::new(relative);
        for component in relative.components() {
            match component {
                Component::Normal(_) => {}
                _ => bail!(
                    "refusing to write outside the mirror root: {}",
                    relative.display()
                ),
            }
        }
        Ok(self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn saves_nested_paths() {
        let dir = tempdir().unwrap();
        let store = SiteStore::new(dir.path()).unwrap();

        let path = store.save("assets/css/style.css", b"body{}").unwrap();
        assert!(path.exists());
        assert_eq!(fs::read(&path).unwrap(), b"body{}");
        assert!(path.starts_with(dir.path()));
    }

    #[test]
    fn overwrites_are_idempotent() {
        let dir = tempdir().unwrap();
        let store = SiteStore::new(dir.path()).unwrap();

        store.save("index.html", b"first").unwrap();
        let path = store.save("index.html", b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn rejects_escaping_paths() {
        let dir = tempdir().unwrap();
        let store = SiteStore::new(dir.path()).unwrap();

        assert!(store.save("../escape.html", b"x").is_err());
        assert!(store.save("a/../../escape.html", b"x").is_err());
        assert!(store.save("/absolute.html", b"x").is_err());
    }
}
