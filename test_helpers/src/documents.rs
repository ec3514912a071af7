//! Temporary directories populated with datasource documents.
//!
//! # Examples
//!
//! ```
//! use test_helpers::documents::DocumentTree;
//!
//! let tree = DocumentTree::new()?;
//! let path = tree.write("conf/defaults.yaml", "port: 80\n")?;
//! assert!(path.starts_with(tree.root()));
//! # Ok::<_, anyhow::Error>(())
//! ```

use anyhow::{Context, Result, anyhow};
use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

/// A temporary directory with a UTF-8 root, removed on drop.
#[derive(Debug)]
pub struct DocumentTree {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl DocumentTree {
    /// Create an empty tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or its path is
    /// not UTF-8.
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir().context("create document tree")?;
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| anyhow!("temporary path is not UTF-8: {}", p.display()))?;
        Ok(Self { _dir: dir, root })
    }

    /// Absolute root of the tree.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Write `contents` to `relative`, creating parent directories, and
    /// return the absolute path.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory or the file cannot be written.
    pub fn write(&self, relative: &str, contents: &str) -> Result<Utf8PathBuf> {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| format!("create {parent}"))?;
        }
        std::fs::write(&path, contents).with_context(|| format!("write {path}"))?;
        Ok(path)
    }

    /// `file:` URL string for `relative` inside the tree.
    #[must_use]
    pub fn file_url(&self, relative: &str) -> String {
        format!("file://{}", self.root.join(relative))
    }
}
