//! # Filesystem Block Enumerator
//!
//! Walks a container directory and collects `*.block` files at any depth.
//!
//! - Paths are the root joined with directory entries; nothing is canonicalized
//! - The root itself may be a symlink to a directory
//! - Directory symlinks are not followed; file symlinks count when they resolve
//!   to a regular file
//! - Any unreadable directory fails the whole enumeration

use crate::domain::errors::EnumerationError;
use crate::domain::reconcile::BLOCK_FILE_EXTENSION;
use crate::ports::outbound::BlockFileEnumerator;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalBlockFileEnumerator;

impl LocalBlockFileEnumerator {
    pub fn new() -> Self {
        Self
    }

    /// Blocking walk of `root`.
    pub fn walk(root: &Path) -> Result<BTreeSet<PathBuf>, EnumerationError> {
        let mut found = BTreeSet::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                EnumerationError::new(&path, e)
            })?;

            if entry.depth() == 0 {
                if !entry.path().is_dir() {
                    return Err(EnumerationError::new(root, "not a directory"));
                }
                continue;
            }

            let file_type = entry.file_type();
            let path = entry.path();
            if is_block_file_name(path)
                && (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
            {
                found.insert(entry.into_path());
            }
        }

        Ok(found)
    }
}

fn is_block_file_name(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == BLOCK_FILE_EXTENSION)
}

#[async_trait]
impl BlockFileEnumerator for LocalBlockFileEnumerator {
    async fn enumerate_block_files(
        &self,
        container_path: &Path,
    ) -> Result<BTreeSet<PathBuf>, EnumerationError> {
        let root = container_path.to_path_buf();
        tokio::task::spawn_blocking(move || Self::walk(&root))
            .await
            .map_err(|e| EnumerationError::new(container_path, format!("walk aborted: {}", e)))?
    }
}
