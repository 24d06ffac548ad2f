use crate::artifacts::index::index_entry::EntryMetadata;
use crate::errors::GitError;
use anyhow::Context;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IGNORED_PATHS: [&str; 3] = [".git", ".", ".."];

/// Working directory file system operations, all addressed by paths
/// relative to the worktree root.
#[derive(Debug)]
pub struct Workspace {
    path: Box<Path>,
}

impl Workspace {
    pub fn new(path: Box<Path>) -> Self {
        Workspace { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Turn a user-supplied path (absolute or worktree-relative) into a
    /// worktree-relative one, rejecting paths that escape the worktree.
    pub fn relativize(&self, path: &Path) -> anyhow::Result<PathBuf> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.path.join(path)
        };

        // normalize lexically so "a/../../etc" cannot sneak out
        let mut normalized = PathBuf::new();
        for component in absolute.components() {
            match component {
                std::path::Component::CurDir => {}
                std::path::Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(GitError::PathOutsideWorktree(path.to_path_buf()).into());
                    }
                }
                other => normalized.push(other),
            }
        }

        normalized
            .strip_prefix(self.path.as_ref())
            .map(Path::to_path_buf)
            .map_err(|_| GitError::PathOutsideWorktree(path.to_path_buf()).into())
    }

    pub fn read_file(&self, path: &Path) -> anyhow::Result<Bytes> {
        let file_path = self.path.join(path);
        let data = std::fs::read(&file_path)
            .with_context(|| format!("Unable to read file {}", file_path.display()))?;

        Ok(Bytes::from(data))
    }

    /// Capture the stat metadata recorded in index entries.
    pub fn stat_file(&self, path: &Path) -> anyhow::Result<EntryMetadata> {
        let file_path = self.path.join(path);
        let metadata = std::fs::symlink_metadata(&file_path)
            .with_context(|| format!("Unable to stat file {}", file_path.display()))?;

        Ok(EntryMetadata::from_fs(&file_path, &metadata))
    }

    pub fn write_file(&self, path: &Path, data: &[u8]) -> anyhow::Result<()> {
        let file_path = self.path.join(path);
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Unable to create directory {}", parent.display()))?;
        }

        std::fs::write(&file_path, data)
            .with_context(|| format!("Unable to write file {}", file_path.display()))
    }

    pub fn remove_file(&self, path: &Path) -> anyhow::Result<()> {
        let file_path = self.path.join(path);
        std::fs::remove_file(&file_path)
            .with_context(|| format!("Unable to remove file {}", file_path.display()))
    }

    /// List tracked-candidate files under `root` (worktree-relative),
    /// skipping the metadata directory. A file path lists as itself.
    pub fn list_files(&self, root: Option<&Path>) -> anyhow::Result<Vec<PathBuf>> {
        let root_path = match root {
            Some(p) => self.path.join(p),
            None => self.path.to_path_buf(),
        };

        if !root_path.exists() {
            anyhow::bail!("The specified path does not exist: {:?}", root_path);
        }

        if root_path.is_dir() {
            Ok(WalkDir::new(&root_path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.path().is_file())
                .filter_map(|entry| {
                    let relative = entry.path().strip_prefix(self.path.as_ref()).ok()?;
                    if Self::is_ignored(relative) {
                        None
                    } else {
                        Some(relative.to_path_buf())
                    }
                })
                .collect::<Vec<_>>())
        } else {
            Ok(vec![root_path
                .strip_prefix(self.path.as_ref())
                .map(PathBuf::from)
                .unwrap_or_default()])
        }
    }

    fn is_ignored(path: &Path) -> bool {
        path.components().any(|component| {
            if let std::path::Component::Normal(name) = component {
                IGNORED_PATHS.contains(&name.to_string_lossy().as_ref())
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn relativize_accepts_paths_under_the_worktree() {
        let workspace = Workspace::new(PathBuf::from("/repo").into_boxed_path());
        assert_eq!(
            workspace.relativize(Path::new("src/lib.rs")).unwrap(),
            PathBuf::from("src/lib.rs")
        );
        assert_eq!(
            workspace.relativize(Path::new("/repo/a/b.txt")).unwrap(),
            PathBuf::from("a/b.txt")
        );
    }

    #[test]
    fn relativize_rejects_escaping_paths() {
        let workspace = Workspace::new(PathBuf::from("/repo").into_boxed_path());

        for path in ["/etc/passwd", "../outside.txt", "a/../../outside.txt"] {
            let err = workspace.relativize(Path::new(path)).unwrap_err();
            assert!(
                matches!(
                    err.downcast_ref::<GitError>(),
                    Some(GitError::PathOutsideWorktree(_))
                ),
                "path {:?}",
                path
            );
        }
    }
}
