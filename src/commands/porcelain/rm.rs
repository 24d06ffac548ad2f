use crate::areas::repository::Repository;
use std::path::PathBuf;

impl Repository {
    /// Unstage the given paths. With `delete`, also remove them from the
    /// working directory. With `skip_missing`, untracked paths are logged
    /// and skipped instead of failing.
    pub fn rm(&self, paths: &[PathBuf], delete: bool, skip_missing: bool) -> anyhow::Result<()> {
        let mut index = self.index();

        for path in paths {
            let relative = self.workspace().relativize(path)?;

            if !index.is_tracked(&relative) && skip_missing {
                log::info!("skipping untracked path {}", relative.display());
                continue;
            }
            index.remove_path(&relative)?;

            if delete && self.worktree().join(&relative).exists() {
                self.workspace().remove_file(&relative)?;
            }
        }

        index.write()
    }
}
