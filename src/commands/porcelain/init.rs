use crate::areas::repository::Repository;
use anyhow::Context;
use std::io::Write;
use std::path::Path;

/// Create an empty repository at `path`, creating the directory itself if
/// needed. Re-running on an existing repository is harmless.
pub fn init(path: &Path, writer: Box<dyn Write>) -> anyhow::Result<Repository> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Unable to create directory {}", path.display()))?;

    let repository = Repository::new(path, writer)?;
    repository.init()?;

    Ok(repository)
}
