use crate::areas::config::Config;
use crate::areas::database::Database;
use crate::areas::index::Index;
use crate::areas::refs::Refs;
use crate::areas::workspace::Workspace;
use crate::errors::GitError;
use anyhow::Context;
use std::cell::{RefCell, RefMut};
use std::io::Write;
use std::path::Path;

pub const GIT_DIR: &str = ".git";
pub const DEFAULT_BRANCH: &str = "master";

/// A repository: the worktree plus the metadata directory, with handles
/// to the object database, staging index, refs and workspace.
pub struct Repository {
    worktree: Box<Path>,
    git_dir: Box<Path>,
    database: Database,
    refs: Refs,
    workspace: Workspace,
    index: RefCell<Index>,
    writer: RefCell<Box<dyn Write>>,
}

impl Repository {
    /// Open the repository whose worktree is `worktree`, without checking
    /// that its metadata directory exists yet.
    pub fn new(worktree: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let worktree: Box<Path> = worktree.to_path_buf().into_boxed_path();
        let git_dir: Box<Path> = worktree.join(GIT_DIR).into_boxed_path();

        let database = Database::new(git_dir.join("objects").into_boxed_path());
        let refs = Refs::new(git_dir.clone());
        let workspace = Workspace::new(worktree.clone());
        let index = RefCell::new(Index::read(git_dir.join("index").into_boxed_path())?);

        Ok(Repository {
            worktree,
            git_dir,
            database,
            refs,
            workspace,
            index,
            writer: RefCell::new(writer),
        })
    }

    /// Walk upward from `start` until a directory containing `.git` is
    /// found and open it.
    pub fn locate(start: &Path, writer: Box<dyn Write>) -> anyhow::Result<Self> {
        let start = start
            .canonicalize()
            .with_context(|| format!("Unable to resolve {}", start.display()))?;

        let mut current: &Path = &start;
        loop {
            if current.join(GIT_DIR).is_dir() {
                return Self::new(current, writer);
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => {
                    return Err(GitError::NotFound(format!(
                        "no git repository in {} or any parent",
                        start.display()
                    ))
                    .into());
                }
            }
        }
    }

    /// Create the metadata directory skeleton: object store, ref
    /// directories, a HEAD pointing at the default branch, the default
    /// config and the exclude file.
    pub fn init(&self) -> anyhow::Result<()> {
        for dir in [
            self.git_dir.to_path_buf(),
            self.database.path().to_path_buf(),
            self.refs.heads_path(),
            self.refs.tags_path(),
            self.git_dir.join("branches"),
            self.git_dir.join("info"),
        ] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Unable to create directory {}", dir.display()))?;
        }

        let head_path = self.git_dir.join("HEAD");
        if !head_path.exists() {
            self.refs.set_head_to_branch(DEFAULT_BRANCH)?;
        }

        let config_path = self.git_dir.join("config");
        if !config_path.exists() {
            Config::write_default(&config_path)?;
        }

        let exclude_path = self.git_dir.join("info").join("exclude");
        if !exclude_path.exists() {
            std::fs::write(&exclude_path, "# Patterns to exclude, one per line.\n")
                .with_context(|| format!("Unable to write {}", exclude_path.display()))?;
        }

        writeln!(
            self.writer.borrow_mut(),
            "Initialized empty Git repository in {}",
            self.git_dir.display()
        )?;

        Ok(())
    }

    /// Merged configuration: user-level files first, the repository's own
    /// `config` last.
    pub fn config(&self) -> anyhow::Result<Config> {
        let mut paths = Config::user_paths();
        paths.push(self.git_dir.join("config"));
        Config::load(&paths)
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn refs(&self) -> &Refs {
        &self.refs
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn index(&self) -> RefMut<'_, Index> {
        self.index.borrow_mut()
    }

    pub fn writer(&self) -> RefMut<'_, Box<dyn Write>> {
        self.writer.borrow_mut()
    }
}
