use anyhow::Context;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// INI-style configuration, merged from the user-level files and the
/// repository's own `config`. Later files win on conflicting keys.
#[derive(Debug, Default)]
pub struct Config {
    values: HashMap<String, String>,
}

impl Config {
    /// Load and merge the configuration files that exist among `paths`,
    /// in order.
    pub fn load(paths: &[PathBuf]) -> anyhow::Result<Self> {
        let mut config = Config::default();

        for path in paths {
            let content = match std::fs::read_to_string(path) {
                Ok(content) => content,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("Unable to read config {}", path.display()));
                }
            };

            config.merge(&content);
        }

        Ok(config)
    }

    /// The user-level configuration paths, in precedence order (lowest
    /// first): `$XDG_CONFIG_HOME/git/config` (or `~/.config/git/config`),
    /// then `~/.gitconfig`.
    pub fn user_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        let xdg_base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")));
        if let Some(base) = xdg_base {
            paths.push(base.join("git").join("config"));
        }

        if let Some(home) = std::env::var_os("HOME") {
            paths.push(PathBuf::from(home).join(".gitconfig"));
        }

        paths
    }

    fn merge(&mut self, content: &str) {
        let mut section = String::new();

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                section = name.trim().to_ascii_lowercase();
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = format!("{}.{}", section, key.trim().to_ascii_lowercase());
                self.values.insert(key, value.trim().to_string());
            }
        }
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.values
            .get(&format!("{}.{}", section, key))
            .map(String::as_str)
    }

    /// Resolve the committer identity. `GIT_AUTHOR_NAME`/`GIT_AUTHOR_EMAIL`
    /// override the `user` section.
    pub fn user_identity(&self) -> anyhow::Result<(String, String)> {
        let name = std::env::var("GIT_AUTHOR_NAME")
            .ok()
            .or_else(|| self.get("user", "name").map(str::to_string))
            .context("user name not configured; set user.name or GIT_AUTHOR_NAME")?;
        let email = std::env::var("GIT_AUTHOR_EMAIL")
            .ok()
            .or_else(|| self.get("user", "email").map(str::to_string))
            .context("user email not configured; set user.email or GIT_AUTHOR_EMAIL")?;

        Ok((name, email))
    }

    /// The default content of a fresh repository's `config` file.
    pub fn write_default(path: &Path) -> anyhow::Result<()> {
        let content = "[core]\n\
                       \trepositoryformatversion = 0\n\
                       \tfilemode = true\n\
                       \tbare = false\n";
        std::fs::write(path, content)
            .with_context(|| format!("Unable to write config {}", path.display()))
    }
}
