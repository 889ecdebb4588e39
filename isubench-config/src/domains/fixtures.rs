//! Dump file locations

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// JSON dump files loaded into the registries during preparation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FixturesConfig {
    pub users: PathBuf,
    pub posts: PathBuf,
    pub comments: PathBuf,
}

impl FixturesConfig {
    /// Point all dump files at `users.json`, `posts.json` and `comments.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            users: dir.join("users.json"),
            posts: dir.join("posts.json"),
            comments: dir.join("comments.json"),
        }
    }
}

impl Default for FixturesConfig {
    fn default() -> Self {
        Self::in_dir("./dump")
    }
}

impl Validatable for FixturesConfig {
    fn validate(&self) -> ConfigResult<()> {
        for (name, path) in [
            ("users", &self.users),
            ("posts", &self.posts),
            ("comments", &self.comments),
        ] {
            if path.as_os_str().is_empty() {
                return Err(self.validation_error(format!("{} path cannot be empty", name)));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "fixtures"
    }
}
