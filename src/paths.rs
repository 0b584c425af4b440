//! XDG-compliant path resolution for taskwise.
//!
//! Configuration lives in `$XDG_CONFIG_HOME/taskwise/config.toml`, the
//! workspace (contexts, tasks, categories, snapshots) in
//! `$XDG_DATA_HOME/taskwise/workspace.json`.

use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

/// Errors from path resolution.
#[derive(Debug, Error, Diagnostic)]
pub enum PathError {
    #[error("cannot determine home directory")]
    #[diagnostic(
        code(taskwise::paths::no_home),
        help("Set the HOME environment variable, or pass --config and --data-dir explicitly.")
    )]
    NoHome,

    #[error("failed to create directory: {path}")]
    #[diagnostic(
        code(taskwise::paths::create_dir),
        help("Check that the parent directory exists and you have write permissions.")
    )]
    CreateDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type PathResult<T> = std::result::Result<T, PathError>;

/// Directories used by the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskwisePaths {
    /// `$XDG_CONFIG_HOME/taskwise/`
    pub config_dir: PathBuf,
    /// `$XDG_DATA_HOME/taskwise/`
    pub data_dir: PathBuf,
}

impl TaskwisePaths {
    /// Resolve from the process environment.
    pub fn resolve() -> PathResult<Self> {
        Self::resolve_from(|key| std::env::var(key).ok())
    }

    /// Resolve from `lookup`, with the standard XDG fallbacks under `HOME`.
    pub fn resolve_from<F>(lookup: F) -> PathResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        let home = var("HOME");

        let config_root = match (var("XDG_CONFIG_HOME"), &home) {
            (Some(dir), _) => dir,
            (None, Some(home)) => home.join(".config"),
            (None, None) => return Err(PathError::NoHome),
        };
        let data_root = match (var("XDG_DATA_HOME"), &home) {
            (Some(dir), _) => dir,
            (None, Some(home)) => home.join(".local/share"),
            (None, None) => return Err(PathError::NoHome),
        };

        Ok(Self {
            config_dir: config_root.join("taskwise"),
            data_dir: data_root.join("taskwise"),
        })
    }

    /// Both directories rooted at one place; used for `--data-dir` style overrides.
    pub fn rooted(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            data_dir: root.join("data"),
        }
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }

    pub fn workspace_file(&self) -> PathBuf {
        self.data_dir.join("workspace.json")
    }

    /// Create both directories. Idempotent.
    pub fn ensure_dirs(&self) -> PathResult<()> {
        for dir in [&self.config_dir, &self.data_dir] {
            std::fs::create_dir_all(dir).map_err(|e| PathError::CreateDir {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}
