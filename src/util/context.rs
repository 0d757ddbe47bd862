//! Global context for kernel-matrix operations.
//!
//! Resolves the work directory once and provides the paths derived from it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;

use crate::core::buildset::BuildSetRegistry;
use crate::util::config::{load_config, Config};

/// Name of the per-user and per-workdir configuration directory.
const CONFIG_DIR_NAME: &str = ".kernel-matrix";

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Canonical work directory
    workdir: PathBuf,

    /// Per-user configuration directory (~/.kernel-matrix/), if a home exists
    home: Option<PathBuf>,

    /// Merged global and project configuration
    config: Config,
}

impl GlobalContext {
    /// Create a context for `workdir`, or the current directory if none is given.
    ///
    /// The work directory is canonicalized; it must already exist.
    pub fn new(workdir: Option<&Path>) -> Result<Self> {
        let workdir = match workdir {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().context("failed to get current directory")?,
        };
        let workdir = workdir
            .canonicalize()
            .with_context(|| format!("invalid work directory: {}", workdir.display()))?;

        let home = BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME));

        let mut ctx = GlobalContext {
            workdir,
            home,
            config: Config::default(),
        };
        ctx.config = load_config(ctx.global_config_path().as_deref(), &ctx.project_config_path());

        tracing::debug!("work directory: {}", ctx.workdir.display());

        Ok(ctx)
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the global configuration file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.home.as_ref().map(|h| h.join("config.toml"))
    }

    /// Get the project configuration file path.
    pub fn project_config_path(&self) -> PathBuf {
        self.workdir.join(CONFIG_DIR_NAME).join("config.toml")
    }

    /// Build the named build set registry from the built-ins and configuration.
    pub fn registry(&self) -> Result<BuildSetRegistry> {
        Ok(BuildSetRegistry::with_configured(&self.config.buildsets)?)
    }
}
