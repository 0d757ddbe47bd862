//! Configuration file support.
//!
//! Two configuration file locations are read:
//! - Global: `~/.kernel-matrix/config.toml` - user-wide defaults
//! - Project: `<workdir>/.kernel-matrix/config.toml` - per work directory
//!
//! Project config takes precedence over global config.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::unit::DEFAULT_TOPLEVEL_CONFIG;

/// Default location of the kernel.org download tree.
pub const DEFAULT_CDN_URL: &str = "https://cdn.kernel.org/pub/linux/kernel";

/// Default stable kernel repository.
pub const DEFAULT_STABLE_GIT_URL: &str =
    "https://git.kernel.org/pub/scm/linux/kernel/git/stable/linux.git";

/// Merged configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// Build tool settings
    pub build: BuildConfig,

    /// Remote kernel metadata endpoints
    pub sources: SourcesConfig,

    /// Extra named build sets, keyed by name
    pub buildsets: BTreeMap<String, BuildSetConfig>,
}

/// Build tool settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BuildConfig {
    /// Build tool program (default: `kas`)
    pub tool: Option<String>,

    /// First config file of every build (default: `kas/base.yml`)
    pub toplevel_config: Option<String>,
}

/// Remote endpoints used when refreshing kernel recipes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SourcesConfig {
    pub cdn_url: Option<String>,
    pub stable_git_url: Option<String>,
}

/// A build set declared in configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildSetConfig {
    pub releases: Vec<String>,
    pub machines: Vec<String>,
    pub kernels: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.build.tool.is_some() {
            self.build.tool = other.build.tool;
        }
        if other.build.toplevel_config.is_some() {
            self.build.toplevel_config = other.build.toplevel_config;
        }

        if other.sources.cdn_url.is_some() {
            self.sources.cdn_url = other.sources.cdn_url;
        }
        if other.sources.stable_git_url.is_some() {
            self.sources.stable_git_url = other.sources.stable_git_url;
        }

        self.buildsets.extend(other.buildsets);
    }

    /// Build tool program.
    pub fn tool(&self) -> &str {
        self.build.tool.as_deref().unwrap_or("kas")
    }

    pub fn toplevel_config(&self) -> &str {
        self.build
            .toplevel_config
            .as_deref()
            .unwrap_or(DEFAULT_TOPLEVEL_CONFIG)
    }

    pub fn cdn_url(&self) -> Result<Url> {
        let raw = self.sources.cdn_url.as_deref().unwrap_or(DEFAULT_CDN_URL);
        Url::parse(raw).with_context(|| format!("invalid sources.cdn-url: {}", raw))
    }

    pub fn stable_git_url(&self) -> Result<Url> {
        let raw = self
            .sources
            .stable_git_url
            .as_deref()
            .unwrap_or(DEFAULT_STABLE_GIT_URL);
        Url::parse(raw).with_context(|| format!("invalid sources.stable-git-url: {}", raw))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`<workdir>/.kernel-matrix/config.toml`)
/// 2. Global config (`~/.kernel-matrix/config.toml`)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}
