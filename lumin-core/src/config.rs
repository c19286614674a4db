//! Configuration management for LUMIN automation
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (LUMIN_*)
//! 3. Config file (~/.config/lumin/config.toml)
//! 4. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::taxonomy::Taxonomy;
use crate::{Error, Result};

/// Target repository and project board
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Repository owner (user or organisation)
    pub owner: String,

    /// Repository name
    pub repo: String,

    /// Title of the Projects V2 board issues are placed on
    pub project: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            owner: "uelkerd".to_string(),
            repo: "lumin-ai".to_string(),
            project: "LUMIN Project Tracker".to_string(),
        }
    }
}

/// Pacing and scan bounds for batch operations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutomationConfig {
    /// Fixed pause between consecutive write calls
    #[serde(with = "humantime_serde")]
    pub delay: Duration,

    /// Lowest issue number considered by project sync
    pub since_issue: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            since_issue: 28,
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Repository configuration
    pub github: GitHubConfig,

    /// Batch pacing configuration
    pub automation: AutomationConfig,

    /// Canonical label taxonomy
    pub taxonomy: Taxonomy,
}

impl Config {
    /// Load configuration from the default config file location
    ///
    /// Returns default config if file doesn't exist
    pub fn load() -> Result<Self> {
        match Self::default_config_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Get the default config file path
    ///
    /// Returns `~/.config/lumin/config.toml` on Unix
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lumin").join("config.toml"))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - LUMIN_OWNER: Repository owner
    /// - LUMIN_REPO: Repository name
    /// - LUMIN_PROJECT: Project board title
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(owner) = std::env::var("LUMIN_OWNER") {
            self.github.owner = owner;
        }

        if let Ok(repo) = std::env::var("LUMIN_REPO") {
            self.github.repo = repo;
        }

        if let Ok(project) = std::env::var("LUMIN_PROJECT") {
            self.github.project = project;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(
        mut self,
        owner: Option<String>,
        repo: Option<String>,
        project: Option<String>,
    ) -> Self {
        if let Some(owner) = owner {
            self.github.owner = owner;
        }

        if let Some(repo) = repo {
            self.github.repo = repo;
        }

        if let Some(project) = project {
            self.github.project = project;
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        owner: Option<String>,
        repo: Option<String>,
        project: Option<String>,
    ) -> Result<Self> {
        Ok(Self::load()?
            .with_env_overrides()
            .with_cli_overrides(owner, repo, project))
    }

    /// `owner/repo` slug of the configured repository
    pub fn repository(&self) -> String {
        format!("{}/{}", self.github.owner, self.github.repo)
    }
}
