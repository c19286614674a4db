//! GitHub token resolution
//!
//! The token is never stored in `config.toml`. It is resolved from, in order:
//! 1. The `--token` CLI flag
//! 2. The `GITHUB_TOKEN` environment variable
//! 3. `~/.config/lumin/secrets.toml` (must be chmod 600 on Unix)

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Error, Result};

/// Contents of the secrets file
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Secrets {
    /// GitHub credentials
    pub github: GitHubSecrets,
}

/// GitHub credentials
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubSecrets {
    /// Personal access token with `repo` and `project` scopes
    pub token: Option<String>,
}

impl Secrets {
    /// Load secrets from the default location, or empty secrets if there is no file
    pub fn load() -> Result<Self> {
        match Self::default_secrets_path() {
            Some(path) if path.exists() => Self::load_from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load secrets from a specific file, rejecting group/world readable files
    pub fn load_from_file(path: &Path) -> Result<Self> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = std::fs::metadata(path)?.permissions().mode();
            if mode & 0o077 != 0 {
                return Err(Error::Config(format!(
                    "Secrets file {} has insecure permissions {:o}. Please run: chmod 600 {}",
                    path.display(),
                    mode & 0o777,
                    path.display()
                )));
            }
        }

        let contents = std::fs::read_to_string(path)?;
        let mut secrets: Secrets = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse secrets: {}", e)))?;

        if let Some(token) = secrets.github.token.as_mut() {
            *token = token.trim().to_string();
        }

        Ok(secrets)
    }

    /// Returns `~/.config/lumin/secrets.toml` on Unix
    pub fn default_secrets_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("lumin").join("secrets.toml"))
    }

    /// Resolve the token: explicit flag > `GITHUB_TOKEN` > secrets file
    pub fn resolve_token(&self, flag: Option<&str>) -> Option<String> {
        let env = std::env::var("GITHUB_TOKEN").ok();
        self.resolve_token_from(flag, env.as_deref())
    }

    fn resolve_token_from(&self, flag: Option<&str>, env: Option<&str>) -> Option<String> {
        let candidates = [
            ("flag", flag),
            ("GITHUB_TOKEN", env),
            ("secrets file", self.github.token.as_deref()),
        ];

        candidates.into_iter().find_map(|(source, value)| {
            let token = value?.trim();
            if token.is_empty() {
                return None;
            }
            debug!(source, "Using GitHub token");
            Some(token.to_string())
        })
    }
}
