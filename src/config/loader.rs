//! Configuration loader with tier-based merging.
//!
//! Loads configuration from multiple tiers and merges them field-by-field.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CONFIG_FILE: &str = "config.yaml";

/// File-backed tiers, lowest priority first. Defaults sit below them and the
/// environment above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileTier {
    /// `$CWD/taskflow/`
    Project,
    /// `~/.taskflow/`
    User,
}

impl FileTier {
    const IN_ORDER: [FileTier; 2] = [FileTier::Project, FileTier::User];
}

impl std::fmt::Display for FileTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileTier::Project => write!(f, "project"),
            FileTier::User => write!(f, "user"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl ConfigPaths {
    /// `./taskflow` and `~/.taskflow`.
    pub fn discover() -> Self {
        Self {
            project_dir: Some(PathBuf::from("taskflow")),
            user_dir: dirs::home_dir().map(|h| h.join(".taskflow")),
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }

    fn file_for(&self, tier: FileTier) -> Option<PathBuf> {
        let dir = match tier {
            FileTier::Project => self.project_dir.as_ref(),
            FileTier::User => self.user_dir.as_ref(),
        }?;
        Some(dir.join(CONFIG_FILE))
    }
}

/// Configuration loader that handles tier-based merging.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: Config,
    /// Highest-priority file that contributed, if any.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load from `TASKFLOW_CONFIG_PATH` if set, otherwise from all tiers.
    pub fn load() -> Result<Self> {
        if let Ok(explicit) = std::env::var("TASKFLOW_CONFIG_PATH") {
            return Self::load_file(PathBuf::from(explicit));
        }
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load one explicit file, skipping tier discovery. Environment
    /// overrides still apply.
    pub fn load_file(path: PathBuf) -> Result<Self> {
        let mut config = Config::load(&path)
            .with_context(|| format!("failed to load config from {}", path.display()))?;
        apply_env_overrides(&mut config)?;
        Ok(Self {
            config,
            config_path: Some(path),
        })
    }

    /// Load configuration with explicit tier directories.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        let mut tiers: Vec<Value> = vec![serde_json::to_value(Config::default())?];
        let mut config_path = None;

        for tier in FileTier::IN_ORDER {
            let Some(file) = paths.file_for(tier) else {
                continue;
            };
            if !file.exists() {
                continue;
            }
            match read_yaml(&file) {
                Ok(value) => {
                    debug!(%tier, path = %file.display(), "Loaded config tier");
                    tiers.push(value);
                    config_path = Some(file);
                }
                Err(e) => warn!(%tier, path = %file.display(), error = %e, "Ignoring unreadable config"),
            }
        }

        let merged = deep_merge_all(tiers);
        let mut config: Config =
            serde_json::from_value(merged).context("invalid merged configuration")?;
        apply_env_overrides(&mut config)?;

        Ok(Self {
            config,
            config_path,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

fn read_yaml(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_yaml::from_str(&content)?;
    Ok(value)
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Environment tier. `lookup` is `std::env::var` outside tests.
fn apply_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
    if let Some(db_path) = lookup("TASKFLOW_DB_PATH") {
        config.server.db_path = PathBuf::from(db_path);
    }
    if let Some(host) = lookup("TASKFLOW_HOST") {
        config.server.host = host
            .parse()
            .with_context(|| format!("TASKFLOW_HOST is not an IP address: {host}"))?;
    }
    if let Some(port) = lookup("TASKFLOW_PORT") {
        config.server.port = port
            .parse()
            .with_context(|| format!("TASKFLOW_PORT is not a port number: {port}"))?;
    }
    if let Some(secret) = lookup("TASKFLOW_JWT_SECRET") {
        config.auth.jwt_secret = Some(secret);
    }
    if let Some(issuer) = lookup("TASKFLOW_JWT_ISSUER") {
        config.auth.issuer = Some(issuer);
    }
    if let Some(url) = lookup("TASKFLOW_SERVER_URL") {
        config.client.server_url = url;
    }
    Ok(())
}
