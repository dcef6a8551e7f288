//! Configuration loading with multi-layer merge

use super::{DataConfig, NormalizationConfig, OracleConfig};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AceConfig {
    /// Global defaults
    #[serde(default)]
    pub defaults: Defaults,

    /// Oracle settings
    pub oracle: Option<OracleConfig>,

    /// Student data location
    #[serde(default)]
    pub data: DataConfig,

    /// Extra shorthand rules for the academic query normalizer
    #[serde(default)]
    pub normalization: NormalizationConfig,
}

/// Global default settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    /// Deadline for a whole workflow run, in seconds
    #[serde(default = "default_run_timeout")]
    pub run_timeout: u64,

    /// Abort runs after this many steps
    pub max_steps: Option<usize>,

    /// Print replies as JSON instead of console text
    #[serde(default)]
    pub json: bool,
}

fn default_run_timeout() -> u64 {
    120
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            run_timeout: default_run_timeout(),
            max_steps: None,
            json: false,
        }
    }
}

impl Defaults {
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout)
    }
}

impl AceConfig {
    /// Load configuration from the standard hierarchy
    ///
    /// Load order (later overrides earlier):
    /// 1. Built-in defaults
    /// 2. ~/.config/ace/config.toml
    /// 3. .ace/config.toml (project)
    pub fn load(project_dir: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                let user_config = Self::load_file(&user_config_path)
                    .with_context(|| format!("loading {}", user_config_path.display()))?;
                config.merge(user_config);
            }
        }

        let project_config_path = project_dir
            .map(|p| p.join(".ace/config.toml"))
            .unwrap_or_else(|| PathBuf::from(".ace/config.toml"));

        if project_config_path.exists() {
            let project_config = Self::load_file(&project_config_path)
                .with_context(|| format!("loading {}", project_config_path.display()))?;
            config.merge(project_config);
        }

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self =
            toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Get the user config path (~/.config/ace/config.toml)
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ace/config.toml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.defaults.run_timeout != default_run_timeout() {
            self.defaults.run_timeout = other.defaults.run_timeout;
        }
        if other.defaults.max_steps.is_some() {
            self.defaults.max_steps = other.defaults.max_steps;
        }
        if other.defaults.json {
            self.defaults.json = true;
        }

        if other.oracle.is_some() {
            self.oracle = other.oracle;
        }

        if other.data.student_data.is_some() {
            self.data.student_data = other.data.student_data;
        }

        // Rules accumulate: user rules first, project rules after
        self.normalization.rules.extend(other.normalization.rules);
    }

    /// Oracle settings, or the defaults when none are configured
    pub fn oracle(&self) -> OracleConfig {
        self.oracle.clone().unwrap_or_default()
    }
}
