use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::BenchError;
use crate::types::{AccelerationMode, CleanupPolicy, Target};

pub const CONFIG_FILE_NAME: &str = "buildbench.toml";

const DEFAULT_RUNS: usize = 5;
const DEFAULT_OUTPUT_DIR: &str = "dist";
const DEFAULT_ACCELERATION_ENV: &str = "ROLLDOWN_NATIVE";

/// Benchmark definition, normally loaded from `buildbench.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default = "default_runs")]
    pub runs: usize,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_acceleration_env")]
    pub acceleration_env: String,
    #[serde(default)]
    pub cleanup: CleanupPolicy,
    #[serde(default, rename = "target")]
    pub targets: Vec<Target>,
}

fn default_runs() -> usize {
    DEFAULT_RUNS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_acceleration_env() -> String {
    DEFAULT_ACCELERATION_ENV.to_string()
}

impl Default for BenchConfig {
    /// Vite against rolldown-vite with and without native acceleration.
    fn default() -> Self {
        BenchConfig {
            runs: DEFAULT_RUNS,
            output_dir: default_output_dir(),
            acceleration_env: default_acceleration_env(),
            cleanup: CleanupPolicy::default(),
            targets: vec![
                Target::new(
                    "Vite (Standard)",
                    "npx vite build --config vite.config.js",
                    None,
                ),
                Target::new(
                    "Rolldown-vite (No Native)",
                    "npx rolldown-vite build --config vite.config.rolldown.js",
                    Some(AccelerationMode::Off),
                ),
                Target::new(
                    "Rolldown-vite (With Native)",
                    "npx rolldown-vite build --config vite.config.rolldown.js",
                    Some(AccelerationMode::On),
                ),
            ],
        }
    }
}

/// A loaded config plus the directory that relative paths and build
/// commands are anchored to.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub config: BenchConfig,
    pub base_dir: PathBuf,
}

impl BenchConfig {
    /// Load a config file. Validation is left to the caller so CLI
    /// overrides can be merged first.
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let content = std::fs::read_to_string(path).map_err(|source| BenchError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            BenchError::TomlParse { detail } => BenchError::ConfigParse {
                path: path.to_path_buf(),
                detail,
            },
            other => other,
        })
    }

    /// Parse TOML content without validating it.
    pub fn from_toml_str(content: &str) -> Result<Self, BenchError> {
        toml::from_str(content).map_err(|e| BenchError::TomlParse {
            detail: e.message().to_string(),
        })
    }

    /// Find a project config by walking up from `start_dir`.
    pub fn locate(start_dir: &Path) -> Option<PathBuf> {
        let mut dir = start_dir.to_path_buf();
        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                return Some(candidate);
            }
            if !dir.pop() {
                return None;
            }
        }
    }

    /// `<config dir>/buildbench/config.toml`, if it exists.
    pub fn user_config() -> Option<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("buildbench").join("config.toml"))
            .filter(|p| p.is_file())
    }

    /// Resolve the active config: explicit path, project file found above
    /// `start_dir`, user config, or defaults.
    ///
    /// Project and explicit configs are anchored to the directory holding
    /// the file; the user config and the defaults to `start_dir`.
    pub fn resolve(explicit: Option<&Path>, start_dir: &Path) -> Result<ResolvedConfig, BenchError> {
        let anchored = |path: &Path| -> Result<ResolvedConfig, BenchError> {
            let path = start_dir.join(path);
            tracing::debug!("loading config from {}", path.display());
            let config = Self::load(&path)?;
            let base_dir = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start_dir.to_path_buf());
            Ok(ResolvedConfig { config, base_dir })
        };

        if let Some(path) = explicit {
            return anchored(path);
        }
        if let Some(path) = Self::locate(start_dir) {
            return anchored(&path);
        }

        let config = match Self::user_config() {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::load(&path)?
            }
            None => {
                tracing::debug!("no config found, using defaults");
                Self::default()
            }
        };
        Ok(ResolvedConfig {
            config,
            base_dir: start_dir.to_path_buf(),
        })
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        let invalid = |detail: String| Err(BenchError::InvalidConfig { detail });

        if self.runs == 0 {
            return invalid("runs must be at least 1".to_string());
        }
        // Must name a directory below its anchor; ".", "..", "a/.." and "/"
        // would wipe the project or worse.
        if !matches!(self.output_dir.components().next_back(), Some(Component::Normal(_))) {
            return invalid(format!(
                "output_dir '{}' must name a subdirectory",
                self.output_dir.display()
            ));
        }
        if self.acceleration_env.trim().is_empty() {
            return invalid("acceleration_env must not be empty".to_string());
        }
        if self.targets.is_empty() {
            return invalid("at least one [[target]] is required".to_string());
        }

        let mut seen = HashSet::new();
        for (i, target) in self.targets.iter().enumerate() {
            if target.label.trim().is_empty() {
                return invalid(format!("target #{} has an empty label", i + 1));
            }
            if target.command.trim().is_empty() {
                return invalid(format!("target '{}' has an empty command", target.label));
            }
            if !seen.insert(target.label.as_str()) {
                return invalid(format!("duplicate target label '{}'", target.label));
            }
        }
        Ok(())
    }

    /// Render the built-in defaults as a commented config file.
    pub fn default_toml() -> String {
        let defaults = Self::default();
        let mut out = String::from(
            "# buildbench configuration\n\
             #\n\
             # The first [[target]] is the baseline; every other target is\n\
             # compared against it.\n\n",
        );
        out.push_str("# Timed trials per target\n");
        out.push_str(&format!("runs = {}\n", defaults.runs));
        out.push_str("# Removed before and after every trial\n");
        out.push_str(&format!(
            "output_dir = \"{}\"\n",
            defaults.output_dir.display()
        ));
        out.push_str("# Set to \"true\"/\"false\" for targets with `acceleration = \"on\"/\"off\"`\n");
        out.push_str(&format!(
            "acceleration_env = \"{}\"\n",
            defaults.acceleration_env
        ));
        out.push_str("# \"warn\" or \"abort\" when the output directory cannot be removed\n");
        out.push_str("cleanup = \"warn\"\n");

        for target in &defaults.targets {
            out.push_str("\n[[target]]\n");
            out.push_str(&format!("label = {}\n", toml_string(&target.label)));
            out.push_str(&format!("command = {}\n", toml_string(&target.command)));
            match target.acceleration {
                Some(AccelerationMode::On) => out.push_str("acceleration = \"on\"\n"),
                Some(AccelerationMode::Off) => out.push_str("acceleration = \"off\"\n"),
                None => {}
            }
        }
        out
    }
}

fn toml_string(s: &str) -> String {
    toml::Value::String(s.to_string()).to_string()
}
