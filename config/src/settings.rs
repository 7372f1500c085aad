use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use localgate_exec::{ShellConfig, TransportConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Default, Deserialize)]
pub struct LocalgateConfig {
    /// Shell override for the local transport.
    pub shell: Option<ShellConfig>,
    /// Limits for commands run by the local transport.
    pub transport: Option<TransportConfig>,
    pub gate: Option<GateConfig>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Tuning for the local-machine gate.
#[derive(Debug, Default, Deserialize)]
pub struct GateConfig {
    /// Warn once a local instance has waited this many seconds for the lock.
    pub wait_warn_secs: Option<u64>,
}

impl GateConfig {
    #[must_use]
    pub fn wait_warning(&self) -> Option<Duration> {
        self.wait_warn_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Expand `${VAR}` references; unset variables expand to nothing.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        let Some(end_rel) = rest[start + 2..].find('}') else {
            break;
        };
        out.push_str(&rest[..start]);
        let var = &rest[start + 2..start + 2 + end_rel];
        if !var.is_empty() {
            out.push_str(&env::var(var).unwrap_or_default());
        }
        rest = &rest[start + 2 + end_rel + 1..];
    }

    out.push_str(rest);
    out
}

impl LocalgateConfig {
    /// Load the user config. A missing file is `Ok(None)`.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let Some(path) = config_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load_from(&path).map(Some)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str::<Self>(&content) {
            Ok(mut config) => {
                if let Some(shell) = config.shell.as_mut() {
                    shell.binary = shell.binary.as_deref().map(expand_env_vars);
                    if let Some(args) = shell.args.as_mut() {
                        for arg in args.iter_mut() {
                            *arg = expand_env_vars(arg);
                        }
                    }
                }
                Ok(config)
            }
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn wait_warning(&self) -> Option<Duration> {
        self.gate.as_ref().and_then(GateConfig::wait_warning)
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".localgate").join("config.toml"))
}
