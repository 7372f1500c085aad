//! Suite files: the instances one run should test.
//!
//! ```toml
//! [[instance]]
//! name = "default-localhost"
//! driver = "localhost"
//! transport = "ssh"          # ignored for localhost
//! platform = { name = "ubuntu" }
//! commands = ["echo hello"]
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use localgate_types::{
    ConfigurationError, ExecutorKind, Instance, PlatformDescriptor, TransportKind,
};
use serde::Deserialize;

use crate::settings::{ConfigError, expand_env_vars};

/// One `[[instance]]` table as written.
#[derive(Debug, Clone, Deserialize)]
pub struct InstanceSpec {
    pub name: String,
    pub driver: Option<String>,
    /// Defaults to the driver's natural transport: `localhost` for the local
    /// driver, `dummy` for the dummy driver.
    pub transport: Option<String>,
    pub platform: Option<PlatformDescriptor>,
    #[serde(default)]
    pub commands: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Suite {
    #[serde(default, rename = "instance")]
    pub instances: Vec<InstanceSpec>,
}

/// A validated suite entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteEntry {
    pub instance: Instance,
    pub commands: Vec<String>,
}

impl InstanceSpec {
    pub fn into_entry(self) -> Result<SuiteEntry, ConfigurationError> {
        let driver = self
            .driver
            .as_deref()
            .map(ExecutorKind::from_driver_name)
            .ok_or_else(|| ConfigurationError::MissingField {
                instance: self.name.clone(),
                field: "driver",
            })?;
        let platform = self
            .platform
            .ok_or_else(|| ConfigurationError::MissingField {
                instance: self.name.clone(),
                field: "platform",
            })?;
        let transport = match (self.transport.as_deref(), &driver) {
            (Some(name), _) => TransportKind::from_name(name),
            (None, ExecutorKind::Local) => TransportKind::Local,
            (None, ExecutorKind::Other(name)) => TransportKind::from_name(name),
        };
        let commands = self.commands.iter().map(|c| expand_env_vars(c)).collect();

        Ok(SuiteEntry {
            instance: Instance::new(self.name, driver, transport, platform),
            commands,
        })
    }
}

impl Suite {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate every instance. Duplicate names are rejected because the
    /// runner keys transports by instance name.
    pub fn into_entries(self) -> Result<Vec<SuiteEntry>, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.instances.len());
        for spec in self.instances {
            if !seen.insert(spec.name.clone()) {
                tracing::warn!(instance = %spec.name, "duplicate instance name in suite");
                return Err(ConfigurationError::DuplicateInstance(spec.name));
            }
            entries.push(spec.into_entry()?);
        }
        Ok(entries)
    }
}
