//! Executor identity resolution.
//!
//! Decides whether an instance targets the local machine and, for those that
//! do, which OS family and shell dialect actually apply.

use localgate_types::{ConfigurationError, Instance, OsType, PlatformDescriptor, ShellType};

/// OS family and shell dialect of the host this process runs on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostPlatform {
    pub os_type: OsType,
    pub shell_type: ShellType,
}

impl HostPlatform {
    /// Introspect the running host.
    pub fn detect() -> Result<Self, ConfigurationError> {
        Self::from_target(std::env::consts::FAMILY, std::env::consts::OS)
    }

    /// Map a target family (`std::env::consts::FAMILY`) to platform values.
    pub fn from_target(family: &'static str, os: &'static str) -> Result<Self, ConfigurationError> {
        match family {
            "windows" => Ok(Self {
                os_type: OsType::Windows,
                shell_type: ShellType::PowerShell,
            }),
            "unix" => Ok(Self {
                os_type: OsType::Unix,
                shell_type: ShellType::Bourne,
            }),
            _ => Err(ConfigurationError::UnsupportedHost { family, os }),
        }
    }
}

/// Source of host platform facts.
///
/// Production code uses [`SystemHost`]; tests substitute probes that count
/// calls or pretend to be another OS.
pub trait HostProbe: Send + Sync {
    fn probe(&self) -> Result<HostPlatform, ConfigurationError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl HostProbe for SystemHost {
    fn probe(&self) -> Result<HostPlatform, ConfigurationError> {
        HostPlatform::detect()
    }
}

/// Whether `instance` runs on the local-machine executor.
///
/// Exact tag match only: see [`localgate_types::ExecutorKind`].
#[must_use]
pub fn is_local(instance: &Instance) -> bool {
    instance.executor_kind().is_local()
}

/// Return the platform descriptor that applies to `instance`.
///
/// Local instances get their declared descriptor replaced, once, by one that
/// keeps the declared name and takes OS and shell from `host`. Later calls
/// see the host-resolved variant and return it without probing again.
/// Non-local instances are returned untouched.
pub fn resolve_platform<'a>(
    instance: &'a mut Instance,
    host: &dyn HostProbe,
) -> Result<&'a PlatformDescriptor, ConfigurationError> {
    if is_local(instance) && !instance.platform.is_host_resolved() {
        let facts = host.probe()?;
        let declared = &instance.platform;
        if declared.os_type.is_some_and(|os| os != facts.os_type)
            || declared.shell_type.is_some_and(|shell| shell != facts.shell_type)
        {
            tracing::debug!(
                instance = %instance.name,
                declared_os = ?declared.os_type,
                declared_shell = ?declared.shell_type,
                host_os = %facts.os_type,
                "declared platform disagrees with host; using host values"
            );
        }
        let name = std::mem::take(&mut instance.platform.name);
        instance.platform =
            PlatformDescriptor::host_resolved(name, facts.os_type, facts.shell_type);
    }
    Ok(&instance.platform)
}
