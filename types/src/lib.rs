//! Core domain types for localgate.
//!
//! This crate contains pure domain types with no IO, no async, and minimal dependencies.
//! Everything here can be used from any layer of the workspace.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory

mod platform;
pub use platform::{OsType, PlatformDescriptor, PlatformVariant, ShellType};

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Fatal configuration problems. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("unsupported host OS family '{family}' (os '{os}')")]
    UnsupportedHost {
        family: &'static str,
        os: &'static str,
    },
    #[error("instance '{instance}' is missing required field '{field}'")]
    MissingField {
        instance: String,
        field: &'static str,
    },
    #[error("instance name '{0}' is used more than once")]
    DuplicateInstance(String),
    #[error("unknown destroy policy '{0}' (expected always, passing or never)")]
    UnknownDestroyPolicy(String),
    #[error("unknown shell type '{0}' (expected bourne or powershell)")]
    UnknownShellType(String),
    #[error("unknown os type '{0}' (expected unix or windows)")]
    UnknownOsType(String),
}

// ============================================================================
// Executor identity
// ============================================================================

/// Which executor an instance runs against.
///
/// Only the exact driver name [`ExecutorKind::LOCAL_DRIVER`] maps to
/// [`ExecutorKind::Local`]. Drivers that merely look local (`local`,
/// `localhost-ssh`, a wrapped localhost driver under another name) are
/// `Other` and never receive local-machine treatment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum ExecutorKind {
    /// Runs workloads directly on the host running the engine.
    Local,
    /// Any other executor: remote host, container, cloud VM, etc.
    Other(String),
}

impl ExecutorKind {
    pub const LOCAL_DRIVER: &'static str = "localhost";

    #[must_use]
    pub fn from_driver_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case(Self::LOCAL_DRIVER) {
            Self::Local
        } else {
            Self::Other(name.trim().to_string())
        }
    }

    #[must_use]
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Local => Self::LOCAL_DRIVER,
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ExecutorKind {
    fn from(value: String) -> Self {
        Self::from_driver_name(&value)
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Transport identity
// ============================================================================

/// Which transport an instance issues commands through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum TransportKind {
    /// Commands run as child processes of this process, no network hop.
    Local,
    /// Commands are recorded but never executed.
    Dummy,
    /// A network transport (`ssh`, `winrm`, ...) provided outside this workspace.
    Named(String),
}

impl TransportKind {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case("localhost") {
            Self::Local
        } else if trimmed.eq_ignore_ascii_case("dummy") {
            Self::Dummy
        } else {
            Self::Named(trimmed.to_string())
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Local => "localhost",
            Self::Dummy => "dummy",
            Self::Named(name) => name,
        }
    }
}

impl From<String> for TransportKind {
    fn from(value: String) -> Self {
        Self::from_name(&value)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Destroy policy
// ============================================================================

/// When an instance is torn down after its test phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DestroyPolicy {
    Always,
    /// Destroy only when the test phase succeeded.
    #[default]
    Passing,
    Never,
}

impl DestroyPolicy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Always => "always",
            Self::Passing => "passing",
            Self::Never => "never",
        }
    }

    /// Whether an instance whose test phase ended with `succeeded` should be destroyed.
    #[must_use]
    pub const fn should_destroy(self, succeeded: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Passing => succeeded,
            Self::Never => false,
        }
    }
}

impl FromStr for DestroyPolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "passing" => Ok(Self::Passing),
            "never" => Ok(Self::Never),
            _ => Err(ConfigurationError::UnknownDestroyPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for DestroyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Instance
// ============================================================================

/// A unit of test work, owned by the orchestration engine.
///
/// The local-machine hooks only ever touch `transport` and `platform`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub name: String,
    pub driver: ExecutorKind,
    pub transport: TransportKind,
    pub platform: PlatformDescriptor,
}

impl Instance {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        driver: ExecutorKind,
        transport: TransportKind,
        platform: PlatformDescriptor,
    ) -> Self {
        Self {
            name: name.into(),
            driver,
            transport,
            platform,
        }
    }

    #[must_use]
    pub fn executor_kind(&self) -> &ExecutorKind {
        &self.driver
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigurationError, DestroyPolicy, ExecutorKind, TransportKind};

    #[test]
    fn only_exact_localhost_driver_is_local() {
        assert_eq!(ExecutorKind::from_driver_name("localhost"), ExecutorKind::Local);
        assert_eq!(ExecutorKind::from_driver_name(" LocalHost "), ExecutorKind::Local);
        assert!(!ExecutorKind::from_driver_name("local").is_local());
        assert!(!ExecutorKind::from_driver_name("localhost-ssh").is_local());
        assert_eq!(
            ExecutorKind::from_driver_name("vagrant"),
            ExecutorKind::Other("vagrant".to_string())
        );
    }

    #[test]
    fn transport_names_map_to_variants() {
        assert_eq!(TransportKind::from_name("localhost"), TransportKind::Local);
        assert_eq!(TransportKind::from_name("Dummy"), TransportKind::Dummy);
        assert_eq!(
            TransportKind::from_name("ssh"),
            TransportKind::Named("ssh".to_string())
        );
        assert_eq!(TransportKind::Local.to_string(), "localhost");
    }

    #[test]
    fn destroy_policy_parses_and_decides() {
        assert_eq!("always".parse::<DestroyPolicy>(), Ok(DestroyPolicy::Always));
        assert_eq!("PASSING".parse::<DestroyPolicy>(), Ok(DestroyPolicy::Passing));
        assert_eq!("never".parse::<DestroyPolicy>(), Ok(DestroyPolicy::Never));
        assert_eq!(
            "sometimes".parse::<DestroyPolicy>(),
            Err(ConfigurationError::UnknownDestroyPolicy("sometimes".to_string()))
        );

        assert!(DestroyPolicy::Always.should_destroy(false));
        assert!(DestroyPolicy::Passing.should_destroy(true));
        assert!(!DestroyPolicy::Passing.should_destroy(false));
        assert!(!DestroyPolicy::Never.should_destroy(true));
        assert_eq!(DestroyPolicy::default(), DestroyPolicy::Passing);
    }

    #[test]
    fn executor_kind_deserializes_from_driver_name() {
        #[derive(serde::Deserialize)]
        struct Row {
            driver: ExecutorKind,
            transport: TransportKind,
        }
        let row: Row = toml::from_str("driver = \"localhost\"\ntransport = \"ssh\"").unwrap();
        assert_eq!(row.driver, ExecutorKind::Local);
        assert_eq!(row.transport, TransportKind::Named("ssh".to_string()));
    }
}
