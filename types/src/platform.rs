//! Platform descriptors: OS family and shell dialect of a test target.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum OsType {
    Unix,
    Windows,
}

impl OsType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unix => "unix",
            Self::Windows => "windows",
        }
    }
}

impl FromStr for OsType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unix" => Ok(Self::Unix),
            "windows" => Ok(Self::Windows),
            _ => Err(ConfigurationError::UnknownOsType(s.to_string())),
        }
    }
}

impl TryFrom<String> for OsType {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shell dialect used to compose commands for a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum ShellType {
    /// POSIX `sh`-compatible shells.
    Bourne,
    PowerShell,
}

impl ShellType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bourne => "bourne",
            Self::PowerShell => "powershell",
        }
    }
}

impl FromStr for ShellType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bourne" | "sh" => Ok(Self::Bourne),
            "powershell" | "pwsh" => Ok(Self::PowerShell),
            _ => Err(ConfigurationError::UnknownShellType(s.to_string())),
        }
    }
}

impl TryFrom<String> for ShellType {
    type Error = ConfigurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for ShellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a descriptor's OS and shell values came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlatformVariant {
    /// As written by the user; values may be absent or wrong for the host.
    #[default]
    Declared,
    /// Computed from the host this process runs on.
    HostResolved,
}

/// Metadata describing a target's OS family and shell dialect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlatformDescriptor {
    pub name: String,
    #[serde(default)]
    pub os_type: Option<OsType>,
    #[serde(default)]
    pub shell_type: Option<ShellType>,
    #[serde(skip)]
    pub variant: PlatformVariant,
}

impl PlatformDescriptor {
    /// A user-declared descriptor with no OS or shell information.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            os_type: None,
            shell_type: None,
            variant: PlatformVariant::Declared,
        }
    }

    #[must_use]
    pub fn declared(name: impl Into<String>, os_type: OsType, shell_type: ShellType) -> Self {
        Self {
            name: name.into(),
            os_type: Some(os_type),
            shell_type: Some(shell_type),
            variant: PlatformVariant::Declared,
        }
    }

    /// Keeps `name`, replaces OS and shell with host-derived values.
    #[must_use]
    pub fn host_resolved(name: impl Into<String>, os_type: OsType, shell_type: ShellType) -> Self {
        Self {
            name: name.into(),
            os_type: Some(os_type),
            shell_type: Some(shell_type),
            variant: PlatformVariant::HostResolved,
        }
    }

    #[must_use]
    pub fn is_host_resolved(&self) -> bool {
        self.variant == PlatformVariant::HostResolved
    }

    /// Shell dialect, falling back to the dialect implied by the OS family.
    #[must_use]
    pub fn effective_shell(&self) -> Option<ShellType> {
        self.shell_type.or(match self.os_type {
            Some(OsType::Windows) => Some(ShellType::PowerShell),
            Some(OsType::Unix) => Some(ShellType::Bourne),
            None => None,
        })
    }
}
