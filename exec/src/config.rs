//! Configuration types used by the command transports.
//!
//! These live here rather than in `localgate-config` so the transports can
//! consume them without depending on the file loader.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Shell override for command execution.
///
/// ```toml
/// [shell]
/// binary = "pwsh"
/// args = ["-NoProfile", "-Command"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ShellConfig {
    /// Override shell binary (e.g., "pwsh", "bash", "/usr/local/bin/dash").
    pub binary: Option<String>,
    /// Override shell args (e.g., `["-c"]`).
    pub args: Option<Vec<String>>,
}

/// Limits applied to commands run by the local transport.
///
/// ```toml
/// [transport]
/// timeout_secs = 600
/// max_output_bytes = 1048576
/// working_dir = "/srv/suites"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// Kill a command that runs longer than this. Unset or 0 means no limit.
    pub timeout_secs: Option<u64>,
    /// Cap on captured bytes per stream.
    pub max_output_bytes: Option<usize>,
    /// Directory commands start in; defaults to the current directory.
    pub working_dir: Option<PathBuf>,
}

impl TransportConfig {
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}
