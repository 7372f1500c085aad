//! Transports: how commands reach a test target.
//!
//! Only the local-execution transport and the recording dummy live here.
//! Network transports are supplied by the embedding engine through the
//! [`Transport`] trait.

use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use localgate_types::{ShellType, TransportKind};
use thiserror::Error;
use tokio::process::Command;
use tokio::time;

use crate::config::{ShellConfig, TransportConfig};
use crate::process::{ChildGuard, read_to_end_limited};
use crate::shell::{DetectedShell, detect_shell};

/// Default cap on captured bytes per stream.
pub const DEFAULT_MAX_OUTPUT_BYTES: usize = 1024 * 1024;

/// How long a killed child gets to be reaped before we give up on it.
const KILL_GRACE: Duration = Duration::from_secs(2);

pub type TransportFut<'a> =
    Pin<Box<dyn Future<Output = Result<CommandOutput, TransportError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to spawn {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("command timed out after {elapsed:?}: {command}")]
    Timeout { command: String, elapsed: Duration },
    #[error("transport '{0}' is not available in this build")]
    Unsupported(String),
}

/// Result of one command issued through a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub command: String,
    /// `None` when the process was terminated by a signal or never ran.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub truncated: bool,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Issues commands to a test target.
pub trait Transport: Send + Sync + fmt::Debug {
    fn kind(&self) -> TransportKind;
    fn execute<'a>(&'a self, command: &'a str) -> TransportFut<'a>;
}

/// Runs commands as child processes of this process through the host shell.
#[derive(Debug, Clone)]
pub struct LocalTransport {
    shell: DetectedShell,
    working_dir: Option<PathBuf>,
    timeout: Option<Duration>,
    max_output_bytes: usize,
}

impl LocalTransport {
    #[must_use]
    pub fn new(shell: DetectedShell) -> Self {
        Self {
            shell,
            working_dir: None,
            timeout: None,
            max_output_bytes: DEFAULT_MAX_OUTPUT_BYTES,
        }
    }

    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_max_output_bytes(mut self, max: usize) -> Self {
        self.max_output_bytes = max;
        self
    }

    /// Apply the `[transport]` limits that are set, keeping defaults for the rest.
    #[must_use]
    pub fn with_config(mut self, config: &TransportConfig) -> Self {
        if let Some(dir) = &config.working_dir {
            self = self.with_working_dir(dir);
        }
        if let Some(timeout) = config.timeout() {
            self = self.with_timeout(timeout);
        }
        if let Some(max) = config.max_output_bytes {
            self = self.with_max_output_bytes(max);
        }
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    #[must_use]
    pub fn shell(&self) -> &DetectedShell {
        &self.shell
    }

    async fn run(&self, command: &str) -> Result<CommandOutput, TransportError> {
        let mut cmd = Command::new(&self.shell.binary);
        cmd.args(&self.shell.args)
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        #[cfg(unix)]
        crate::process::set_new_session(&mut cmd);

        tracing::debug!(shell = %self.shell, command, "spawning local command");
        let child = cmd.spawn().map_err(|source| TransportError::Spawn {
            shell: self.shell.binary.display().to_string(),
            source,
        })?;
        let mut guard = ChildGuard::new(child);

        let stdout = guard.child_mut().stdout.take().ok_or_else(|| {
            TransportError::Io(std::io::Error::other("failed to capture stdout"))
        })?;
        let stderr = guard.child_mut().stderr.take().ok_or_else(|| {
            TransportError::Io(std::io::Error::other("failed to capture stderr"))
        })?;

        let stdout_task = tokio::spawn(read_to_end_limited(stdout, self.max_output_bytes));
        let stderr_task = tokio::spawn(read_to_end_limited(stderr, self.max_output_bytes));

        let started = Instant::now();
        let status = match self.timeout {
            None => guard.child_mut().wait().await?,
            Some(limit) => {
                if let Ok(res) = time::timeout(limit, guard.child_mut().wait()).await {
                    res?
                } else {
                    let _ = guard.child_mut().kill().await;
                    let _ = time::timeout(KILL_GRACE, guard.child_mut().wait()).await;
                    return Err(TransportError::Timeout {
                        command: command.to_string(),
                        elapsed: started.elapsed(),
                    });
                }
            }
        };
        guard.disarm();

        let (stdout_bytes, stdout_truncated) =
            stdout_task.await.unwrap_or_else(|_| (Vec::new(), false));
        let (stderr_bytes, stderr_truncated) =
            stderr_task.await.unwrap_or_else(|_| (Vec::new(), false));

        Ok(CommandOutput {
            command: command.to_string(),
            exit_code: status.code(),
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            truncated: stdout_truncated || stderr_truncated,
        })
    }
}

impl Transport for LocalTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Local
    }

    fn execute<'a>(&'a self, command: &'a str) -> TransportFut<'a> {
        Box::pin(self.run(command))
    }
}

/// Records commands without running them.
#[derive(Debug, Default)]
pub struct DummyTransport {
    executed: Mutex<Vec<String>>,
}

impl DummyTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands seen so far, in call order.
    #[must_use]
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Transport for DummyTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Dummy
    }

    fn execute<'a>(&'a self, command: &'a str) -> TransportFut<'a> {
        Box::pin(async move {
            self.executed
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(command.to_string());
            Ok(CommandOutput {
                command: command.to_string(),
                exit_code: Some(0),
                stdout: String::new(),
                stderr: String::new(),
                truncated: false,
            })
        })
    }
}

/// Build the transport an instance's [`TransportKind`] names.
///
/// `shell_type` and both configs only matter for the local transport.
pub fn transport_for(
    kind: &TransportKind,
    shell_type: ShellType,
    shell_config: Option<&ShellConfig>,
    transport_config: &TransportConfig,
) -> Result<Box<dyn Transport>, TransportError> {
    match kind {
        TransportKind::Local => Ok(Box::new(
            LocalTransport::new(detect_shell(shell_type, shell_config))
                .with_config(transport_config),
        )),
        TransportKind::Dummy => Ok(Box::new(DummyTransport::new())),
        TransportKind::Named(name) => Err(TransportError::Unsupported(name.clone())),
    }
}
