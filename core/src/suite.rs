//! A base runner that executes each instance's commands over its transport,
//! and a driver that runs a whole suite with one task per instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use localgate_exec::{
    CommandOutput, ShellConfig, Transport, TransportConfig, TransportError, transport_for,
};
use localgate_types::{ConfigurationError, DestroyPolicy, Instance, ShellType};
use thiserror::Error;

use crate::runner::{RunFut, Runner};

#[derive(Debug, Error)]
pub enum SuiteRunError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("{instance}: {source}")]
    Transport {
        instance: String,
        #[source]
        source: TransportError,
    },
    #[error("{instance}: transport was not set up before the test phase")]
    NotPrepared { instance: String },
    #[error("{instance}: `{command}` exited with {}", exit_label(.exit_code))]
    CommandFailed {
        instance: String,
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("{instance}: test task panicked: {message}")]
    Panicked { instance: String, message: String },
}

fn exit_label(code: &Option<i32>) -> String {
    code.map_or_else(|| "no exit code".to_string(), |c| format!("exit code {c}"))
}

/// What a successful test phase produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceReport {
    pub instance: String,
    pub transport: String,
    pub outputs: Vec<CommandOutput>,
    pub destroyed: bool,
}

/// Runs each instance's configured commands, stopping at the first failure.
///
/// Transports are built in [`Runner::setup_transport`] from the instance's
/// `transport` and platform shell, and dropped again when the destroy policy
/// tears the instance down.
pub struct CommandRunner {
    commands: HashMap<String, Vec<String>>,
    shell_config: Option<ShellConfig>,
    transport_config: TransportConfig,
    transports: Mutex<HashMap<String, Arc<dyn Transport>>>,
}

impl CommandRunner {
    #[must_use]
    pub fn new(shell_config: Option<ShellConfig>) -> Self {
        Self {
            commands: HashMap::new(),
            shell_config,
            transport_config: TransportConfig::default(),
            transports: Mutex::new(HashMap::new()),
        }
    }

    /// Limits for local transports built by [`Runner::setup_transport`].
    #[must_use]
    pub fn with_transport_config(mut self, config: TransportConfig) -> Self {
        self.transport_config = config;
        self
    }

    #[must_use]
    pub fn with_commands(mut self, instance: impl Into<String>, commands: Vec<String>) -> Self {
        self.commands.insert(instance.into(), commands);
        self
    }

    /// Transport currently prepared for `instance`, if any.
    #[must_use]
    pub fn transport(&self, instance: &str) -> Option<Arc<dyn Transport>> {
        self.transports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(instance)
            .cloned()
    }

    fn destroy(&self, instance: &Instance, policy: DestroyPolicy, succeeded: bool) -> bool {
        if !policy.should_destroy(succeeded) {
            tracing::info!(instance = %instance.name, %policy, succeeded, "keeping instance");
            return false;
        }
        tracing::info!(instance = %instance.name, %policy, succeeded, "destroying instance");
        self.transports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&instance.name);
        true
    }

    async fn run_commands(
        &self,
        instance: &Instance,
        transport: &dyn Transport,
    ) -> Result<Vec<CommandOutput>, SuiteRunError> {
        let commands = self
            .commands
            .get(&instance.name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let mut outputs = Vec::with_capacity(commands.len());
        for command in commands {
            let output =
                transport
                    .execute(command)
                    .await
                    .map_err(|source| SuiteRunError::Transport {
                        instance: instance.name.clone(),
                        source,
                    })?;
            if !output.success() {
                return Err(SuiteRunError::CommandFailed {
                    instance: instance.name.clone(),
                    command: command.clone(),
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                });
            }
            outputs.push(output);
        }
        Ok(outputs)
    }
}

impl Runner for CommandRunner {
    type Output = InstanceReport;
    type Error = SuiteRunError;

    fn run_test<'a>(
        &'a self,
        instance: &'a Instance,
        policy: DestroyPolicy,
    ) -> RunFut<'a, InstanceReport, SuiteRunError> {
        Box::pin(async move {
            let transport =
                self.transport(&instance.name)
                    .ok_or_else(|| SuiteRunError::NotPrepared {
                        instance: instance.name.clone(),
                    })?;

            let result = self.run_commands(instance, transport.as_ref()).await;
            let destroyed = self.destroy(instance, policy, result.is_ok());
            Ok(InstanceReport {
                instance: instance.name.clone(),
                transport: transport.kind().to_string(),
                outputs: result?,
                destroyed,
            })
        })
    }

    fn setup_transport(&self, instance: &mut Instance) -> Result<(), SuiteRunError> {
        let shell_type = instance
            .platform
            .effective_shell()
            .unwrap_or(ShellType::Bourne);
        let transport = transport_for(
            &instance.transport,
            shell_type,
            self.shell_config.as_ref(),
            &self.transport_config,
        )
        .map_err(|source| SuiteRunError::Transport {
            instance: instance.name.clone(),
            source,
        })?;
        tracing::debug!(
            instance = %instance.name,
            transport = %instance.transport,
            shell = %shell_type,
            "transport ready"
        );
        self.transports
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(instance.name.clone(), Arc::from(transport));
        Ok(())
    }
}

/// Outcome of one instance in a suite run, in submission order.
#[derive(Debug)]
pub struct SuiteOutcome {
    pub instance: String,
    pub result: Result<InstanceReport, SuiteRunError>,
}

/// Set up and test every instance concurrently, one task each.
///
/// Gating is whatever `runner` does; wrap the base runner in
/// [`crate::LocalAwareRunner`] to serialize local-machine instances.
pub async fn run_suite<R>(
    runner: Arc<R>,
    instances: Vec<Instance>,
    policy: DestroyPolicy,
) -> Vec<SuiteOutcome>
where
    R: Runner<Output = InstanceReport, Error = SuiteRunError> + 'static,
{
    let mut handles = Vec::with_capacity(instances.len());
    for mut instance in instances {
        let runner = Arc::clone(&runner);
        let name = instance.name.clone();
        let handle = tokio::spawn(async move {
            runner.setup_transport(&mut instance)?;
            runner.run_test(&instance, policy).await
        });
        handles.push((name, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (instance, handle) in handles {
        let result = match handle.await {
            Ok(result) => result,
            Err(err) => Err(SuiteRunError::Panicked {
                instance: instance.clone(),
                message: err.to_string(),
            }),
        };
        outcomes.push(SuiteOutcome { instance, result });
    }
    outcomes
}
