//! End-to-end gate behavior through the real command runner.

use std::sync::Arc;

use localgate_core::{CommandRunner, LocalAwareRunner, LocalLock, SuiteRunError, run_suite};
use localgate_exec::detect_shell;
use localgate_types::{
    DestroyPolicy, ExecutorKind, Instance, OsType, PlatformDescriptor, ShellType, TransportKind,
};

#[cfg(unix)]
use crate::common::exclusive_claim;

fn localhost(name: &str) -> Instance {
    Instance::new(
        name,
        ExecutorKind::Local,
        TransportKind::Named("ssh".to_string()),
        PlatformDescriptor::named("foo"),
    )
}

fn dummy(name: &str) -> Instance {
    Instance::new(
        name,
        ExecutorKind::Other("dummy".to_string()),
        TransportKind::Dummy,
        PlatformDescriptor::declared("centos", OsType::Unix, ShellType::Bourne),
    )
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn local_instances_never_share_the_host_at_once() {
    let dir = tempfile::tempdir().unwrap();
    let claim = exclusive_claim(dir.path());

    let mut base = CommandRunner::new(None);
    let mut instances = Vec::new();
    for i in 0..6 {
        let name = format!("local-{i}");
        base = base.with_commands(name.clone(), vec![claim.clone()]);
        instances.push(localhost(&name));
    }
    let runner = Arc::new(LocalAwareRunner::with_lock(base, Arc::new(LocalLock::new())));

    let outcomes = run_suite(runner, instances, DestroyPolicy::Always).await;
    for outcome in &outcomes {
        let report = outcome.result.as_ref().unwrap();
        assert_eq!(report.transport, "localhost");
        assert!(report.destroyed);
    }
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn ungated_local_commands_do_collide() {
    // Control for the test above: without the gate the claim is contended.
    let dir = tempfile::tempdir().unwrap();
    let claim = exclusive_claim(dir.path());

    let mut base = CommandRunner::new(None);
    let mut instances = Vec::new();
    for i in 0..6 {
        let name = format!("local-{i}");
        base = base.with_commands(name.clone(), vec![claim.clone()]);
        let mut inst = localhost(&name);
        inst.transport = TransportKind::Local;
        instances.push(inst);
    }

    let outcomes = run_suite(Arc::new(base), instances, DestroyPolicy::Never).await;
    let collided = outcomes
        .iter()
        .filter(|o| {
            matches!(
                o.result,
                Err(SuiteRunError::CommandFailed {
                    exit_code: Some(9),
                    ..
                })
            )
        })
        .count();
    assert!(collided > 0, "expected at least one collision without the gate");
}

#[cfg(unix)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn failed_local_instance_does_not_block_the_next() {
    let base = CommandRunner::new(None)
        .with_commands("broken", vec!["exit 1".to_string()])
        .with_commands("healthy", vec!["true".to_string()]);
    let runner = Arc::new(LocalAwareRunner::with_lock(base, Arc::new(LocalLock::new())));

    let outcomes = run_suite(
        Arc::clone(&runner),
        vec![localhost("broken"), localhost("healthy")],
        DestroyPolicy::Passing,
    )
    .await;

    assert!(matches!(
        outcomes[0].result,
        Err(SuiteRunError::CommandFailed { exit_code: Some(1), .. })
    ));
    assert!(outcomes[1].result.is_ok());
    assert!(!runner.lock().is_held());
    // Failed under `passing`: kept around for inspection.
    assert!(runner.inner().transport("broken").is_some());
    assert!(runner.inner().transport("healthy").is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_local_instances_pass_while_the_lock_is_held() {
    let lock = Arc::new(LocalLock::new());
    let _held = lock.acquire().await;

    let base = CommandRunner::new(None).with_commands("remote", vec!["converge".to_string()]);
    let runner = Arc::new(LocalAwareRunner::with_lock(base, Arc::clone(&lock)));

    let outcomes = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        run_suite(runner, vec![dummy("remote")], DestroyPolicy::Passing),
    )
    .await
    .expect("dummy instance must not wait for the local lock");
    let report = outcomes[0].result.as_ref().unwrap();
    assert_eq!(report.transport, "dummy");
    assert_eq!(report.outputs.len(), 1);
}

#[test]
fn host_shell_matches_resolved_platform() {
    let runner = LocalAwareRunner::with_lock(CommandRunner::new(None), Arc::new(LocalLock::new()));
    let mut inst = localhost("shell-check");
    localgate_core::Runner::setup_transport(&runner, &mut inst).unwrap();

    let shell_type = inst.platform.shell_type.unwrap();
    let expected = if cfg!(windows) {
        ShellType::PowerShell
    } else {
        ShellType::Bourne
    };
    assert_eq!(shell_type, expected);
    assert_eq!(detect_shell(shell_type, None).shell_type, expected);
    assert_eq!(inst.platform.name, "foo");
    assert_eq!(inst.transport, TransportKind::Local);
}
