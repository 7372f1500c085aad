//! The runner seam and the local-machine decorator over it.
//!
//! ```text
//! engine -> LocalAwareRunner::run_test -> is_local? --no--> inner.run_test
//!                                            |
//!                                           yes
//!                                            v
//!                                   LocalLock::acquire -> inner.run_test -> release
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::{Duration, Instant};

use localgate_types::{
    ConfigurationError, DestroyPolicy, Instance, PlatformDescriptor, TransportKind,
};
use tokio::time;

use crate::lock::{LocalLock, LocalLockGuard};
use crate::resolver::{HostProbe, SystemHost, is_local, resolve_platform};

/// Run-phase future type alias.
pub type RunFut<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Instance lifecycle hooks an orchestration engine drives.
pub trait Runner: Send + Sync {
    type Output: Send;
    type Error: Send;

    /// Run the test phase, then apply `policy`.
    fn run_test<'a>(
        &'a self,
        instance: &'a Instance,
        policy: DestroyPolicy,
    ) -> RunFut<'a, Self::Output, Self::Error>;

    /// Prepare whatever the instance's `transport` names.
    fn setup_transport(&self, instance: &mut Instance) -> Result<(), Self::Error>;

    /// The platform descriptor that applies to `instance`.
    fn platform<'i>(
        &self,
        instance: &'i mut Instance,
    ) -> Result<&'i PlatformDescriptor, ConfigurationError> {
        Ok(&instance.platform)
    }
}

/// Decorator that gives local-machine instances their required treatment:
/// serialized test phases, the local transport, and host-derived platform.
///
/// Instances on any other executor pass straight through to the inner runner.
pub struct LocalAwareRunner<R> {
    inner: R,
    lock: Arc<LocalLock>,
    host: Arc<dyn HostProbe>,
    wait_warning: Option<Duration>,
}

impl<R: Runner> LocalAwareRunner<R> {
    /// Wrap `inner`, sharing the process-wide [`LocalLock::global`].
    pub fn new(inner: R) -> Self {
        Self::with_lock(inner, LocalLock::global())
    }

    pub fn with_lock(inner: R, lock: Arc<LocalLock>) -> Self {
        Self {
            inner,
            lock,
            host: Arc::new(SystemHost),
            wait_warning: None,
        }
    }

    #[must_use]
    pub fn with_host_probe(mut self, host: Arc<dyn HostProbe>) -> Self {
        self.host = host;
        self
    }

    /// Emit one warning when a local instance has waited `after` for the lock.
    #[must_use]
    pub fn with_wait_warning(mut self, after: Duration) -> Self {
        self.wait_warning = Some(after);
        self
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    pub fn lock(&self) -> &Arc<LocalLock> {
        &self.lock
    }

    async fn acquire(&self, instance: &Instance) -> LocalLockGuard<'_> {
        let Some(warn_after) = self.wait_warning else {
            return self.lock.acquire().await;
        };

        let started = Instant::now();
        let acquire = self.lock.acquire();
        tokio::pin!(acquire);
        tokio::select! {
            guard = &mut acquire => return guard,
            () = time::sleep(warn_after) => {
                tracing::warn!(
                    instance = %instance.name,
                    waited = ?started.elapsed(),
                    "[Localhost] still waiting for the local lock"
                );
            }
        }
        acquire.await
    }
}

impl<R> Runner for LocalAwareRunner<R>
where
    R: Runner,
    R::Error: From<ConfigurationError>,
{
    type Output = R::Output;
    type Error = R::Error;

    fn run_test<'a>(
        &'a self,
        instance: &'a Instance,
        policy: DestroyPolicy,
    ) -> RunFut<'a, Self::Output, Self::Error> {
        if !is_local(instance) {
            return self.inner.run_test(instance, policy);
        }

        Box::pin(async move {
            tracing::debug!(
                instance = %instance.name,
                "[Localhost] Waiting for a lock before {instance} can proceed..."
            );
            let _guard = self.acquire(instance).await;
            tracing::debug!(
                instance = %instance.name,
                "[Localhost] Lock obtained for {instance}; proceeding..."
            );
            let result = self.inner.run_test(instance, policy).await;
            tracing::debug!(
                instance = %instance.name,
                "[Localhost] Test complete for {instance}; releasing lock..."
            );
            result
        })
    }

    fn setup_transport(&self, instance: &mut Instance) -> Result<(), Self::Error> {
        if is_local(instance) {
            self.platform(instance)?;
            if instance.transport != TransportKind::Local {
                tracing::debug!(
                    instance = %instance.name,
                    configured = %instance.transport,
                    "[Localhost] forcing local transport"
                );
                instance.transport = TransportKind::Local;
            }
        }
        self.inner.setup_transport(instance)
    }

    fn platform<'i>(
        &self,
        instance: &'i mut Instance,
    ) -> Result<&'i PlatformDescriptor, ConfigurationError> {
        if is_local(instance) {
            resolve_platform(instance, self.host.as_ref())
        } else {
            self.inner.platform(instance)
        }
    }
}
