//! Local-machine execution support for test orchestration.
//!
//! Instances whose executor is the local machine share the host with every
//! other local instance, so their test phases are serialized through one
//! process-wide [`LocalLock`]. They also always use the local transport and a
//! platform descriptor derived from the real host. [`LocalAwareRunner`]
//! applies all three rules as a decorator over any [`Runner`]; instances on
//! other executors pass through untouched.

pub mod lock;
pub mod resolver;
pub mod runner;
pub mod suite;

pub use lock::{LocalLock, LocalLockGuard};
pub use resolver::{HostPlatform, HostProbe, SystemHost, is_local, resolve_platform};
pub use runner::{LocalAwareRunner, RunFut, Runner};
pub use suite::{CommandRunner, InstanceReport, SuiteOutcome, SuiteRunError, run_suite};
