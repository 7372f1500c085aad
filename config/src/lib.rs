//! Configuration for localgate.
//!
//! Two files are read here: the user config (`~/.localgate/config.toml`),
//! which tunes shell selection and the local gate, and suite files, which
//! list the instances a run should test.

mod settings;
mod suite;

pub use settings::{ConfigError, GateConfig, LocalgateConfig, config_path, expand_env_vars};
pub use suite::{InstanceSpec, Suite, SuiteEntry};
