//! Command execution for localgate: shell selection, child process cleanup,
//! and the transports commands are issued through.

pub mod config;
pub mod process;
pub mod shell;
pub mod transport;

pub use config::{ShellConfig, TransportConfig};
pub use shell::{DetectedShell, detect_shell};
pub use transport::{
    CommandOutput, DummyTransport, LocalTransport, Transport, TransportError, TransportFut,
    transport_for,
};
