use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A peripheral was programmed into a mode the emulator does not implement.
///
/// These are not guest-visible conditions: the run loop stops and reports
/// them to the host.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConfigError {
    #[error("CTC channel {channel}: interrupt vector can only be written through channel 0")]
    CtcVectorChannel { channel: usize },
    #[error("DART channel {channel}: synchronous modes are not supported")]
    DartSyncMode { channel: usize },
    #[error("DART channel {channel}: wait/ready function is not supported")]
    DartWaitReady { channel: usize },
    #[error("DART: interrupt vector register exists only on channel B")]
    DartVectorChannel,
}

/// Errors surfaced by a running machine.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("peripheral configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("save state: {0}")]
    State(String),
}
