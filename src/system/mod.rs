pub mod fake;
pub mod platform;
pub mod source;

use thiserror::Error;

use crate::model::{
    CoreReading, HostIdentity, MemoryReading, PowerReading, ProcessReading, SystemReading,
};

pub use source::SysinfoSource;

/// Metric families read from the host, one per sample table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Family {
    Host,
    Memory,
    Power,
    Processes,
    System,
    Cores,
}

impl Family {
    pub fn label(self) -> &'static str {
        match self {
            Family::Host => "host",
            Family::Memory => "memory",
            Family::Power => "power",
            Family::Processes => "processes",
            Family::System => "system",
            Family::Cores => "cores",
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum SensorError {
    /// The host has no such source, e.g. a desktop without a battery.
    #[error("{0} source not available on this host")]
    Unavailable(Family),
    #[error("failed to read {family}: {reason}")]
    Read { family: Family, reason: String },
}

impl SensorError {
    pub fn family(&self) -> Family {
        match self {
            SensorError::Unavailable(family) => *family,
            SensorError::Read { family, .. } => *family,
        }
    }
}

/// Synchronous source of raw host readings.
///
/// Each method covers one metric family. Implementations may refresh
/// internal state, hence `&mut self`.
pub trait SensorSource {
    /// Called once at the start of every cycle. Sources that share one
    /// refresh between several families drop their cached state here.
    fn begin_cycle(&mut self) {}

    fn host_identity(&mut self) -> Result<HostIdentity, SensorError>;
    fn memory(&mut self) -> Result<MemoryReading, SensorError>;
    fn power(&mut self) -> Result<PowerReading, SensorError>;
    fn processes(&mut self) -> Result<Vec<ProcessReading>, SensorError>;
    fn system(&mut self) -> Result<SystemReading, SensorError>;
    fn cores(&mut self) -> Result<Vec<CoreReading>, SensorError>;
}
