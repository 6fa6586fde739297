use crate::parallel::ParallelPort;
use crate::serial::SerialPort;
use crate::sink::{NullSink, TriggerSink};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Hardware channel used for triggers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TriggerPort {
    None,
    Parallel {
        address: u64,
        #[serde(default = "default_port_device")]
        device: PathBuf,
    },
    Serial {
        path: PathBuf,
        #[serde(default = "default_baud")]
        baud: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub port: TriggerPort,
    /// How long each code is held before the line returns to zero.
    pub latency_ms: u64,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            port: TriggerPort::None,
            latency_ms: 5,
        }
    }
}

fn default_port_device() -> PathBuf {
    PathBuf::from("/dev/port")
}

fn default_baud() -> u32 {
    115200
}

/// Opens the configured channel. Never fails: an unavailable port
/// produces a sink that reports `Unavailable` on every send.
pub fn open(config: &TriggerConfig) -> Box<dyn TriggerSink> {
    let latency = Duration::from_millis(config.latency_ms);
    match &config.port {
        TriggerPort::None => Box::new(NullSink),
        TriggerPort::Parallel { address, device } => {
            Box::new(ParallelPort::open(device, *address, latency))
        }
        TriggerPort::Serial { path, baud } => Box::new(SerialPort::open(path, *baud, latency)),
    }
}
