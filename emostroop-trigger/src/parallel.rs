use crate::error::TriggerError;
use crate::sink::TriggerSink;
use emostroop_core::Trigger;
use emostroop_timing::{HighPrecisionTimer, Timer};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Parallel (LPT) port driven through a port-I/O device file such as `/dev/port`,
/// where the byte offset is the port address.
pub struct ParallelPort {
    device: PathBuf,
    address: u64,
    latency: Duration,
    port: Option<File>,
    timer: HighPrecisionTimer,
}

impl ParallelPort {
    /// Opens the port and drives it to zero. A port that cannot be opened
    /// yields a sink whose sends fail with `Unavailable`.
    pub fn open(device: impl AsRef<Path>, address: u64, latency: Duration) -> Self {
        let device = device.as_ref().to_path_buf();
        let port = match OpenOptions::new().write(true).open(&device) {
            Ok(f) => {
                info!("Parallel port opened at {:#06x} via {}", address, device.display());
                Some(f)
            }
            Err(e) => {
                warn!("The parallel port couldn't be opened ({}): {}", device.display(), e);
                None
            }
        };

        let mut this = Self {
            device,
            address,
            latency,
            port,
            timer: HighPrecisionTimer::new(),
        };
        if this.port.is_some() {
            match this.write(0) {
                Ok(()) => debug!("Parallel port set to zero"),
                Err(e) => warn!("Failed to send initial zero trigger: {}", e),
            }
        }
        this
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, value: u8) -> Result<(), TriggerError> {
        let port = self.port.as_ref().ok_or(TriggerError::Unavailable)?;
        write_at(port, value, self.address).map_err(|source| TriggerError::Write {
            code: value,
            source,
        })
    }
}

impl TriggerSink for ParallelPort {
    fn send(&mut self, trigger: Trigger) -> Result<(), TriggerError> {
        self.write(trigger.code())?;
        self.timer.sleep(self.latency);
        self.write(0)?;
        debug!("Trigger {} sent", trigger);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Parallel port closed");
        }
    }

    fn describe(&self) -> String {
        format!("parallel {:#06x} ({})", self.address, self.device.display())
    }
}

#[cfg(unix)]
fn write_at(port: &File, value: u8, address: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    port.write_all_at(&[value], address)
}

#[cfg(not(unix))]
fn write_at(_port: &File, _value: u8, _address: u64) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "port I/O through a device file requires a unix host",
    ))
}
