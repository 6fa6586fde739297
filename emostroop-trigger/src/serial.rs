use crate::error::TriggerError;
use crate::sink::TriggerSink;
use emostroop_core::Trigger;
use emostroop_timing::{HighPrecisionTimer, Timer};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Serial trigger box: each trigger is a single byte.
pub struct SerialPort {
    path: PathBuf,
    baud: u32,
    latency: Duration,
    port: Option<File>,
    timer: HighPrecisionTimer,
}

impl SerialPort {
    /// Opens the device in raw mode at `baud`. Failure to open leaves the
    /// sink unavailable; failure to configure the line is only logged.
    pub fn open(path: impl AsRef<Path>, baud: u32, latency: Duration) -> Self {
        let path = path.as_ref().to_path_buf();
        let port = match open_device(&path) {
            Ok(f) => {
                if let Err(e) = configure_line(&f, baud) {
                    warn!("Serial line settings not applied to {}: {}", path.display(), e);
                }
                info!("Serial port opened: {} @ {} baud", path.display(), baud);
                Some(f)
            }
            Err(e) => {
                warn!("The serial port couldn't be opened ({}): {}", path.display(), e);
                None
            }
        };
        Self {
            path,
            baud,
            latency,
            port,
            timer: HighPrecisionTimer::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write(&mut self, value: u8) -> Result<(), TriggerError> {
        let port = self.port.as_mut().ok_or(TriggerError::Unavailable)?;
        port.write_all(&[value])
            .and_then(|_| port.flush())
            .map_err(|source| TriggerError::Write {
                code: value,
                source,
            })
    }
}

impl TriggerSink for SerialPort {
    fn send(&mut self, trigger: Trigger) -> Result<(), TriggerError> {
        self.write(trigger.code())?;
        self.timer.sleep(self.latency);
        self.write(0)?;
        debug!("Trigger {} sent", trigger);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("Serial port closed");
        }
    }

    fn describe(&self) -> String {
        format!("serial {} @ {}", self.path.display(), self.baud)
    }
}

#[cfg(unix)]
fn open_device(path: &Path) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .read(true)
        .write(true)
        .custom_flags(libc::O_NOCTTY)
        .open(path)
}

#[cfg(not(unix))]
fn open_device(path: &Path) -> io::Result<File> {
    OpenOptions::new().read(true).write(true).open(path)
}

#[cfg(unix)]
fn configure_line(port: &File, baud: u32) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;

    let speed = match baud {
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        other => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported baud rate {other}"),
            ));
        }
    };

    let fd = port.as_raw_fd();
    unsafe {
        let mut tio: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut tio) != 0 {
            return Err(io::Error::last_os_error());
        }
        libc::cfmakeraw(&mut tio);
        if libc::cfsetspeed(&mut tio, speed) != 0 {
            return Err(io::Error::last_os_error());
        }
        if libc::tcsetattr(fd, libc::TCSANOW, &tio) != 0 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn configure_line(_port: &File, _baud: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "line configuration requires a unix host",
    ))
}
