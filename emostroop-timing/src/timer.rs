use std::time::{Duration, Instant};

/// Monotonic clock with a blocking high-precision sleep.
pub trait Timer: Clone + Send + Sync {
    /// Nanoseconds since the timer was created.
    fn now(&self) -> u64;
    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
    fn sleep(&self, d: Duration);
}

/// Summary of recorded frame-present durations.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub samples: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
}

#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    start: Instant,
    frame_times: Vec<Duration>,
    max_samples: usize,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }
    fn sleep(&self, d: Duration) {
        high_precision_sleep(d)
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: Vec::with_capacity(1000),
            max_samples: 1000,
        }
    }

    /// Keeps the most recent `max_samples` present durations.
    pub fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.remove(0);
        }
        self.frame_times.push(d);
    }

    pub fn frame_stats(&self) -> FrameStats {
        let times: Vec<f64> = self
            .frame_times
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return FrameStats::default();
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        FrameStats {
            samples: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: times.iter().cloned().fold(f64::INFINITY, f64::min),
            max_frame_time_ns: times.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sleeps for `duration` using the most precise primitive of the platform.
pub fn high_precision_sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    #[cfg(target_os = "linux")]
    linux_sleep(duration);
    #[cfg(target_os = "macos")]
    macos_sleep(duration);
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    std::thread::sleep(duration);
}

#[cfg(target_os = "linux")]
fn linux_sleep(duration: Duration) {
    use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

    let req = timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };

    unsafe {
        clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
    }
}

#[cfg(target_os = "macos")]
fn macos_sleep(duration: Duration) {
    use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

    // Spin below 100µs, the scheduler cannot wake us that precisely.
    if duration.as_nanos() < 100_000 {
        unsafe {
            let start = mach_absolute_time();
            let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
            mach_timebase_info(&mut timebase);

            let target_ticks =
                duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

            while mach_absolute_time() - start < target_ticks {
                std::hint::spin_loop();
            }
        }
    } else {
        std::thread::sleep(duration);
    }
}
