pub mod config;
pub mod error;
pub mod parallel;
pub mod serial;
pub mod sink;

pub use config::{TriggerConfig, TriggerPort, open};
pub use error::TriggerError;
pub use parallel::ParallelPort;
pub use serial::SerialPort;
pub use sink::{NullSink, RecordingSink, TriggerSink};
