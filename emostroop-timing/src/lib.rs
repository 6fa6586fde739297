pub mod scheduler;
pub mod timer;

pub use scheduler::{Scheduler, Wake};
pub use timer::{FrameStats, HighPrecisionTimer, Timer};
