pub mod schedule;
pub mod timer;

pub use schedule::{TimerQueue, TimerToken};
pub use timer::{HighPrecisionTimer, ManualTimer, Timer};
