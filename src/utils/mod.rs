//! Utility Module
//!
//! - [`time`]: frame timer and the [`Clock`] abstraction animation managers read

pub mod time;

pub use time::{Clock, ManualClock, Timer};
