#[path = "resilient/config.rs"]
mod config;

#[path = "resilient/clock.rs"]
mod clock;

#[path = "resilient/wrapper.rs"]
mod wrapper;

pub use clock::{Clock, TokioClock};
pub use config::ResilienceConfig;
pub use wrapper::Resilient;
