//! Rate limiting logic and state management.

mod clock;
mod limiter;
mod model;
mod rules;
mod window;

pub use clock::{Clock, TokioClock};
pub use limiter::RateLimiter;
pub use model::{ModelKey, DEFAULT_SUFFIXES};
pub use rules::{LimitTable, LimitTableConfig, DEFAULT_LIMIT};
pub use window::{AdmissionHistory, DEFAULT_WINDOW};
