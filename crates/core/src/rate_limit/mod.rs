//! Hourly request quotas per task type

pub mod limiter;

pub use limiter::RateLimiter;
