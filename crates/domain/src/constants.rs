//! Application constants
//!
//! Centralized location for domain-level constants used throughout the
//! scheduling engine.

// Daylight window for preferred task times, as seconds from midnight
// (inclusive on both ends: 06:00 through 18:00)
pub const DAYLIGHT_START_SECS: u32 = 6 * 3_600;
pub const DAYLIGHT_END_SECS: u32 = 18 * 3_600;

// Custom frequency bounds (days)
pub const MIN_CUSTOM_DAYS: u16 = 1;
pub const MAX_CUSTOM_DAYS: u16 = 90;

// Completion bookkeeping
pub const COMPLETION_WINDOW_DAYS: u32 = 30;
pub const MAX_COMPLETION_RATE: f64 = 100.0;

// Environmental adjustment for hot-weather watering
pub const HOT_WEATHER_THRESHOLD_C: f64 = 30.0;
pub const HOT_WEATHER_ADVANCE_HOURS: i64 = 6;

// Environmental factor sanity ranges
pub const MIN_TEMPERATURE_C: f64 = -30.0;
pub const MAX_TEMPERATURE_C: f64 = 60.0;
pub const MIN_HUMIDITY_PCT: f64 = 0.0;
pub const MAX_HUMIDITY_PCT: f64 = 100.0;
pub const MIN_LIGHT_LUX: f64 = 0.0;
pub const MAX_LIGHT_LUX: f64 = 200_000.0;

// Notification queue defaults
pub const DEFAULT_LEAD_TIME_SECS: u64 = 30 * 60;
pub const DEFAULT_PAST_DUE_CLAMP_SECS: u64 = 5 * 60;
pub const DEFAULT_NOTIFICATION_MAX_RETRIES: u32 = 3;
pub const DEFAULT_NOTIFICATION_RETRY_DELAY_SECS: u64 = 5 * 60;
pub const QUEUE_KEY_PREFIX: &str = "notifications";

// Rate limiting defaults (requests per hour)
pub const DEFAULT_HOURLY_LIMIT: u64 = 1_000;
pub const WATER_HOURLY_LIMIT: u64 = 100;
pub const FERTILIZER_HOURLY_LIMIT: u64 = 50;
pub const COMPOSTING_HOURLY_LIMIT: u64 = 30;
pub const RATE_LIMIT_KEY_PREFIX: &str = "ratelimit";

// Recommendation text bounds (characters)
pub const MIN_RECOMMENDATION_CHARS: usize = 10;
pub const MAX_RECOMMENDATION_CHARS: usize = 500;
