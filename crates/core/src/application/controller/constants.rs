// Engine constants (no magic values)

/// Gap between items in `immediate` mode (1s)
pub const DEFAULT_IMMEDIATE_DELAY_MS: i64 = 1000;

/// Throughput assumed by `immediate` estimates
pub const IMMEDIATE_ITEMS_PER_DAY: u64 = 10;

/// Creation attempts per item, first one included
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Retry base delay (1000ms = 1s)
pub const DEFAULT_RETRY_BASE_DELAY_MS: i64 = 1000;

pub const DEFAULT_BACKOFF_FACTOR: f64 = 2.0;

/// TLD used when a batch does not name one
pub const DEFAULT_TLD: &str = "com";

/// Geography used when neither the batch nor the keyword names one
pub const DEFAULT_GEO: &str = "US";
