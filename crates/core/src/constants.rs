/// TTL for cached valuation summaries, in seconds.
pub const SUMMARY_CACHE_TTL_SECS: u64 = 600;

/// TTL for cached position breakdowns, in seconds.
pub const POSITIONS_CACHE_TTL_SECS: u64 = 600;

/// TTL for the per-portfolio dirty marker, in seconds.
pub const DIRTY_MARKER_TTL_SECS: u64 = 300;

/// Small fixed enqueue delay that batches bursts of writes, in milliseconds.
pub const RECOMPUTE_DELAY_MS: u64 = 250;

/// Maximum delivery attempts for a recompute job.
pub const RECOMPUTE_MAX_ATTEMPTS: u32 = 5;

/// Base delay for exponential retry backoff, in milliseconds.
pub const RECOMPUTE_BACKOFF_BASE_MS: u64 = 2_000;

/// Retry hint returned to readers while a recompute is pending, in milliseconds.
pub const READ_RETRY_AFTER_MS: u64 = 1_500;

/// Job kind for valuation recomputes.
pub const RECOMPUTE_JOB_KIND: &str = "recompute-valuation";
