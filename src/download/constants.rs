//! Constants for the download module (timeouts, pool sizes, thresholds).

/// Default per-request timeout (2 minutes; some agency servers are slow).
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Default connect timeout, bounded by the request timeout.
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Concurrent probes against candidate domains.
pub const PROBE_CONCURRENCY: usize = 5;

/// Concurrent inventory downloads.
pub const DOWNLOAD_CONCURRENCY: usize = 4;

/// An inventory body must be strictly longer than this to be cached.
pub const MIN_INVENTORY_BYTES: usize = 20;
