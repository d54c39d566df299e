//! HTTP fetching and bounded concurrency for the pipeline stages.
//!
//! # Features
//!
//! - Single-shot GET with a 120 second request timeout
//! - Only HTTP 200 counts as success
//! - Structured error types with the failing URL
//! - Fixed-size worker pool with an explicit fan-in barrier

mod client;
mod constants;
mod error;
mod pool;

pub use client::{HttpClient, HttpClientBuilder};
pub use constants::{
    CONNECT_TIMEOUT_SECS, DOWNLOAD_CONCURRENCY, MIN_INVENTORY_BYTES, PROBE_CONCURRENCY,
    REQUEST_TIMEOUT_SECS,
};
pub use error::FetchError;
pub use pool::{PoolError, PoolProgress, WorkerPool};
