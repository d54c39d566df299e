//! Harvester Core Library
//!
//! This library discovers, downloads and merges the open-data inventories
//! (`data.json`) published by United States federal agency domains.
//!
//! # Architecture
//!
//! The pipeline runs four stages in order:
//! - [`source`] - Fetch and cache the directory of `.gov` domains
//! - [`probe`] - Find which federal domains publish an inventory
//! - [`inventory`] - Download discovered inventories into the cache
//! - [`merge`] - Combine, filter and deduplicate records into JSON and CSV
//!
//! Supporting modules:
//! - [`download`] - HTTP client and bounded worker pool
//! - [`config`] / [`layout`] - Run settings and on-disk file layout
//! - [`pipeline`] - Sequential driver for the stages

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod download;
pub mod error;
pub mod inventory;
pub mod layout;
pub mod merge;
pub mod model;
pub mod pipeline;
pub mod probe;
pub mod source;

mod user_agent;

// Re-export commonly used types
pub use config::{ConfigError, PipelineConfig};
pub use download::{FetchError, HttpClient, PoolError, PoolProgress, WorkerPool};
pub use error::PipelineError;
pub use inventory::{DownloadReport, download_inventories};
pub use layout::DataLayout;
pub use merge::{MergeOutcome, MergeReport, merge_inventories};
pub use model::{DomainCandidate, InventoryReference};
pub use pipeline::{Pipeline, PipelineSummary};
pub use probe::{ProbeReport, discover_inventories};
pub use source::{SourceStatus, acquire_directory};
