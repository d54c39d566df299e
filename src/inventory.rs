//! Inventory download stage.
//!
//! Re-downloads discovered inventories into the slug-keyed cache. References
//! that already have a cached payload are skipped unless a refresh is
//! requested. A failed download leaves the cache path untouched and never
//! fails the stage.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::download::{FetchError, HttpClient, WorkerPool};
use crate::error::PipelineError;
use crate::layout::DataLayout;
use crate::model::InventoryReference;

/// Per-item download failure.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The request failed or the body was rejected.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The body could not be written to the cache.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// Cache path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

/// A reference whose download failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFailure {
    /// Slug of the owning domain.
    pub id: String,
    /// Inventory URL that was requested.
    pub url: String,
    /// Rendered error message.
    pub message: String,
}

/// Result of the download stage.
#[derive(Debug, Clone, Default)]
pub struct DownloadReport {
    /// Payloads fetched and written in this run.
    pub downloaded: usize,
    /// References skipped because a cached payload already existed.
    pub cached: usize,
    /// References whose download failed.
    pub failures: Vec<DownloadFailure>,
}

impl DownloadReport {
    /// Number of failed downloads.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// Downloads every reference without a cached payload (all of them on refresh).
///
/// # Errors
///
/// Returns [`PipelineError::Pool`] only if the worker pool itself fails.
/// Individual download failures are collected in the report.
#[instrument(skip(client, layout, pool, references), fields(references = references.len()))]
pub async fn download_inventories(
    client: &HttpClient,
    layout: &DataLayout,
    pool: &WorkerPool,
    references: &[InventoryReference],
    refresh: bool,
    min_bytes: usize,
) -> Result<DownloadReport, PipelineError> {
    info!("Downloading data.json files if needed");

    let (pending, cached): (Vec<&InventoryReference>, Vec<&InventoryReference>) = references
        .iter()
        .partition(|reference| refresh || !layout.payload_path(reference.id()).exists());

    for reference in &cached {
        debug!(id = %reference.id(), "Inventory already cached");
    }

    let pending: Vec<InventoryReference> = pending.into_iter().cloned().collect();
    let outcomes = pool
        .run(pending, |reference| {
            let client = client.clone();
            let layout = layout.clone();
            async move {
                let result = download_inventory(&client, &layout, &reference, min_bytes).await;
                (reference, result)
            }
        })
        .await?;

    let mut report = DownloadReport {
        cached: cached.len(),
        ..DownloadReport::default()
    };
    for (reference, result) in outcomes {
        match result {
            Ok(_) => report.downloaded += 1,
            Err(e) => {
                warn!(
                    id = %reference.id(),
                    url = %reference.data_url,
                    error = %e,
                    "Error getting inventory file"
                );
                report.failures.push(DownloadFailure {
                    id: reference.id().to_string(),
                    url: reference.data_url.clone(),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        downloaded = report.downloaded,
        cached = report.cached,
        failed = report.failed(),
        "Inventory downloads complete"
    );
    Ok(report)
}

/// Downloads one inventory and writes it verbatim to its cache path.
///
/// The body must be strictly longer than `min_bytes`.
///
/// # Errors
///
/// Returns [`InventoryError`] if the fetch fails, the body is too short, or
/// the cache file cannot be written. Nothing is written on failure.
pub async fn download_inventory(
    client: &HttpClient,
    layout: &DataLayout,
    reference: &InventoryReference,
    min_bytes: usize,
) -> Result<PathBuf, InventoryError> {
    let url = &reference.data_url;
    info!(url = %url, "Downloading inventory");

    let body = client.get_bytes(url).await?;
    if body.len() <= min_bytes {
        return Err(FetchError::too_short(url.as_str(), body.len(), min_bytes).into());
    }

    let path = layout.payload_path(reference.id());
    tokio::fs::write(&path, &body)
        .await
        .map_err(|source| InventoryError::Io {
            path: path.clone(),
            source,
        })?;

    debug!(path = %path.display(), bytes = body.len(), "Inventory cached");
    Ok(path)
}
