//! Sequential driver for the four harvest stages.
//!
//! Each stage completes before the next one starts. The probe and download
//! stages fan out over their own worker pools; everything else runs on the
//! calling task.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::PipelineConfig;
use crate::download::{HttpClient, PoolProgress, WorkerPool};
use crate::error::PipelineError;
use crate::inventory::{DownloadReport, download_inventories};
use crate::layout::DataLayout;
use crate::merge::{MergeOutcome, merge_inventories};
use crate::probe::{ProbeReport, discover_inventories};
use crate::source::{SourceStatus, acquire_directory};

/// What every stage did during one run.
#[derive(Debug, Clone)]
pub struct PipelineSummary {
    pub source: SourceStatus,
    pub probe: ProbeReport,
    pub downloads: DownloadReport,
    pub merge: MergeOutcome,
}

/// A configured pipeline ready to run.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    layout: DataLayout,
    client: HttpClient,
    probe_pool: WorkerPool,
    download_pool: WorkerPool,
}

impl Pipeline {
    /// Creates a pipeline with an HTTP client built from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Client`] if the HTTP client cannot be built,
    /// or [`PipelineError::Pool`] if a pool size is out of range.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let client = HttpClient::builder()
            .request_timeout(config.request_timeout)
            .build()
            .map_err(PipelineError::Client)?;
        Self::with_client(config, client)
    }

    /// Creates a pipeline that issues every request through `client`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Pool`] if a pool size is out of range.
    pub fn with_client(config: PipelineConfig, client: HttpClient) -> Result<Self, PipelineError> {
        let probe_pool = WorkerPool::new(config.probe_concurrency)?;
        let download_pool = WorkerPool::new(config.download_concurrency)?;
        Ok(Self {
            layout: config.layout(),
            config,
            client,
            probe_pool,
            download_pool,
        })
    }

    /// Progress counters of the probe stage.
    #[must_use]
    pub fn probe_progress(&self) -> Arc<PoolProgress> {
        self.probe_pool.progress()
    }

    /// Progress counters of the download stage.
    #[must_use]
    pub fn download_progress(&self) -> Arc<PoolProgress> {
        self.download_pool.progress()
    }

    /// The data directory layout this pipeline reads and writes.
    #[must_use]
    pub fn layout(&self) -> &DataLayout {
        &self.layout
    }

    /// Runs every stage in order.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if the data directory cannot be prepared,
    /// the domain directory cannot be retrieved, or a pipeline-owned file
    /// cannot be read or written.
    #[instrument(skip(self), fields(data_dir = %self.layout.root().display(), refresh = self.config.refresh))]
    pub async fn run(&self) -> Result<PipelineSummary, PipelineError> {
        let refresh = self.config.refresh;
        self.layout
            .ensure_dirs()
            .map_err(|e| PipelineError::io(self.layout.agencies_dir(), e))?;

        let source =
            acquire_directory(&self.client, &self.layout, &self.config.source_url, refresh).await?;

        let probe =
            discover_inventories(&self.client, &self.layout, &self.probe_pool, refresh).await?;

        let downloads = download_inventories(
            &self.client,
            &self.layout,
            &self.download_pool,
            &probe.references,
            refresh,
            self.config.min_inventory_bytes,
        )
        .await?;

        let merge = merge_inventories(&self.layout, &probe.references, refresh)?;

        info!(
            references = probe.found(),
            download_failures = downloads.failed(),
            "Pipeline complete"
        );
        Ok(PipelineSummary {
            source,
            probe,
            downloads,
            merge,
        })
    }
}
