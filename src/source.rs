//! Domain directory acquisition.
//!
//! The directory CSV is fetched once and cached verbatim; later runs reuse
//! the cached copy unless a refresh is requested. A failed fetch is the only
//! fatal error in the pipeline.

use std::path::Path;

use tracing::{info, instrument, warn};

use crate::download::HttpClient;
use crate::error::PipelineError;
use crate::layout::DataLayout;
use crate::model::{DirectoryRow, DomainCandidate};

/// How the directory cache was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceStatus {
    /// Existing cache file reused; no request issued.
    Cached,
    /// Directory fetched and written to the cache.
    Downloaded {
        /// Size of the cached file.
        bytes: usize,
    },
}

/// Ensures the domain directory CSV is present in the data directory.
///
/// # Errors
///
/// Returns [`PipelineError::SourceList`] if the fetch fails (transport error
/// or any status other than 200), or [`PipelineError::Io`] if the cache file
/// cannot be written.
#[instrument(skip(client, layout), fields(cache = %layout.directory_csv().display()))]
pub async fn acquire_directory(
    client: &HttpClient,
    layout: &DataLayout,
    source_url: &str,
    refresh: bool,
) -> Result<SourceStatus, PipelineError> {
    let cache_path = layout.directory_csv();
    if !refresh && cache_path.exists() {
        info!("Found existing domain directory");
        return Ok(SourceStatus::Cached);
    }

    info!(url = %source_url, "Downloading domain directory");
    let body = client
        .get_bytes(source_url)
        .await
        .map_err(|source| PipelineError::SourceList { source })?;

    tokio::fs::write(&cache_path, &body)
        .await
        .map_err(|e| PipelineError::io(&cache_path, e))?;

    Ok(SourceStatus::Downloaded { bytes: body.len() })
}

/// Parses every well-formed row of the directory CSV.
///
/// Rows missing a required column are skipped with a warning.
///
/// # Errors
///
/// Returns [`PipelineError::Csv`] if the file cannot be opened or its header
/// row cannot be read.
pub fn read_candidates(path: &Path) -> Result<Vec<DomainCandidate>, PipelineError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))?;
    reader
        .headers()
        .map_err(|e| PipelineError::csv(path, e))?;

    let mut candidates = Vec::new();
    for (index, record) in reader.deserialize::<DirectoryRow>().enumerate() {
        match record {
            Ok(row) => candidates.push(DomainCandidate::from_row(row)),
            Err(e) => warn!(row = index + 1, error = %e, "Skipping malformed directory row"),
        }
    }
    Ok(candidates)
}

/// Keeps only candidates classified as federal agencies, in directory order.
#[must_use]
pub fn federal_candidates(candidates: Vec<DomainCandidate>) -> Vec<DomainCandidate> {
    candidates
        .into_iter()
        .filter(DomainCandidate::is_federal_agency)
        .collect()
}
