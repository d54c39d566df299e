//! Inventory discovery across candidate domains.
//!
//! Every federal candidate is probed at `http://<domain>/data.json`, then
//! once more at `http://www.<domain>/data.json` if the bare host fails.
//! Found bodies are cached under the candidate's slug and the resolved
//! references are persisted as the input of the download stage.
//!
//! Most domains publish no inventory, so an unresolved candidate is an
//! expected outcome and is only logged at debug level.

use std::path::Path;

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::download::{FetchError, HttpClient, WorkerPool};
use crate::error::PipelineError;
use crate::layout::DataLayout;
use crate::model::{DomainCandidate, InventoryReference, parse_document};
use crate::source::{federal_candidates, read_candidates};

/// Conventional inventory location on an agency host.
pub const INVENTORY_PATH: &str = "/data.json";

/// Result of the discovery stage.
#[derive(Debug, Clone, Default)]
pub struct ProbeReport {
    /// Candidates probed in this run (zero when the persisted list was reused).
    pub probed: usize,
    /// Resolved references in directory order.
    pub references: Vec<InventoryReference>,
    /// Whether the persisted list was loaded instead of probing.
    pub reused_list: bool,
}

impl ProbeReport {
    /// Number of candidates with a discovered inventory.
    #[must_use]
    pub fn found(&self) -> usize {
        self.references.len()
    }

    /// Number of probed candidates without an inventory.
    #[must_use]
    pub fn unresolved(&self) -> usize {
        self.probed.saturating_sub(self.found())
    }
}

/// Outcome of probing a single candidate.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// An inventory was found and cached.
    Found(InventoryReference),
    /// Neither host variant produced an inventory.
    Unresolved {
        /// The candidate that was probed.
        candidate: DomainCandidate,
        /// Why the last attempt failed.
        reason: String,
    },
}

/// Why a single probe attempt did not count as found.
#[derive(Debug, thiserror::Error)]
enum ProbeMiss {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{url} did not return a JSON object or array")]
    NotInventory { url: String },

    #[error("failed to cache inventory at {path}: {source}")]
    Cache {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Builds the probe URL for `host`, optionally `www.`-prefixed.
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] if the host cannot form a valid URL.
pub fn inventory_url(host: &str, www: bool) -> Result<String, FetchError> {
    let raw = if www {
        format!("http://www.{host}{INVENTORY_PATH}")
    } else {
        format!("http://{host}{INVENTORY_PATH}")
    };
    let url = Url::parse(&raw).map_err(|_| FetchError::invalid_url(&raw))?;
    Ok(url.into())
}

/// Runs discovery unless a persisted reference list can be reused.
///
/// The list is reused when it exists and `refresh` is not set. Otherwise
/// the cached directory CSV is read, filtered to federal agencies, and
/// probed with `pool`.
///
/// # Errors
///
/// Returns [`PipelineError`] if the directory or list files cannot be read
/// or written. Individual probe failures are never errors.
#[instrument(skip(client, layout, pool))]
pub async fn discover_inventories(
    client: &HttpClient,
    layout: &DataLayout,
    pool: &WorkerPool,
    refresh: bool,
) -> Result<ProbeReport, PipelineError> {
    let list_path = layout.inventory_list();
    if !refresh && list_path.exists() {
        let references = load_references(&list_path)?;
        info!(
            references = references.len(),
            "Found existing data inventories list"
        );
        return Ok(ProbeReport {
            probed: 0,
            references,
            reused_list: true,
        });
    }

    let candidates = federal_candidates(read_candidates(&layout.directory_csv())?);
    info!(
        domains = candidates.len(),
        "Looking for data.json on federal domains (this can take a long time)"
    );
    probe_candidates(client, layout, pool, candidates).await
}

/// Probes every candidate, caches found payloads, and persists the list.
///
/// # Errors
///
/// Returns [`PipelineError`] if the pool fails or the list cannot be written.
pub async fn probe_candidates(
    client: &HttpClient,
    layout: &DataLayout,
    pool: &WorkerPool,
    candidates: Vec<DomainCandidate>,
) -> Result<ProbeReport, PipelineError> {
    let probed = candidates.len();
    let outcomes = pool
        .run(candidates, |candidate| {
            let client = client.clone();
            let layout = layout.clone();
            async move { probe_candidate(&client, &layout, candidate).await }
        })
        .await?;

    let references: Vec<InventoryReference> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome {
            ProbeOutcome::Found(reference) => Some(reference),
            ProbeOutcome::Unresolved { .. } => None,
        })
        .collect();

    save_references(&layout.inventory_list(), &references)?;

    let report = ProbeReport {
        probed,
        references,
        reused_list: false,
    };
    info!(
        probed = report.probed,
        found = report.found(),
        unresolved = report.unresolved(),
        "Inventory discovery complete"
    );
    Ok(report)
}

/// Probes one candidate: bare host first, then the `www.` host.
pub async fn probe_candidate(
    client: &HttpClient,
    layout: &DataLayout,
    candidate: DomainCandidate,
) -> ProbeOutcome {
    let host = candidate.host();
    let mut last_miss = None;

    for www in [false, true] {
        match try_location(client, layout, &candidate, &host, www).await {
            Ok(url) => {
                info!(url = %url, "Data found");
                return ProbeOutcome::Found(InventoryReference::new(candidate, url));
            }
            Err(miss) => {
                debug!(domain = %host, www, reason = %miss, "No inventory at location");
                last_miss = Some(miss);
            }
        }
    }

    ProbeOutcome::Unresolved {
        candidate,
        reason: last_miss.map(|miss| miss.to_string()).unwrap_or_default(),
    }
}

async fn try_location(
    client: &HttpClient,
    layout: &DataLayout,
    candidate: &DomainCandidate,
    host: &str,
    www: bool,
) -> Result<String, ProbeMiss> {
    let url = inventory_url(host, www)?;
    let body = client.get_bytes(&url).await?;

    let is_inventory = parse_document(&body)
        .map(|doc| doc.is_object() || doc.is_array())
        .unwrap_or(false);
    if !is_inventory {
        return Err(ProbeMiss::NotInventory { url });
    }

    let path = layout.payload_path(&candidate.id);
    if let Err(source) = tokio::fs::write(&path, &body).await {
        warn!(path = %path.display(), error = %source, "Failed to cache inventory");
        return Err(ProbeMiss::Cache {
            path: path.display().to_string(),
            source,
        });
    }
    Ok(url)
}

/// Loads a persisted reference list.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] or [`PipelineError::Json`] if the file
/// cannot be read or parsed.
pub fn load_references(path: &Path) -> Result<Vec<InventoryReference>, PipelineError> {
    let raw = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_slice(&raw).map_err(|e| PipelineError::json(path, e))
}

/// Persists the reference list as a JSON array.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] or [`PipelineError::Json`] on failure.
pub fn save_references(
    path: &Path,
    references: &[InventoryReference],
) -> Result<(), PipelineError> {
    let raw = serde_json::to_vec(references).map_err(|e| PipelineError::json(path, e))?;
    std::fs::write(path, raw).map_err(|e| PipelineError::io(path, e))
}
