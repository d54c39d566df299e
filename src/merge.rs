//! Merge cached inventories into the combined JSON and CSV outputs.
//!
//! Records stay opaque JSON objects so every published field survives the
//! merge; only the handful of fields used for filtering, deduplication and
//! the CSV projection are ever inspected.
//!
//! Steps, in order:
//! 1. Load each reference's cached payload (missing payloads are skipped)
//! 2. Stamp every dataset record with the owning agency's name
//! 3. Drop non-object entries and records whose `accessLevel` is `-`
//! 4. Deduplicate on `identifier` + `publisher.name`, last write wins
//! 5. Write the JSON array and the CSV projection

use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

use crate::error::PipelineError;
use crate::layout::DataLayout;
use crate::model::{InventoryReference, parse_document};

/// A dataset record from an inventory.
pub type Record = Map<String, Value>;

/// Upstream placeholder for an unset access level.
pub const UNSET_ACCESS_LEVEL: &str = "-";

/// Field added to every record with the owning agency's display name.
pub const AGENCY_FIELD: &str = "agency";

/// Header of the CSV export.
pub const CSV_HEADER: [&str; 5] = ["agency", "publisher", "title", "description", "access"];

/// Result of the merge stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Both outputs already existed and no refresh was requested.
    AlreadyMerged,
    /// Outputs were (re)generated.
    Merged(MergeReport),
}

/// Counts from a merge run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// References whose cached payload was loaded.
    pub loaded_references: usize,
    /// Dataset entries seen across all payloads.
    pub records_seen: usize,
    /// Entries dropped as malformed or placeholder.
    pub records_filtered: usize,
    /// Records that overwrote an earlier record with the same key.
    pub duplicates_replaced: usize,
    /// Records written to the outputs.
    pub records_written: usize,
}

/// Merges every cached payload into the combined outputs.
///
/// A no-op when both outputs exist and `refresh` is not set.
///
/// # Errors
///
/// Returns [`PipelineError`] if an output file cannot be written. Missing or
/// unreadable payloads are skipped, never errors.
#[instrument(skip(layout, references), fields(references = references.len()))]
pub fn merge_inventories(
    layout: &DataLayout,
    references: &[InventoryReference],
    refresh: bool,
) -> Result<MergeOutcome, PipelineError> {
    let json_path = layout.merged_json();
    let csv_path = layout.merged_csv();
    if !refresh && json_path.exists() && csv_path.exists() {
        info!("Master files already created");
        return Ok(MergeOutcome::AlreadyMerged);
    }

    info!("Combining data");

    let mut report = MergeReport::default();
    let mut records = Vec::new();
    for reference in references {
        let path = layout.payload_path(reference.id());
        if !path.exists() {
            debug!(id = %reference.id(), "No cached inventory, skipping");
            continue;
        }
        let Some(entries) = load_dataset(&path) else {
            continue;
        };
        report.loaded_references += 1;
        records.extend(stamp_agency(entries, reference.agency()));
    }

    report.records_seen = records.len();
    let kept = filter_records(records);
    report.records_filtered = report.records_seen - kept.len();

    let (merged, replaced) = dedupe_records(kept);
    report.duplicates_replaced = replaced;
    report.records_written = merged.len();

    write_json(&json_path, &merged)?;
    write_csv(&csv_path, &merged)?;

    info!(
        loaded = report.loaded_references,
        seen = report.records_seen,
        filtered = report.records_filtered,
        replaced = report.duplicates_replaced,
        written = report.records_written,
        "Master data files saved"
    );
    Ok(MergeOutcome::Merged(report))
}

/// Reads a cached payload and returns its `dataset` entries.
///
/// Unreadable payloads and payloads without a `dataset` array are logged
/// and yield `None`.
fn load_dataset(path: &Path) -> Option<Vec<Value>> {
    let raw = match std::fs::read(path) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read cached inventory");
            return None;
        }
    };
    let document = match parse_document(&raw) {
        Ok(document) => document,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cached inventory is not valid JSON");
            return None;
        }
    };
    let entries = dataset_entries(document);
    if entries.is_none() {
        warn!(path = %path.display(), "Cached inventory has no dataset array");
    }
    entries
}

/// Extracts the `dataset` array of an inventory document.
#[must_use]
pub fn dataset_entries(document: Value) -> Option<Vec<Value>> {
    match document {
        Value::Object(mut fields) => match fields.remove("dataset") {
            Some(Value::Array(entries)) => Some(entries),
            _ => None,
        },
        _ => None,
    }
}

/// Sets the agency field on every object entry; other entries pass through.
#[must_use]
pub fn stamp_agency(entries: Vec<Value>, agency: &str) -> Vec<Value> {
    entries
        .into_iter()
        .map(|mut entry| {
            if let Value::Object(fields) = &mut entry {
                fields.insert(AGENCY_FIELD.to_string(), Value::String(agency.to_string()));
            }
            entry
        })
        .collect()
}

/// Keeps object entries whose access level is not the unset placeholder.
#[must_use]
pub fn filter_records(entries: Vec<Value>) -> Vec<Record> {
    entries
        .into_iter()
        .filter_map(|entry| match entry {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .filter(|record| {
            record.get("accessLevel").and_then(Value::as_str) != Some(UNSET_ACCESS_LEVEL)
        })
        .collect()
}

/// Deduplication key: `identifier` followed by `publisher.name`.
#[must_use]
pub fn dedup_key(record: &Record) -> String {
    let identifier = field_text(record.get("identifier"));
    let publisher = field_text(publisher_name(record));
    format!("{identifier}{publisher}")
}

/// Collapses records sharing a key; the last one wins.
///
/// The surviving record takes the position of the first record with its
/// key. Returns the records and how many earlier records were replaced.
#[must_use]
pub fn dedupe_records(records: Vec<Record>) -> (Vec<Record>, usize) {
    let mut by_key: IndexMap<String, Record> = IndexMap::with_capacity(records.len());
    let mut replaced = 0;
    for record in records {
        if by_key.insert(dedup_key(&record), record).is_some() {
            replaced += 1;
        }
    }
    (by_key.into_values().collect(), replaced)
}

/// Projects a record onto the CSV columns.
#[must_use]
pub fn csv_row(record: &Record) -> [String; 5] {
    [
        field_text(record.get(AGENCY_FIELD)),
        field_text(publisher_name(record)),
        field_text(record.get("title")),
        field_text(record.get("description")),
        field_text(record.get("accessLevel")),
    ]
}

fn publisher_name(record: &Record) -> Option<&Value> {
    record.get("publisher").and_then(|publisher| publisher.get("name"))
}

// Strings verbatim, other scalars as JSON text, missing or null as empty.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

fn write_json(path: &Path, records: &[Record]) -> Result<(), PipelineError> {
    let raw = serde_json::to_vec(records).map_err(|e| PipelineError::json(path, e))?;
    std::fs::write(path, raw).map_err(|e| PipelineError::io(path, e))
}

fn write_csv(path: &Path, records: &[Record]) -> Result<(), PipelineError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| PipelineError::csv(path, e))?;

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| PipelineError::csv(path, e))?;
    for record in records {
        writer
            .write_record(csv_row(record))
            .map_err(|e| PipelineError::csv(path, e))?;
    }
    writer.flush().map_err(|e| PipelineError::io(path, e))
}
