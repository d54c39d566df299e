//! Domain directory rows and discovered inventory references.
//!
//! Both serialize with the directory's own column names so the persisted
//! reference list reads like the directory it came from.

use serde::{Deserialize, Serialize};

/// Directory classification of domains that get probed.
pub const FEDERAL_AGENCY: &str = "Federal Agency";

/// One row of the domain directory CSV.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct DirectoryRow {
    #[serde(rename = "Domain Name")]
    pub(crate) domain_name: String,
    #[serde(rename = "Domain Type")]
    pub(crate) domain_type: String,
    #[serde(rename = "Agency")]
    pub(crate) agency: String,
    #[serde(rename = "City", default)]
    pub(crate) city: Option<String>,
    #[serde(rename = "State", default)]
    pub(crate) state: Option<String>,
}

/// A candidate domain with its derived slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainCandidate {
    /// Registered domain name as listed in the directory.
    #[serde(rename = "Domain Name")]
    pub domain_name: String,
    /// Directory classification, e.g. `Federal Agency`.
    #[serde(rename = "Domain Type")]
    pub domain_type: String,
    /// Owning agency display name.
    #[serde(rename = "Agency")]
    pub agency: String,
    #[serde(rename = "City", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "State", default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Filesystem-safe key for cache files.
    pub id: String,
}

impl DomainCandidate {
    /// Builds a candidate from its parts, deriving the slug.
    #[must_use]
    pub fn new(
        domain_name: impl Into<String>,
        domain_type: impl Into<String>,
        agency: impl Into<String>,
    ) -> Self {
        let domain_name = domain_name.into();
        let id = slug_for(&domain_name);
        Self {
            domain_name,
            domain_type: domain_type.into(),
            agency: agency.into(),
            city: None,
            state: None,
            id,
        }
    }

    pub(crate) fn from_row(row: DirectoryRow) -> Self {
        let id = slug_for(&row.domain_name);
        Self {
            domain_name: row.domain_name,
            domain_type: row.domain_type,
            agency: row.agency,
            city: row.city.filter(|value| !value.is_empty()),
            state: row.state.filter(|value| !value.is_empty()),
            id,
        }
    }

    /// Whether the directory classifies this domain as a federal agency.
    #[must_use]
    pub fn is_federal_agency(&self) -> bool {
        self.domain_type == FEDERAL_AGENCY
    }

    /// Host used to build probe URLs: the lowercased, trimmed domain name.
    #[must_use]
    pub fn host(&self) -> String {
        self.domain_name.trim().to_lowercase()
    }
}

/// A candidate whose inventory was found at `data_url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryReference {
    #[serde(flatten)]
    pub candidate: DomainCandidate,
    /// Resolved inventory URL.
    #[serde(rename = "Data URL")]
    pub data_url: String,
}

impl InventoryReference {
    #[must_use]
    pub fn new(candidate: DomainCandidate, data_url: impl Into<String>) -> Self {
        Self {
            candidate,
            data_url: data_url.into(),
        }
    }

    /// Slug of the owning domain.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    /// Display name stamped onto merged records.
    #[must_use]
    pub fn agency(&self) -> &str {
        &self.candidate.agency
    }
}

/// Parses an inventory document, tolerating a leading UTF-8 byte-order mark.
///
/// # Errors
///
/// Returns the serde error if the bytes are not valid JSON.
pub fn parse_document(bytes: &[u8]) -> serde_json::Result<serde_json::Value> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    serde_json::from_slice(bytes)
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Derives the cache slug: lowercase, all whitespace removed.
#[must_use]
pub fn slug_for(domain_name: &str) -> String {
    domain_name
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
