//! User-Agent string for directory and inventory requests.
//!
//! Agency webmasters see this in their logs, so it names the tool and links
//! back to the project.

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/datajson-harvester";

/// Default User-Agent for every request the harvester issues.
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("datajson-harvester/{version} (open-data-inventory; +{PROJECT_UA_URL})")
}
