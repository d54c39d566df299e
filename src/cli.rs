//! CLI argument definitions using clap derive macros.

use clap::Parser;

/// Literal argument that forces every stage to rerun.
pub const REFRESH: &str = "refresh";

/// Discover, download and merge federal agency data.json inventories.
///
/// Cached files in the data directory are reused between runs; pass
/// `refresh` to fetch, probe, download and merge everything again.
/// Set RUST_LOG to change log verbosity.
#[derive(Parser, Debug)]
#[command(name = "harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Pass `refresh` to ignore every cached file
    #[arg(value_parser = [REFRESH])]
    pub mode: Option<String>,
}

impl Args {
    /// Whether a full refresh was requested.
    #[must_use]
    pub fn refresh(&self) -> bool {
        self.mode.as_deref() == Some(REFRESH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_args_uses_cache() {
        let args = Args::try_parse_from(["harvester"]).unwrap();
        assert!(args.mode.is_none());
        assert!(!args.refresh());
    }

    #[test]
    fn test_cli_refresh_argument_sets_refresh() {
        let args = Args::try_parse_from(["harvester", "refresh"]).unwrap();
        assert!(args.refresh());
    }

    #[test]
    fn test_cli_unknown_positional_rejected() {
        let result = Args::try_parse_from(["harvester", "fresh"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn test_cli_extra_argument_rejected() {
        let result = Args::try_parse_from(["harvester", "refresh", "refresh"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let result = Args::try_parse_from(["harvester", "--invalid-flag"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Args::try_parse_from(["harvester", "--help"]);
        let err = result.unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
