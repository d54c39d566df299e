//! Progress UI (spinner) for the probe and download stages.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use harvester_core::PoolProgress;
use indicatif::{ProgressBar, ProgressStyle};

/// A labelled pool to report on.
pub(crate) type Stage = (&'static str, Arc<PoolProgress>);

pub(crate) fn is_dumb_terminal() -> bool {
    std::env::var("TERM")
        .map(|value| value.eq_ignore_ascii_case("dumb"))
        .unwrap_or(false)
}

pub(crate) fn should_use_spinner(stderr_is_terminal: bool, dumb_terminal: bool) -> bool {
    stderr_is_terminal && !dumb_terminal
}

/// Spawns the spinner when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    stages: Vec<Stage>,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner_inner(stages, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_spinner_inner(stages: Vec<Stage>, stop: Arc<AtomicBool>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            spinner.set_message(stage_message(&stages));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        spinner.finish_and_clear();
    })
}

/// Message for the first stage that still has unsettled work.
fn stage_message(stages: &[Stage]) -> String {
    stages
        .iter()
        .find(|(_, progress)| progress.total() > 0 && progress.settled() < progress.total())
        .map_or_else(
            || "Working...".to_string(),
            |(label, progress)| {
                format!("[{}/{}] {label}...", progress.settled(), progress.total())
            },
        )
}
