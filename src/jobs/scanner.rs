// src/jobs/scanner.rs

//! Periodic rescanning of the job directory.

use std::collections::HashSet;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::engine::{JobId, RuntimeEvent};
use crate::jobs::JobSource;

/// Spawn the rescan task.
///
/// Every `period` (or as soon as `nudges` delivers a change notification) the
/// directory is listed and ids not reported before are sent as
/// [`RuntimeEvent::JobsDiscovered`]. Failures are sent as
/// [`RuntimeEvent::ScanFailed`]; deciding when they become fatal is up to the
/// core. The first scan happens one period after spawning, since the caller
/// performs the startup scan itself.
pub fn spawn_scanner(
    source: JobSource,
    period: Duration,
    already_reported: HashSet<JobId>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    mut nudges: Option<mpsc::UnboundedReceiver<()>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(dir = ?source.dir(), ?period, "scanner started");

        let mut reported = already_reported;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wake = tokio::select! {
                _ = ticker.tick() => Wake::Tick,
                nudge = next_nudge(&mut nudges) => match nudge {
                    Some(()) => Wake::Nudge,
                    None => Wake::WatcherClosed,
                },
            };
            match wake {
                Wake::Tick => {}
                Wake::Nudge => drain_nudges(&mut nudges),
                Wake::WatcherClosed => {
                    debug!("directory watcher closed; polling only");
                    nudges = None;
                    continue;
                }
            }

            let event = match source.discover(&reported) {
                Ok(jobs) => {
                    reported.extend(jobs.iter().cloned());
                    RuntimeEvent::JobsDiscovered { jobs }
                }
                Err(err) => {
                    let error = format!("{err:#}");
                    warn!(%error, "job directory scan failed");
                    RuntimeEvent::ScanFailed { error }
                }
            };

            if runtime_tx.send(event).await.is_err() {
                break;
            }
        }

        debug!("scanner finished (runtime gone)");
    })
}

enum Wake {
    Tick,
    Nudge,
    WatcherClosed,
}

async fn next_nudge(nudges: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match nudges {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Collapse a burst of change notifications into one rescan.
fn drain_nudges(nudges: &mut Option<mpsc::UnboundedReceiver<()>>) {
    if let Some(rx) = nudges {
        while rx.try_recv().is_ok() {}
    }
}
