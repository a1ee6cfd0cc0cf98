// src/jobs/watcher.rs

use std::path::Path;

use anyhow::Result;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Handle for the directory watcher.
///
/// Dropping this handle stops watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Whether a notify event can change the set of job files.
fn changes_listing(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_))
    )
}

/// Watch `dir` (non-recursively) and send a nudge whenever entries appear,
/// disappear or are renamed. The scanner rescans early on each nudge.
pub fn spawn_dir_watcher(dir: &Path) -> Result<(WatcherHandle, mpsc::UnboundedReceiver<()>)> {
    let (nudge_tx, nudge_rx) = mpsc::unbounded_channel::<()>();

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) if changes_listing(&event) => {
                let _ = nudge_tx.send(());
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "directory watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    info!(?dir, "directory watcher started");

    Ok((WatcherHandle { _inner: watcher }, nudge_rx))
}
