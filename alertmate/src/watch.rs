//! Reload the endpoint when another process edits the settings file

use std::sync::Arc;

use alertmate_core::SettingsStore;
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Watches the parent directory of the settings file and reloads the store
/// whenever the file is created, modified or removed. Runs until aborted.
pub async fn watch_settings(settings: Arc<SettingsStore>) {
    let Some(path) = settings.path().map(|p| p.to_path_buf()) else {
        return;
    };

    // Watch the directory rather than the file so atomic renames are seen
    let Some(watch_dir) = path.parent().map(|d| d.to_path_buf()) else {
        tracing::warn!(path = %path.display(), "Settings path has no parent directory");
        return;
    };
    if let Err(e) = std::fs::create_dir_all(&watch_dir) {
        tracing::warn!(dir = %watch_dir.display(), error = %e, "Cannot create settings directory");
        return;
    }

    let (watch_tx, mut watch_rx) = mpsc::channel::<notify::Event>(16);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = watch_tx.blocking_send(event);
            }
        },
        NotifyConfig::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to create settings watcher");
            return;
        }
    };

    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        tracing::warn!(dir = %watch_dir.display(), error = %e, "Failed to watch settings directory");
        return;
    }

    tracing::debug!(path = %path.display(), "Watching settings file");

    while let Some(event) = watch_rx.recv().await {
        let affects_settings = event.paths.iter().any(|p| p == &path);
        let is_change = matches!(
            event.kind,
            notify::EventKind::Create(_) | notify::EventKind::Modify(_) | notify::EventKind::Remove(_)
        );

        if affects_settings && is_change {
            settings.reload();
        }
    }
}
