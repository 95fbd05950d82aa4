//! Configuration file watcher for hot reload.
//!
//! # Data Flow
//! ```text
//! notify event (directory of the config file)
//!     → keep only modify/create events naming the config file
//!     → settle for DEBOUNCE, drain the burst
//!     → re-read the file; skip if the text is unchanged
//!     → load_config_str (parse + validate)
//!     → send GatewayConfig to the reload loop
//! ```
//!
//! # Design Decisions
//! - The parent directory is watched, not the file: editors that save by
//!   rename replace the inode and a file watch would go silent
//! - Invalid edits are logged and dropped; the running snapshot stays

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config_str;
use crate::config::schema::GatewayConfig;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Watches one configuration file and emits validated configs.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<GatewayConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GatewayConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        (
            Self {
                path: path.to_path_buf(),
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching. Must be called inside a tokio runtime. Updates stop
    /// when the returned watcher is dropped.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Some(file_name) = self.path.file_name().map(OsString::from) else {
            return Err(notify::Error::generic("config path has no file name"));
        };
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches(&event, &file_name) => {
                    let _ = event_tx.send(());
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        // Baseline, so the first event after startup only reloads on a real change.
        let last = std::fs::read_to_string(&self.path).ok();
        tokio::spawn(reload_loop(self.path.clone(), last, event_rx, self.update_tx));

        tracing::info!(path = %self.path.display(), "Config watcher started");
        Ok(watcher)
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    (event.kind.is_modify() || event.kind.is_create())
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

async fn reload_loop(
    path: PathBuf,
    mut last: Option<String>,
    mut events: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<GatewayConfig>,
) {
    while events.recv().await.is_some() {
        tokio::time::sleep(DEBOUNCE).await;
        while events.try_recv().is_ok() {}

        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "Config file unreadable, keeping current configuration");
                continue;
            }
        };
        if last.as_deref() == Some(text.as_str()) {
            tracing::debug!(path = %path.display(), "Config file unchanged");
            continue;
        }

        match load_config_str(&text) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "Config file changed, reloading");
                last = Some(text);
                if updates.send(config).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
            }
        }
    }
}
