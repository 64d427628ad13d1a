//! Runtime settings: the ingestion endpoint
//!
//! The endpoint URL is a user-editable setting persisted as a small TOML
//! key-value document (`$XDG_DATA_HOME/alertmate/settings.toml`):
//!
//! ```toml
//! server_url = "http://192.168.1.10:8082/ingest"
//! ```
//!
//! The empty string means forwarding is disabled. The in-memory value is
//! authoritative for the running process: it is updated before the file is
//! written, and a failed write is logged without rolling it back.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::observable::{Observable, Subscription};

/// On-disk layout of the settings file
#[derive(Debug, Default, Serialize, Deserialize)]
struct Preferences {
    #[serde(default)]
    server_url: String,
}

/// Sole owner and writer of the ingestion endpoint setting.
#[derive(Debug)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    endpoint: Observable<String>,
    /// Serializes writers so the file always ends with the last in-memory value
    write_lock: Mutex<()>,
}

impl SettingsStore {
    /// Open the store backed by `path`, loading the persisted endpoint once.
    ///
    /// A missing file yields the empty endpoint. An unreadable or corrupt file
    /// is logged and also yields the empty endpoint.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let endpoint = match read_preferences(&path) {
            Ok(Some(prefs)) => normalize(&prefs.server_url),
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load settings, forwarding disabled"
                );
                String::new()
            }
        };

        tracing::debug!(path = %path.display(), endpoint = %endpoint, "Settings loaded");

        Self {
            path: Some(path),
            endpoint: Observable::new(endpoint),
            write_lock: Mutex::new(()),
        }
    }

    /// A store that never touches disk
    pub fn ephemeral(endpoint: &str) -> Self {
        Self {
            path: None,
            endpoint: Observable::new(normalize(endpoint)),
            write_lock: Mutex::new(()),
        }
    }

    /// Current endpoint ("" when forwarding is disabled)
    pub fn get(&self) -> String {
        self.endpoint.get()
    }

    /// Whether an endpoint is configured
    pub fn is_enabled(&self) -> bool {
        !self.get().is_empty()
    }

    /// Set the endpoint. Surrounding whitespace is trimmed, so a blank URL
    /// disables forwarding.
    ///
    /// The new value is visible to `get` and subscribers before it is written
    /// to disk.
    pub fn set(&self, url: &str) {
        if let Err(e) = self.try_set(url) {
            tracing::warn!(
                error = %e,
                "Failed to persist settings; keeping in-memory endpoint"
            );
        }
    }

    /// Like [`set`](Self::set), but reports a failed write to the caller.
    ///
    /// The in-memory value is updated either way.
    pub fn try_set(&self, url: &str) -> Result<()> {
        let url = normalize(url);
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        self.endpoint.set(url.clone());
        tracing::info!(endpoint = %url, "Ingestion endpoint updated");

        let Some(path) = &self.path else {
            return Ok(());
        };
        write_preferences(path, &Preferences { server_url: url }).map_err(|e| {
            Error::Settings(format!("failed to write {}: {}", path.display(), e))
        })
    }

    /// Disable forwarding
    pub fn clear(&self) {
        self.set("");
    }

    /// Re-read the settings file and publish its endpoint if it differs.
    ///
    /// Used when another process edits the file. Returns true if the
    /// in-memory endpoint changed.
    pub fn reload(&self) -> bool {
        let Some(path) = &self.path else { return false };
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let endpoint = match read_preferences(path) {
            Ok(Some(prefs)) => normalize(&prefs.server_url),
            Ok(None) => String::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to reload settings");
                return false;
            }
        };

        let changed = self.endpoint.set_if_changed(endpoint);
        if changed {
            tracing::info!(endpoint = %self.get(), "Ingestion endpoint reloaded");
        }
        changed
    }

    /// Stream the current endpoint, then each new endpoint
    pub fn subscribe(&self) -> Subscription<String> {
        self.endpoint.subscribe()
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

fn normalize(url: &str) -> String {
    url.trim().to_string()
}

fn read_preferences(path: &Path) -> Result<Option<Preferences>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let prefs = toml::from_str(&content)
        .map_err(|e| Error::Settings(format!("failed to parse {:?}: {}", path, e)))?;
    Ok(Some(prefs))
}

/// Write via a sibling temp file and rename, so readers never see a torn file
fn write_preferences(path: &Path, prefs: &Preferences) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string(prefs)
        .map_err(|e| Error::Settings(format!("failed to serialize settings: {}", e)))?;

    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
