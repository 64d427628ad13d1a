//! Stable per-device identifier
//!
//! The identifier is stamped on every forwarded event. Resolution order:
//! configured override, then the persisted identifier, then a fresh UUID
//! that is persisted for next time.

use std::path::Path;

use crate::error::Result;

/// Resolve the device identifier.
///
/// Never fails: if the generated identifier cannot be persisted the error is
/// logged and the identifier is still used for this process.
pub fn resolve(override_id: Option<&str>, path: &Path) -> String {
    if let Some(id) = override_id.map(str::trim).filter(|id| !id.is_empty()) {
        return id.to_string();
    }

    match read(path) {
        Ok(Some(id)) => return id,
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read device id");
        }
    }

    let id = uuid::Uuid::new_v4().to_string();
    match write(path, &id) {
        Ok(()) => tracing::info!(device_id = %id, "Generated new device id"),
        Err(e) => tracing::warn!(
            path = %path.display(),
            error = %e,
            "Failed to persist device id; it will change on restart"
        ),
    }
    id
}

fn read(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let id = content.trim();
            Ok((!id.is_empty()).then(|| id.to_string()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write(path: &Path, id: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, format!("{}\n", id))?;
    Ok(())
}
