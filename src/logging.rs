use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// Default log file next to the data files
pub fn default_log_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("bulkmail/bulkmail.log"))
        .unwrap_or_else(|| PathBuf::from("bulkmail.log"))
}

/// Send tracing output to a file. The terminal belongs to the UI, so nothing
/// is written to stdout or stderr. Filter with `RUST_LOG` (default `info`).
pub fn init(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {}", e))?;

    Ok(())
}
