//! File-backed stores for recipients, the SMTP profile, and the draft.
//!
//! Every store owns its data, is bound to an explicit path, and only touches
//! disk on `load()` and `save()`.

mod draft;
mod profile;
mod recipients;

pub use draft::{Draft, DraftStore};
pub use profile::{ProfileStore, Security, SmtpProfile};
pub use recipients::{parse_recipient_text, ImportReport, Recipient, RecipientStore, SkippedEntry};

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreError;

/// Read a JSON store file. A missing file is `Ok(None)`.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| StoreError::CorruptStore {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Write a JSON store file through a temp file in the same directory
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp = tempfile::NamedTempFile::new_in(parent)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, value).map_err(std::io::Error::other)?;
        writer.flush()?;
    }
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
