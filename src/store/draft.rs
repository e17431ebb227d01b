use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{read_json, write_json};
use crate::error::StoreError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

/// The in-progress message, bound to a JSON file.
///
/// Attachment paths are kept as given; they are checked when a send starts.
#[derive(Debug)]
pub struct DraftStore {
    path: PathBuf,
    draft: Draft,
}

impl DraftStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            draft: Draft::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn update(&mut self, subject: &str, body: &str, attachments: Vec<PathBuf>) {
        self.draft = Draft {
            subject: subject.to_string(),
            body: body.to_string(),
            attachments,
        };
    }

    /// Add an attachment path. Returns false if it is already attached.
    pub fn add_attachment(&mut self, path: PathBuf) -> bool {
        if self.draft.attachments.contains(&path) {
            return false;
        }
        self.draft.attachments.push(path);
        true
    }

    pub fn remove_attachment(&mut self, index: usize) -> Option<PathBuf> {
        (index < self.draft.attachments.len()).then(|| self.draft.attachments.remove(index))
    }

    /// Replace the draft from the store file; empty if missing or corrupt
    pub fn load(&mut self) -> Result<(), StoreError> {
        self.draft = Draft::default();
        if let Some(draft) = read_json(&self.path)? {
            self.draft = draft;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<(), StoreError> {
        write_json(&self.path, &self.draft)
    }
}
