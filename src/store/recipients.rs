use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use lettre::Address;
use serde::{Deserialize, Serialize};

use super::{read_json, write_json};
use crate::error::StoreError;

/// A syntactically valid destination address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient(Address);

impl Recipient {
    pub fn address(&self) -> &Address {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        self.0.as_ref()
    }

    /// Addresses are compared case-insensitively for de-duplication
    pub fn same_as(&self, other: &Recipient) -> bool {
        self.as_str().eq_ignore_ascii_case(other.as_str())
    }
}

impl FromStr for Recipient {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .parse::<Address>()
            .map(Recipient)
            .map_err(|_| StoreError::InvalidAddress(trimmed.to_string()))
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// On-disk layout: `{"recipients": [...]}`
#[derive(Debug, Default, Serialize, Deserialize)]
struct RecipientsFile {
    #[serde(default)]
    recipients: Vec<String>,
}

/// An entry from an import file that was not a valid address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub line: usize,
    pub text: String,
}

/// Outcome of a bulk import
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportReport {
    pub added: usize,
    pub duplicates: usize,
    pub skipped: Vec<SkippedEntry>,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        let mut s = format!("Imported {} recipients", self.added);
        if self.duplicates > 0 {
            s.push_str(&format!(", {} duplicates", self.duplicates));
        }
        if !self.skipped.is_empty() {
            s.push_str(&format!(", skipped {} invalid", self.skipped.len()));
        }
        s
    }
}

/// Split delimited text into (line number, entry) candidates.
///
/// Lines may hold several entries separated by `,` `;` or tabs. Surrounding
/// quotes are stripped. A leading list number (`"2. bob@example.com"`) is
/// removed only when the field is not already a valid address, so
/// `123.456@example.com` survives intact.
pub fn parse_recipient_text(text: &str) -> Vec<(usize, String)> {
    let mut entries = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        for field in line.split([',', ';', '\t']) {
            let field = field.trim().trim_matches('"').trim();
            if field.is_empty() {
                continue;
            }
            let entry = if field.parse::<Address>().is_ok() {
                field
            } else {
                strip_list_number(field)
            };
            entries.push((idx + 1, entry.to_string()));
        }
    }

    entries
}

fn strip_list_number(field: &str) -> &str {
    if let Some((left, right)) = field.split_once('.') {
        let left = left.trim();
        if !left.is_empty() && left.chars().all(|c| c.is_ascii_digit()) {
            return right.trim();
        }
    }
    field
}

/// Ordered, duplicate-free recipient list bound to a JSON file
#[derive(Debug)]
pub struct RecipientStore {
    path: PathBuf,
    recipients: Vec<Recipient>,
}

impl RecipientStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            recipients: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> &[Recipient] {
        &self.recipients
    }

    pub fn len(&self) -> usize {
        self.recipients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipients.is_empty()
    }

    pub fn contains(&self, recipient: &Recipient) -> bool {
        self.recipients.iter().any(|r| r.same_as(recipient))
    }

    /// Append an address. Returns false if it was already present.
    pub fn add(&mut self, address: &str) -> Result<bool, StoreError> {
        let recipient: Recipient = address.parse()?;
        Ok(self.push_unique(recipient))
    }

    fn push_unique(&mut self, recipient: Recipient) -> bool {
        if self.contains(&recipient) {
            return false;
        }
        self.recipients.push(recipient);
        true
    }

    /// Remove an address. Returns false if it was not present.
    pub fn remove(&mut self, address: &str) -> bool {
        let before = self.recipients.len();
        let needle = address.trim();
        self.recipients
            .retain(|r| !r.as_str().eq_ignore_ascii_case(needle));
        self.recipients.len() != before
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Recipient> {
        (index < self.recipients.len()).then(|| self.recipients.remove(index))
    }

    pub fn clear(&mut self) {
        self.recipients.clear();
    }

    /// Merge addresses from parsed text, in order
    pub fn import_text(&mut self, text: &str) -> ImportReport {
        let mut report = ImportReport::default();

        for (line, entry) in parse_recipient_text(text) {
            match entry.parse::<Recipient>() {
                Ok(recipient) => {
                    if self.push_unique(recipient) {
                        report.added += 1;
                    } else {
                        report.duplicates += 1;
                    }
                }
                Err(_) => report.skipped.push(SkippedEntry { line, text: entry }),
            }
        }

        report
    }

    /// Merge addresses from a `.txt` or `.csv` file
    pub fn import_from(&mut self, path: &Path) -> Result<ImportReport, StoreError> {
        let text = std::fs::read_to_string(path)?;
        let report = self.import_text(&text);
        tracing::info!(
            path = %path.display(),
            added = report.added,
            duplicates = report.duplicates,
            skipped = report.skipped.len(),
            "imported recipients"
        );
        Ok(report)
    }

    /// Replace the list from the store file.
    ///
    /// A missing file yields an empty list. An unparseable file also leaves the
    /// list empty and is reported as `CorruptStore`.
    pub fn load(&mut self) -> Result<(), StoreError> {
        self.recipients.clear();

        let file: RecipientsFile = match read_json(&self.path) {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "recipient store unreadable");
                return Err(e);
            }
        };

        for entry in file.recipients {
            match entry.parse::<Recipient>() {
                Ok(r) => {
                    self.push_unique(r);
                }
                Err(_) => tracing::warn!(entry = %entry, "dropping invalid stored recipient"),
            }
        }

        Ok(())
    }

    pub fn save(&self) -> Result<(), StoreError> {
        let file = RecipientsFile {
            recipients: self.recipients.iter().map(|r| r.to_string()).collect(),
        };
        write_json(&self.path, &file)?;
        tracing::debug!(path = %self.path.display(), count = self.recipients.len(), "saved recipients");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> RecipientStore {
        RecipientStore::new(dir.path().join("emails.json"))
    }

    fn addresses(store: &RecipientStore) -> Vec<&str> {
        store.list().iter().map(|r| r.as_str()).collect()
    }

    #[test]
    fn test_add_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let err = store.add("not-an-address").unwrap_err();
        assert!(matches!(err, StoreError::InvalidAddress(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_twice_keeps_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        assert!(store.add("a@x.com").unwrap());
        assert!(!store.add("a@x.com").unwrap());
        assert!(!store.add(" A@X.com ").unwrap());
        assert_eq!(addresses(&store), vec!["a@x.com"]);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add("a@x.com").unwrap();

        assert!(!store.remove("b@x.com"));
        assert!(store.remove("a@x.com"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_import_counts_valid_and_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(
            &path,
            "one@example.com\nbogus\ntwo@example.com\n\n@nouser\nthree@example.com\n",
        )
        .unwrap();

        let mut store = store_in(&dir);
        store.add("zero@example.com").unwrap();
        let report = store.import_from(&path).unwrap();

        assert_eq!(report.added, 3);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0], SkippedEntry { line: 2, text: "bogus".into() });
        assert_eq!(report.skipped[1].line, 5);
        assert_eq!(
            addresses(&store),
            vec!["zero@example.com", "one@example.com", "two@example.com", "three@example.com"]
        );
    }

    #[test]
    fn test_import_duplicates_not_reported_as_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add("a@x.com").unwrap();

        let report = store.import_text("a@x.com\nb@x.com\nb@x.com\n");
        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(report.summary(), "Imported 1 recipients, 2 duplicates");
    }

    #[test]
    fn test_parse_csv_and_numbered_lines() {
        let parsed = parse_recipient_text("1. a@x.com\n\"b@x.com\", c@x.com;d@x.com\n12. e@x.com");
        let entries: Vec<&str> = parsed.iter().map(|(_, e)| e.as_str()).collect();
        assert_eq!(entries, vec!["a@x.com", "b@x.com", "c@x.com", "d@x.com", "e@x.com"]);
        assert_eq!(parsed[3].0, 2);
        assert_eq!(parsed[4].0, 3);
    }

    #[test]
    fn test_import_keeps_addresses_starting_with_digits() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let report = store.import_text("123.456@x.com\n2024.report@x.com\n3. c@x.com\n");
        assert_eq!(report.added, 3);
        assert!(report.skipped.is_empty());
        assert_eq!(
            addresses(&store),
            vec!["123.456@x.com", "2024.report@x.com", "c@x.com"]
        );
    }

    #[test]
    fn test_round_trip_empty_and_filled() {
        let dir = tempfile::tempdir().unwrap();

        let empty = store_in(&dir);
        empty.save().unwrap();
        let mut loaded = store_in(&dir);
        loaded.load().unwrap();
        assert!(loaded.is_empty());

        let mut filled = store_in(&dir);
        for addr in ["c@x.com", "a@x.com", "b@x.com"] {
            filled.add(addr).unwrap();
        }
        filled.save().unwrap();
        let mut loaded = store_in(&dir);
        loaded.load().unwrap();
        assert_eq!(loaded.list(), filled.list());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.load().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add("a@x.com").unwrap();
        std::fs::write(store.path(), "[[[").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::CorruptStore { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_drops_invalid_and_duplicate_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emails.json");
        std::fs::write(
            &path,
            r#"{"recipients": [" a@x.com ", "junk", "a@x.com", "b@x.com"]}"#,
        )
        .unwrap();

        let mut store = RecipientStore::new(&path);
        store.load().unwrap();
        assert_eq!(addresses(&store), vec!["a@x.com", "b@x.com"]);
    }
}
