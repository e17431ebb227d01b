use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{read_json, write_json};
use crate::error::StoreError;

/// Transport security for the SMTP connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// Plain connection upgraded with STARTTLS
    #[default]
    StartTls,
    /// Implicit TLS from the first byte (SMTPS)
    Tls,
    /// No encryption
    None,
}

impl Security {
    fn from_flags(use_tls: bool, use_ssl: bool) -> Self {
        match (use_tls, use_ssl) {
            (_, true) => Self::Tls,
            (true, false) => Self::StartTls,
            (false, false) => Self::None,
        }
    }

    fn flags(self) -> (bool, bool) {
        match self {
            Self::StartTls => (true, false),
            Self::Tls => (false, true),
            Self::None => (false, false),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::StartTls => "STARTTLS",
            Self::Tls => "SSL/TLS",
            Self::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpProfile {
    pub host: String,
    pub port: u16,
    pub username: String,
    /// Stored in cleartext on disk
    pub credential: String,
    pub security: Security,
}

impl Default for SmtpProfile {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            username: String::new(),
            credential: String::new(),
            security: Security::StartTls,
        }
    }
}

impl SmtpProfile {
    /// Name of the first required field that is empty, if any
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.host.trim().is_empty() {
            Some("host")
        } else if self.port == 0 {
            Some("port")
        } else if self.username.trim().is_empty() {
            Some("username")
        } else if self.credential.is_empty() {
            Some("password")
        } else {
            None
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }
}

/// On-disk layout, kept compatible with existing `config.json` files
#[derive(Debug, Serialize, Deserialize)]
struct ProfileFile {
    #[serde(default)]
    smtp_host: String,
    #[serde(default = "default_port")]
    smtp_port: u32,
    #[serde(default = "default_true")]
    use_tls: bool,
    #[serde(default)]
    use_ssl: bool,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

fn default_port() -> u32 {
    587
}

fn default_true() -> bool {
    true
}

impl From<&SmtpProfile> for ProfileFile {
    fn from(p: &SmtpProfile) -> Self {
        let (use_tls, use_ssl) = p.security.flags();
        Self {
            smtp_host: p.host.clone(),
            smtp_port: u32::from(p.port),
            use_tls,
            use_ssl,
            username: p.username.clone(),
            password: p.credential.clone(),
        }
    }
}

/// Keys accepted by `import_from`; the short aliases cover hand-written files
#[derive(Debug, Deserialize)]
struct ProfileImport {
    #[serde(alias = "host")]
    smtp_host: Option<String>,
    #[serde(alias = "port")]
    smtp_port: Option<u32>,
    username: Option<String>,
    #[serde(alias = "credential")]
    password: Option<String>,
    use_tls: Option<bool>,
    use_ssl: Option<bool>,
}

fn checked_port(port: u32) -> Result<u16, StoreError> {
    match u16::try_from(port) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(StoreError::InvalidPort(port)),
    }
}

/// SMTP server settings bound to a JSON file.
///
/// The credential is persisted in cleartext, matching the existing file
/// format. Use an app password rather than an account password.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    profile: SmtpProfile,
}

impl ProfileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            profile: SmtpProfile::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn profile(&self) -> &SmtpProfile {
        &self.profile
    }

    pub fn set(
        &mut self,
        host: &str,
        port: u32,
        username: &str,
        credential: &str,
    ) -> Result<(), StoreError> {
        let port = checked_port(port)?;
        self.profile.host = host.trim().to_string();
        self.profile.port = port;
        self.profile.username = username.trim().to_string();
        self.profile.credential = credential.to_string();
        Ok(())
    }

    /// Change transport security; switching to implicit TLS moves 587 to 465
    pub fn set_security(&mut self, security: Security) {
        if security == Security::Tls && self.profile.port == 587 {
            self.profile.port = 465;
        }
        self.profile.security = security;
    }

    /// Replace the profile from a JSON (or `.toml`) file
    pub fn import_from(&mut self, path: &Path) -> Result<(), StoreError> {
        let content = std::fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));

        let import: ProfileImport = if is_toml {
            toml::from_str(&content).map_err(|e| StoreError::MalformedProfile(e.to_string()))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| StoreError::MalformedProfile(e.to_string()))?
        };

        let mut missing = Vec::new();
        if import.smtp_host.is_none() {
            missing.push("smtp_host");
        }
        if import.smtp_port.is_none() {
            missing.push("smtp_port");
        }
        if import.username.is_none() {
            missing.push("username");
        }
        if import.password.is_none() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(StoreError::MalformedProfile(format!(
                "missing keys: {}",
                missing.join(", ")
            )));
        }

        let port = checked_port(import.smtp_port.unwrap_or_default())?;
        let (cur_tls, cur_ssl) = self.profile.security.flags();

        self.profile = SmtpProfile {
            host: import.smtp_host.unwrap_or_default().trim().to_string(),
            port,
            username: import.username.unwrap_or_default().trim().to_string(),
            credential: import.password.unwrap_or_default(),
            security: Security::from_flags(
                import.use_tls.unwrap_or(cur_tls),
                import.use_ssl.unwrap_or(cur_ssl),
            ),
        };
        tracing::info!(path = %path.display(), host = %self.profile.host, "imported SMTP profile");
        Ok(())
    }

    /// Replace the profile from the store file; defaults if missing or corrupt
    pub fn load(&mut self) -> Result<(), StoreError> {
        self.profile = SmtpProfile::default();

        let file: ProfileFile = match read_json(&self.path)? {
            Some(f) => f,
            None => return Ok(()),
        };

        let port = checked_port(file.smtp_port).map_err(|e| StoreError::CorruptStore {
            path: self.path.clone(),
            reason: e.to_string(),
        })?;

        self.profile = SmtpProfile {
            host: file.smtp_host,
            port,
            username: file.username,
            credential: file.password,
            security: Security::from_flags(file.use_tls, file.use_ssl),
        };
        Ok(())
    }

    pub fn save(&self) -> Result<(), StoreError> {
        write_json(&self.path, &ProfileFile::from(&self.profile))?;
        tracing::warn!(
            path = %self.path.display(),
            "SMTP credential saved in cleartext; prefer an app-specific password"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> ProfileStore {
        ProfileStore::new(dir.path().join("config.json"))
    }

    #[test]
    fn test_set_validates_port() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        assert!(matches!(
            store.set("smtp.x.com", 0, "u@x.com", "pw"),
            Err(StoreError::InvalidPort(0))
        ));
        assert!(matches!(
            store.set("smtp.x.com", 65536, "u@x.com", "pw"),
            Err(StoreError::InvalidPort(65536))
        ));
        assert_eq!(store.profile(), &SmtpProfile::default());

        store.set(" smtp.x.com ", 2525, "u@x.com", "pw").unwrap();
        assert_eq!(store.profile().host, "smtp.x.com");
        assert_eq!(store.profile().port, 2525);
    }

    #[test]
    fn test_ssl_switches_submission_port() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.set_security(Security::Tls);
        assert_eq!(store.profile().port, 465);

        store.set("h", 2525, "u", "p").unwrap();
        store.set_security(Security::StartTls);
        store.set_security(Security::Tls);
        assert_eq!(store.profile().port, 2525);
    }

    #[test]
    fn test_missing_field_order() {
        let mut profile = SmtpProfile::default();
        assert_eq!(profile.missing_field(), Some("host"));
        profile.host = "smtp.x.com".into();
        assert_eq!(profile.missing_field(), Some("username"));
        profile.username = "u@x.com".into();
        assert_eq!(profile.missing_field(), Some("password"));
        profile.credential = "pw".into();
        assert!(profile.is_complete());
    }

    #[test]
    fn test_import_smtp_prefixed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(
            &path,
            r#"{
                "smtp_host": "smtp.gmail.com",
                "smtp_port": 465,
                "use_tls": false,
                "use_ssl": true,
                "username": "me@gmail.com",
                "password": "app-pass"
            }"#,
        )
        .unwrap();

        let mut store = store_in(&dir);
        store.import_from(&path).unwrap();
        let p = store.profile();
        assert_eq!(p.host, "smtp.gmail.com");
        assert_eq!(p.port, 465);
        assert_eq!(p.security, Security::Tls);
        assert_eq!(p.credential, "app-pass");
    }

    #[test]
    fn test_import_toml_with_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("smtp.toml");
        std::fs::write(
            &path,
            "host = \"mail.example.org\"\nport = 2525\nusername = \"bot\"\ncredential = \"s3cret\"\n",
        )
        .unwrap();

        let mut store = store_in(&dir);
        store.import_from(&path).unwrap();
        assert_eq!(store.profile().host, "mail.example.org");
        assert_eq!(store.profile().port, 2525);
        assert_eq!(store.profile().security, Security::StartTls);
    }

    #[test]
    fn test_import_missing_keys_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(&path, r#"{"smtp_host": "h", "username": "u"}"#).unwrap();

        let mut store = store_in(&dir);
        let err = store.import_from(&path).unwrap_err();
        match err {
            StoreError::MalformedProfile(msg) => {
                assert!(msg.contains("smtp_port"));
                assert!(msg.contains("password"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.profile(), &SmtpProfile::default());
    }

    #[test]
    fn test_import_bad_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        std::fs::write(
            &path,
            r#"{"smtp_host": "h", "smtp_port": 70000, "username": "u", "password": "p"}"#,
        )
        .unwrap();

        let mut store = store_in(&dir);
        assert!(matches!(
            store.import_from(&path),
            Err(StoreError::InvalidPort(70000))
        ));
    }

    #[test]
    fn test_save_uses_smtp_prefixed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.set("smtp.x.com", 587, "u@x.com", "pw").unwrap();
        store.save().unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw["smtp_host"], "smtp.x.com");
        assert_eq!(raw["smtp_port"], 587);
        assert_eq!(raw["use_tls"], true);
        assert_eq!(raw["use_ssl"], false);
        assert_eq!(raw["password"], "pw");

        let mut loaded = store_in(&dir);
        loaded.load().unwrap();
        assert_eq!(loaded.profile(), store.profile());
    }

    #[test]
    fn test_load_corrupt_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        std::fs::write(store.path(), "smtp_host=").unwrap();

        assert!(matches!(store.load(), Err(StoreError::CorruptStore { .. })));
        assert_eq!(store.profile(), &SmtpProfile::default());
    }
}
