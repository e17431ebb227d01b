use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub send: SendConfig,
    pub draft: DraftConfig,
    pub compose: ComposeConfig,
    pub layout: LayoutConfig,
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Recipient list (JSON)
    pub recipients: String,
    /// SMTP profile (JSON, credential in cleartext)
    pub profile: String,
    /// Saved draft (JSON)
    pub draft: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// Socket timeout for SMTP commands
    pub timeout_secs: u64,
    /// Name announced in EHLO (default: local hostname)
    pub hello_name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DraftConfig {
    /// Save a modified draft every N seconds; 0 disables
    pub autosave_secs: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Editor for subject/body (falls back to $EDITOR, then vi)
    pub editor: Option<String>,
    /// File chooser run with `--chooser-file <tmp>` (yazi compatible)
    pub file_picker: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Sidebar width in columns
    pub sidebar_width: u16,
    /// Height of the progress log on the send page
    pub log_height: u16,
}

/// Semantic theme configuration using Capstan Cloud colors as defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    // Base colors
    pub bg: String,
    pub bg_panel: String,
    pub bg_element: String,
    pub fg: String,
    pub fg_muted: String,
    pub fg_subtle: String,

    // Border colors
    pub border: String,
    pub border_subtle: String,
    pub border_active: String,

    // Accent colors
    pub primary: String,
    pub secondary: String,

    // Semantic colors
    pub success: String,
    pub warning: String,
    pub error: String,

    // UI-specific mappings
    pub selected_bg: String,
    pub attachment: String,
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("bulkmail"))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl Default for StorageConfig {
    fn default() -> Self {
        let dir = data_dir();
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
        Self {
            recipients: path("emails.json"),
            profile: path("config.json"),
            draft: path("draft.json"),
        }
    }
}

impl StorageConfig {
    pub fn recipients_path(&self) -> PathBuf {
        expand(&self.recipients)
    }

    pub fn profile_path(&self) -> PathBuf {
        expand(&self.profile)
    }

    pub fn draft_path(&self) -> PathBuf {
        expand(&self.draft)
    }
}

/// Expand `~` and environment variables in a user-supplied path
pub fn expand(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(p) => PathBuf::from(p.into_owned()),
        Err(_) => PathBuf::from(shellexpand::tilde(path).into_owned()),
    }
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            hello_name: None,
        }
    }
}

impl SendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for DraftConfig {
    fn default() -> Self {
        Self { autosave_secs: 30 }
    }
}

impl DraftConfig {
    pub fn autosave_interval(&self) -> Option<Duration> {
        (self.autosave_secs > 0).then(|| Duration::from_secs(self.autosave_secs))
    }
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            editor: None,
            file_picker: "yazi".to_string(),
        }
    }
}

impl ComposeConfig {
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok())
            .unwrap_or_else(|| "vi".to_string())
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sidebar_width: 22,
            log_height: 10,
        }
    }
}

/// Capstan Cloud theme - warm earth tones with gold accents
impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            // Base colors
            bg: "#1a1917".to_string(),
            bg_panel: "#262422".to_string(),
            bg_element: "#393634".to_string(),
            fg: "#f7f7f5".to_string(),
            fg_muted: "#8c8985".to_string(),
            fg_subtle: "#b8b5b0".to_string(),

            // Border colors
            border: "#524f4c".to_string(),
            border_subtle: "#393634".to_string(),
            border_active: "#d4a366".to_string(), // primary

            // Accent colors
            primary: "#d4a366".to_string(),
            secondary: "#8fa5ae".to_string(), // blue

            // Semantic colors
            success: "#52c41a".to_string(),
            warning: "#faad14".to_string(),
            error: "#ff4d4f".to_string(),

            // UI-specific mappings
            selected_bg: "#393634".to_string(), // bg_element
            attachment: "#b48ead".to_string(),  // magenta
        }
    }
}

impl Config {
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("bulkmail/config.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/bulkmail/config.toml"))
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load() -> Self {
        let config_path = Self::path();

        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(config) => return config,
                    Err(e) => tracing::warn!(path = %config_path.display(), "config parse error: {}", e),
                },
                Err(e) => tracing::warn!(path = %config_path.display(), "config read error: {}", e),
            }
        }

        Self::default()
    }
}

impl ThemeConfig {
    pub fn bg(&self) -> ratatui::style::Color {
        parse_color(&self.bg)
    }
    pub fn bg_panel(&self) -> ratatui::style::Color {
        parse_color(&self.bg_panel)
    }
    pub fn bg_element(&self) -> ratatui::style::Color {
        parse_color(&self.bg_element)
    }
    pub fn fg(&self) -> ratatui::style::Color {
        parse_color(&self.fg)
    }
    pub fn fg_muted(&self) -> ratatui::style::Color {
        parse_color(&self.fg_muted)
    }
    pub fn fg_subtle(&self) -> ratatui::style::Color {
        parse_color(&self.fg_subtle)
    }
    pub fn border(&self) -> ratatui::style::Color {
        parse_color(&self.border)
    }
    pub fn border_subtle(&self) -> ratatui::style::Color {
        parse_color(&self.border_subtle)
    }
    pub fn border_active(&self) -> ratatui::style::Color {
        parse_color(&self.border_active)
    }
    pub fn primary(&self) -> ratatui::style::Color {
        parse_color(&self.primary)
    }
    pub fn secondary(&self) -> ratatui::style::Color {
        parse_color(&self.secondary)
    }
    pub fn success(&self) -> ratatui::style::Color {
        parse_color(&self.success)
    }
    pub fn warning(&self) -> ratatui::style::Color {
        parse_color(&self.warning)
    }
    pub fn error(&self) -> ratatui::style::Color {
        parse_color(&self.error)
    }
    pub fn selected_bg(&self) -> ratatui::style::Color {
        parse_color(&self.selected_bg)
    }
    pub fn attachment(&self) -> ratatui::style::Color {
        parse_color(&self.attachment)
    }
}

/// Parse color string to ratatui Color
pub fn parse_color(s: &str) -> ratatui::style::Color {
    use ratatui::style::Color;

    // Try hex first (#RRGGBB)
    if s.starts_with('#') && s.len() == 7 {
        if let (Ok(r), Ok(g), Ok(b)) = (
            u8::from_str_radix(&s[1..3], 16),
            u8::from_str_radix(&s[3..5], 16),
            u8::from_str_radix(&s[5..7], 16),
        ) {
            return Color::Rgb(r, g, b);
        }
    }

    // Named colors
    match s.to_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "white" => Color::White,
        _ => Color::White,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#d4a366"), Color::Rgb(0xd4, 0xa3, 0x66));
        assert_eq!(parse_color("Cyan"), Color::Cyan);
        assert_eq!(parse_color("#zzzzzz"), Color::White);
        assert_eq!(parse_color("chartreuse"), Color::White);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config = Config::parse(
            "[send]\ntimeout_secs = 5\n\n[storage]\nrecipients = \"/srv/mail/list.json\"\n",
        )
        .unwrap();

        assert_eq!(config.send.timeout(), Duration::from_secs(5));
        assert_eq!(
            config.storage.recipients_path(),
            PathBuf::from("/srv/mail/list.json")
        );
        assert!(config.storage.draft_path().ends_with("draft.json"));
        assert_eq!(config.draft.autosave_interval(), Some(Duration::from_secs(30)));
        assert_eq!(config.layout.sidebar_width, 22);
    }

    #[test]
    fn test_autosave_can_be_disabled() {
        let config = Config::parse("[draft]\nautosave_secs = 0\n").unwrap();
        assert_eq!(config.draft.autosave_interval(), None);
    }

    #[test]
    fn test_tilde_expansion() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand("~/lists/a.json"), home.join("lists/a.json"));
        }
    }

    #[test]
    fn test_bad_toml_is_an_error() {
        assert!(Config::parse("[send\ntimeout_secs = ").is_err());
    }
}
