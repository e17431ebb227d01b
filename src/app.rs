use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{expand, Config};
use crate::error::DeliveryError;
use crate::send::{Connector, Orchestrator, SendEvent};
use crate::store::{DraftStore, ProfileStore, RecipientStore, Security};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Send,
    Recipients,
    Smtp,
    About,
}

impl View {
    pub const ALL: [View; 4] = [View::Send, View::Recipients, View::Smtp, View::About];

    pub fn title(self) -> &'static str {
        match self {
            View::Send => "Send Mail",
            View::Recipients => "Email List",
            View::Smtp => "SMTP Config",
            View::About => "About",
        }
    }

    fn index(self) -> usize {
        View::ALL.iter().position(|v| *v == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        View::ALL[(self.index() + 1) % View::ALL.len()]
    }

    pub fn previous(self) -> Self {
        View::ALL[(self.index() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtpField {
    Host,
    Port,
    Username,
    Password,
    Security,
}

impl SmtpField {
    pub const ALL: [SmtpField; 5] = [
        SmtpField::Host,
        SmtpField::Port,
        SmtpField::Username,
        SmtpField::Password,
        SmtpField::Security,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SmtpField::Host => "SMTP Host",
            SmtpField::Port => "SMTP Port",
            SmtpField::Username => "Username",
            SmtpField::Password => "Password",
            SmtpField::Security => "Security",
        }
    }
}

/// What a single-line prompt is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    AddRecipient,
    ImportRecipients,
    ImportProfile,
    AddAttachment,
    Field(SmtpField),
}

impl Prompt {
    pub fn title(self) -> &'static str {
        match self {
            Prompt::AddRecipient => " Add recipient ",
            Prompt::ImportRecipients => " Import list (.txt/.csv) ",
            Prompt::ImportProfile => " Import SMTP config (.json/.toml) ",
            Prompt::AddAttachment => " Attach file ",
            Prompt::Field(SmtpField::Host) => " SMTP Host ",
            Prompt::Field(SmtpField::Port) => " SMTP Port ",
            Prompt::Field(SmtpField::Username) => " Username ",
            Prompt::Field(SmtpField::Password) => " Password ",
            Prompt::Field(SmtpField::Security) => " Security ",
        }
    }

    pub fn is_secret(self) -> bool {
        self == Prompt::Field(SmtpField::Password)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Prompt(Prompt),
    ConfirmSend,
}

/// Work the main loop must do outside the alternate screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    EditDraft,
    PickAttachments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Info,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub kind: LogKind,
    pub text: String,
}

pub struct App {
    pub config: Arc<Config>,
    pub view: View,
    pub focus: Focus,
    pub mode: Mode,
    pub input: String,
    pub recipients: RecipientStore,
    pub profile: ProfileStore,
    pub draft: DraftStore,
    pub orchestrator: Orchestrator,
    // Progress log for the current/last send run
    pub log: Vec<LogLine>,
    /// (processed, total) for the current/last run
    pub progress: Option<(usize, usize)>,
    pub recipient_state: ListState,
    pub attachment_selection: usize,
    pub smtp_selection: usize,
    pub status_message: Option<String>,
    pub should_quit: bool,
    draft_dirty: bool,
    connection_check: Option<Receiver<Result<(), DeliveryError>>>,
    last_autosave: Instant,
}

impl App {
    pub fn new(config: Arc<Config>, connector: Arc<dyn Connector>) -> Self {
        let recipients = RecipientStore::new(config.storage.recipients_path());
        let profile = ProfileStore::new(config.storage.profile_path());
        let draft = DraftStore::new(config.storage.draft_path());

        Self {
            config,
            view: View::Send,
            focus: Focus::Page,
            mode: Mode::Normal,
            input: String::new(),
            recipients,
            profile,
            draft,
            orchestrator: Orchestrator::new(connector),
            log: Vec::new(),
            progress: None,
            recipient_state: ListState::default(),
            attachment_selection: 0,
            smtp_selection: 0,
            status_message: None,
            should_quit: false,
            draft_dirty: false,
            last_autosave: Instant::now(),
            connection_check: None,
        }
    }

    /// Load all three stores, reporting the first failure in the status bar
    pub fn load_stores(&mut self) {
        let mut errors = Vec::new();
        if let Err(e) = self.recipients.load() {
            errors.push(format!("Email list: {}", e));
        }
        if let Err(e) = self.profile.load() {
            errors.push(format!("SMTP config: {}", e));
        }
        if let Err(e) = self.draft.load() {
            errors.push(format!("Draft: {}", e));
        }
        if !self.recipients.is_empty() {
            self.recipient_state.select(Some(0));
        }
        if let Some(first) = errors.into_iter().next() {
            self.set_status(&first);
        }
    }

    pub fn set_status(&mut self, msg: &str) {
        self.status_message = Some(msg.to_string());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    fn push_log(&mut self, kind: LogKind, text: impl Into<String>) {
        self.log.push(LogLine {
            kind,
            text: text.into(),
        });
    }

    /// Handle one key press. Returns work that needs the real terminal.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match self.mode {
            Mode::Prompt(prompt) => {
                self.handle_prompt_key(prompt, key);
                Action::None
            }
            Mode::ConfirmSend => {
                self.mode = Mode::Normal;
                if matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter) {
                    self.start_send();
                } else {
                    self.set_status("Send cancelled");
                }
                Action::None
            }
            Mode::Normal => self.handle_normal_key(key),
        }
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Action {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit();
            return Action::None;
        }

        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return Action::None;
            }
            KeyCode::Tab => {
                self.view = self.view.next();
                return Action::None;
            }
            KeyCode::BackTab => {
                self.view = self.view.previous();
                return Action::None;
            }
            KeyCode::Char(c @ '1'..='4') => {
                self.view = View::ALL[(c as usize) - ('1' as usize)];
                return Action::None;
            }
            KeyCode::Char('h') | KeyCode::Left => {
                self.focus = Focus::Sidebar;
                return Action::None;
            }
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter if self.focus == Focus::Sidebar => {
                self.focus = Focus::Page;
                return Action::None;
            }
            _ => {}
        }

        if self.focus == Focus::Sidebar {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => self.view = self.view.next(),
                KeyCode::Char('k') | KeyCode::Up => self.view = self.view.previous(),
                _ => {}
            }
            return Action::None;
        }

        match self.view {
            View::Send => return self.handle_send_key(key),
            View::Recipients => self.handle_recipients_key(key),
            View::Smtp => self.handle_smtp_key(key),
            View::About => {}
        }
        Action::None
    }

    fn handle_send_key(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Char('e') => return Action::EditDraft,
            KeyCode::Char('A') => return Action::PickAttachments,
            KeyCode::Char('a') => self.open_prompt(Prompt::AddAttachment, String::new()),
            KeyCode::Char('d') => self.remove_selected_attachment(),
            KeyCode::Char('j') | KeyCode::Down => self.next_attachment(),
            KeyCode::Char('k') | KeyCode::Up => self.prev_attachment(),
            KeyCode::Char('w') => self.save_draft(),
            KeyCode::Char('s') => self.request_send(),
            KeyCode::Char('c') => self.cancel_send(),
            KeyCode::Char('x') if !self.orchestrator.is_running() => self.log.clear(),
            _ => {}
        }
        Action::None
    }

    fn handle_recipients_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.next_recipient(),
            KeyCode::Char('k') | KeyCode::Up => self.prev_recipient(),
            KeyCode::Char('a') => self.open_prompt(Prompt::AddRecipient, String::new()),
            KeyCode::Char('i') => self.open_prompt(Prompt::ImportRecipients, String::new()),
            KeyCode::Char('d') => self.remove_selected_recipient(),
            KeyCode::Char('w') => self.save_recipients(),
            _ => {}
        }
    }

    fn handle_smtp_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.smtp_selection = (self.smtp_selection + 1).min(SmtpField::ALL.len() - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.smtp_selection = self.smtp_selection.saturating_sub(1);
            }
            KeyCode::Enter => {
                let field = SmtpField::ALL[self.smtp_selection];
                if field == SmtpField::Security {
                    self.cycle_security();
                } else {
                    let current = self.field_value(field);
                    self.open_prompt(Prompt::Field(field), current);
                }
            }
            KeyCode::Char('t') => self.cycle_security(),
            KeyCode::Char('i') => self.open_prompt(Prompt::ImportProfile, String::new()),
            KeyCode::Char('w') => self.save_profile(),
            KeyCode::Char('T') => self.test_connection(),
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, prompt: Prompt, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.input.clear();
            }
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                let value = std::mem::take(&mut self.input);
                self.submit_prompt(prompt, value.trim_end_matches(['\r', '\n']));
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn open_prompt(&mut self, prompt: Prompt, initial: String) {
        self.input = initial;
        self.mode = Mode::Prompt(prompt);
    }

    fn submit_prompt(&mut self, prompt: Prompt, value: &str) {
        match prompt {
            Prompt::AddRecipient => self.add_recipient(value),
            Prompt::ImportRecipients => self.import_recipients(value),
            Prompt::ImportProfile => self.import_profile(value),
            Prompt::AddAttachment => {
                if !value.trim().is_empty() {
                    self.add_attachments(vec![value.trim().to_string()]);
                }
            }
            Prompt::Field(field) => self.set_field(field, value),
        }
    }

    fn quit(&mut self) {
        self.orchestrator.cancel();
        if self.draft_dirty {
            self.save_draft();
        }
        self.should_quit = true;
    }

    // --- Email list page -------------------------------------------------

    pub fn add_recipient(&mut self, address: &str) {
        match self.recipients.add(address) {
            Ok(true) => {
                let last = self.recipients.len() - 1;
                self.recipient_state.select(Some(last));
                self.set_status(&format!("Added {}", address.trim()));
            }
            Ok(false) => self.set_status(&format!("{} is already in the list", address.trim())),
            Err(e) => self.set_status(&e.to_string()),
        }
    }

    pub fn import_recipients(&mut self, path: &str) {
        if path.trim().is_empty() {
            return;
        }
        let path = expand(path.trim());
        match self.recipients.import_from(&path) {
            Ok(report) => {
                if self.recipient_state.selected().is_none() && !self.recipients.is_empty() {
                    self.recipient_state.select(Some(0));
                }
                self.set_status(&report.summary());
            }
            Err(e) => self.set_status(&format!("Failed to read file: {}", e)),
        }
    }

    pub fn remove_selected_recipient(&mut self) {
        let Some(selected) = self.recipient_state.selected() else {
            return;
        };
        if let Some(removed) = self.recipients.remove_at(selected) {
            self.set_status(&format!("Removed {}", removed));
        }
        if self.recipients.is_empty() {
            self.recipient_state.select(None);
        } else if selected >= self.recipients.len() {
            self.recipient_state.select(Some(self.recipients.len() - 1));
        }
    }

    pub fn save_recipients(&mut self) {
        match self.recipients.save() {
            Ok(()) => self.set_status(&format!("Saved {} recipients.", self.recipients.len())),
            Err(e) => self.set_status(&format!("Save failed: {}", e)),
        }
    }

    fn next_recipient(&mut self) {
        if self.recipients.is_empty() {
            return;
        }
        let max = self.recipients.len() - 1;
        let i = match self.recipient_state.selected() {
            Some(i) => (i + 1).min(max),
            None => 0,
        };
        self.recipient_state.select(Some(i));
    }

    fn prev_recipient(&mut self) {
        if self.recipients.is_empty() {
            return;
        }
        let i = match self.recipient_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.recipient_state.select(Some(i));
    }

    // --- SMTP page -------------------------------------------------------

    pub fn field_value(&self, field: SmtpField) -> String {
        let p = self.profile.profile();
        match field {
            SmtpField::Host => p.host.clone(),
            SmtpField::Port => p.port.to_string(),
            SmtpField::Username => p.username.clone(),
            SmtpField::Password => p.credential.clone(),
            SmtpField::Security => p.security.label().to_string(),
        }
    }

    fn set_field(&mut self, field: SmtpField, value: &str) {
        let p = self.profile.profile().clone();
        let mut host = p.host;
        let mut port = u32::from(p.port);
        let mut username = p.username;
        let mut credential = p.credential;

        match field {
            SmtpField::Host => host = value.to_string(),
            SmtpField::Port => match value.trim().parse::<u32>() {
                Ok(n) => port = n,
                Err(_) => {
                    self.set_status(&format!("Port must be a number, got {:?}", value.trim()));
                    return;
                }
            },
            SmtpField::Username => username = value.to_string(),
            SmtpField::Password => credential = value.to_string(),
            SmtpField::Security => return,
        }

        match self.profile.set(&host, port, &username, &credential) {
            Ok(()) => self.set_status(&format!("{} updated (w to save)", field.label())),
            Err(e) => self.set_status(&e.to_string()),
        }
    }

    fn cycle_security(&mut self) {
        let next = match self.profile.profile().security {
            Security::StartTls => Security::Tls,
            Security::Tls => Security::None,
            Security::None => Security::StartTls,
        };
        self.profile.set_security(next);
        self.set_status(&format!("Security: {}", next.label()));
    }

    pub fn import_profile(&mut self, path: &str) {
        if path.trim().is_empty() {
            return;
        }
        let path = expand(path.trim());
        let result = self.profile.import_from(&path).and_then(|_| self.profile.save());
        match result {
            Ok(()) => self.set_status("SMTP configuration imported and saved."),
            Err(e) => self.set_status(&format!("Failed to import config: {}", e)),
        }
    }

    pub fn save_profile(&mut self) {
        match self.profile.save() {
            Ok(()) => self.set_status("SMTP settings saved."),
            Err(e) => self.set_status(&format!("Save failed: {}", e)),
        }
    }

    /// Blocks until the server answers or the timeout passes
    pub fn test_connection(&mut self) {
        if self.connection_check.is_some() {
            self.set_status("Connection test already running...");
            return;
        }
        match self.orchestrator.spawn_connection_test(self.profile.profile()) {
            Ok(rx) => {
                self.connection_check = Some(rx);
                self.set_status("Testing connection...");
            }
            Err(e) => self.set_status(&format!("Connection failed: {}", e)),
        }
    }

    pub fn is_checking_connection(&self) -> bool {
        self.connection_check.is_some()
    }

    fn poll_connection_check(&mut self) {
        let Some(rx) = self.connection_check.as_ref() else {
            return;
        };
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => Err(DeliveryError::ConnectionLost(
                "connection test exited without an answer".to_string(),
            )),
        };
        self.connection_check = None;
        match result {
            Ok(()) => self.set_status("SMTP connection successful."),
            Err(e) => self.set_status(&format!("Connection failed: {}", e)),
        }
    }

    // --- Compose / send page --------------------------------------------

    /// Replace subject and body after editing, keeping attachments
    pub fn apply_edited_draft(&mut self, subject: &str, body: &str) {
        let attachments = self.draft.draft().attachments.clone();
        self.draft.update(subject.trim(), body, attachments);
        self.draft_dirty = true;
    }

    pub fn add_attachments(&mut self, paths: Vec<String>) {
        let mut added = 0;
        for path in paths {
            if self.draft.add_attachment(expand(&path)) {
                added += 1;
            }
        }
        if added > 0 {
            self.draft_dirty = true;
            self.set_status(&format!("Attached {} file(s)", added));
        }
    }

    pub fn remove_selected_attachment(&mut self) {
        if self.draft.remove_attachment(self.attachment_selection).is_some() {
            self.draft_dirty = true;
            let len = self.draft.draft().attachments.len();
            if self.attachment_selection >= len && self.attachment_selection > 0 {
                self.attachment_selection -= 1;
            }
        }
    }

    fn next_attachment(&mut self) {
        let len = self.draft.draft().attachments.len();
        if len > 0 {
            self.attachment_selection = (self.attachment_selection + 1) % len;
        }
    }

    fn prev_attachment(&mut self) {
        let len = self.draft.draft().attachments.len();
        if len > 0 {
            self.attachment_selection = if self.attachment_selection == 0 {
                len - 1
            } else {
                self.attachment_selection - 1
            };
        }
    }

    pub fn save_draft(&mut self) {
        match self.draft.save() {
            Ok(()) => {
                self.draft_dirty = false;
                self.last_autosave = Instant::now();
                self.set_status("Draft saved.");
            }
            Err(e) => self.set_status(&format!("Draft save failed: {}", e)),
        }
    }

    /// Save a modified draft once the configured interval has passed
    pub fn maybe_autosave(&mut self, now: Instant) {
        let Some(interval) = self.config.draft.autosave_interval() else {
            return;
        };
        if !self.draft_dirty || now.duration_since(self.last_autosave) < interval {
            return;
        }
        match self.draft.save() {
            Ok(()) => {
                self.draft_dirty = false;
                tracing::debug!("draft autosaved");
            }
            Err(e) => tracing::warn!(error = %e, "draft autosave failed"),
        }
        self.last_autosave = now;
    }

    pub fn is_draft_dirty(&self) -> bool {
        self.draft_dirty
    }

    /// Ask before sending without a subject
    pub fn request_send(&mut self) {
        if self.orchestrator.is_running() {
            self.set_status("A send is already in progress (c to cancel)");
            return;
        }
        if self.draft.draft().subject.trim().is_empty() && !self.recipients.is_empty() {
            self.mode = Mode::ConfirmSend;
            return;
        }
        self.start_send();
    }

    pub fn start_send(&mut self) {
        self.log.clear();
        self.progress = None;
        let result = self.orchestrator.start(
            self.draft.draft(),
            self.recipients.list(),
            self.profile.profile(),
        );
        match result {
            Ok(()) => self.set_status(&format!("Sending to {} recipients...", self.recipients.len())),
            Err(e) => {
                self.push_log(LogKind::Failure, format!("ERROR: {}", e));
                self.set_status(&e.to_string());
            }
        }
    }

    pub fn cancel_send(&mut self) {
        if self.orchestrator.is_running() {
            self.orchestrator.cancel();
            self.set_status("Cancelling after the current recipient...");
        }
    }

    /// Drain send progress into the log; call once per frame
    pub fn pump_events(&mut self) {
        for event in self.orchestrator.poll() {
            self.record_event(event);
        }
        self.poll_connection_check();
    }

    /// Block until the running send finishes (used when quitting)
    pub fn finish_send(&mut self) {
        for event in self.orchestrator.wait() {
            self.record_event(event);
        }
    }

    fn record_event(&mut self, event: SendEvent) {
        match event {
            SendEvent::Started { total } => {
                self.progress = Some((0, total));
                self.push_log(LogKind::Info, format!("Sending to {} recipients", total));
            }
            SendEvent::Result(result) => {
                self.progress = Some((result.index, result.total));
                let kind = if result.is_success() {
                    LogKind::Success
                } else {
                    LogKind::Failure
                };
                self.push_log(kind, result.log_line());
            }
            SendEvent::Notice(text) => self.push_log(LogKind::Info, text),
            SendEvent::Aborted { error, unsent } => {
                self.push_log(LogKind::Failure, format!("ERROR: SMTP error: {}", error));
                if !unsent.is_empty() {
                    self.push_log(
                        LogKind::Failure,
                        format!("{} recipients not sent", unsent.len()),
                    );
                }
            }
            SendEvent::Finished(summary) => {
                self.push_log(
                    LogKind::Info,
                    format!("Done. {} sent, {} failed", summary.sent, summary.failed),
                );
                self.set_status("Done.");
            }
        }
    }
}

/// Template handed to the editor: a `Subject:` header, blank line, body
pub fn draft_template(subject: &str, body: &str) -> String {
    format!("Subject: {}\n\n{}", subject, body)
}

/// Parse an edited template back into (subject, body)
pub fn parse_draft_template(content: &str) -> (String, String) {
    let mut subject = String::new();
    let mut in_headers = true;
    let mut body_lines = Vec::new();

    for line in content.lines() {
        if in_headers {
            if line.is_empty() {
                in_headers = false;
            } else if let Some(val) = line.strip_prefix("Subject:") {
                subject = val.trim().to_string();
            } else {
                // Not a header block after all
                in_headers = false;
                body_lines.push(line);
            }
        } else {
            body_lines.push(line);
        }
    }

    (subject, body_lines.join("\n"))
}

/// Suggested poll interval for the main loop
pub const TICK: Duration = Duration::from_millis(100);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::send::Session;
    use crate::store::SmtpProfile;
    use std::path::PathBuf;

    struct NullConnector;

    struct NullSession;

    impl Session for NullSession {
        fn send(&mut self, _message: &lettre::Message) -> Result<(), DeliveryError> {
            Ok(())
        }
    }

    impl Connector for NullConnector {
        fn connect(&self, _profile: &SmtpProfile) -> Result<Box<dyn Session>, DeliveryError> {
            Ok(Box::new(NullSession))
        }
    }

    fn app_in(dir: &tempfile::TempDir) -> App {
        let path = |n: &str| dir.path().join(n).to_string_lossy().into_owned();
        let config = Config {
            storage: StorageConfig {
                recipients: path("emails.json"),
                profile: path("config.json"),
                draft: path("draft.json"),
            },
            ..Config::default()
        };
        let mut app = App::new(Arc::new(config), Arc::new(NullConnector));
        app.load_stores();
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
    }

    fn configure_profile(app: &mut App) {
        app.profile
            .set("smtp.example.com", 587, "me@example.com", "pw")
            .unwrap();
    }

    #[test]
    fn test_view_cycle() {
        assert_eq!(View::Send.next(), View::Recipients);
        assert_eq!(View::About.next(), View::Send);
        assert_eq!(View::Send.previous(), View::About);
    }

    #[test]
    fn test_template_round_trip() {
        let text = draft_template("Hello there", "Line 1\n\nLine 3");
        let (subject, body) = parse_draft_template(&text);
        assert_eq!(subject, "Hello there");
        assert_eq!(body, "Line 1\n\nLine 3");
    }

    #[test]
    fn test_template_without_header_is_all_body() {
        let (subject, body) = parse_draft_template("just a body\nsecond line");
        assert!(subject.is_empty());
        assert_eq!(body, "just a body\nsecond line");
    }

    #[test]
    fn test_add_recipient_through_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.handle_key(key(KeyCode::Char('2')));
        assert_eq!(app.view, View::Recipients);

        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.mode, Mode::Prompt(Prompt::AddRecipient));
        type_text(&mut app, "a@x.com");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.recipients.len(), 1);
        assert_eq!(app.recipient_state.selected(), Some(0));

        app.handle_key(key(KeyCode::Char('a')));
        type_text(&mut app, "nope");
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.recipients.len(), 1);
        assert!(app.status_message.as_deref().unwrap().contains("invalid email"));
    }

    #[test]
    fn test_remove_selected_recipient_keeps_selection_in_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.add_recipient("a@x.com");
        app.add_recipient("b@x.com");
        assert_eq!(app.recipient_state.selected(), Some(1));

        app.remove_selected_recipient();
        assert_eq!(app.recipient_state.selected(), Some(0));
        app.remove_selected_recipient();
        assert_eq!(app.recipient_state.selected(), None);
        assert!(app.recipients.is_empty());
    }

    #[test]
    fn test_port_field_validation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.set_field(SmtpField::Port, "99999");
        assert_eq!(app.profile.profile().port, 587);
        assert!(app.status_message.as_deref().unwrap().contains("invalid port"));

        app.set_field(SmtpField::Port, "abc");
        assert_eq!(app.profile.profile().port, 587);

        app.set_field(SmtpField::Port, "2525");
        assert_eq!(app.profile.profile().port, 2525);
    }

    #[test]
    fn test_send_without_subject_asks_first() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        configure_profile(&mut app);
        app.add_recipient("a@x.com");

        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.mode, Mode::ConfirmSend);
        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.mode, Mode::Normal);
        assert!(!app.orchestrator.is_running());

        app.handle_key(key(KeyCode::Char('s')));
        app.handle_key(key(KeyCode::Char('y')));
        app.finish_send();
        assert!(app.log.iter().any(|l| l.text == "[1/1] Sent to a@x.com"));
        assert_eq!(app.status_message.as_deref(), Some("Done."));
    }

    #[test]
    fn test_send_with_no_recipients_logs_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        configure_profile(&mut app);
        app.apply_edited_draft("Subject", "Body");

        app.request_send();
        assert!(!app.orchestrator.is_running());
        assert_eq!(app.log.len(), 1);
        assert_eq!(app.log[0].kind, LogKind::Failure);
    }

    #[test]
    fn test_autosave_only_when_dirty_and_due() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        let start = Instant::now();

        app.maybe_autosave(start + Duration::from_secs(60));
        assert!(!app.draft.path().exists());

        app.apply_edited_draft("Later", "body");
        app.maybe_autosave(app.last_autosave + Duration::from_secs(1));
        assert!(app.is_draft_dirty());

        app.maybe_autosave(app.last_autosave + Duration::from_secs(31));
        assert!(!app.is_draft_dirty());
        assert!(app.draft.path().exists());
    }

    #[test]
    fn test_attachment_selection_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.add_attachments(vec!["/tmp/a.pdf".into(), "/tmp/b.pdf".into()]);
        assert_eq!(app.draft.draft().attachments.len(), 2);

        app.next_attachment();
        app.next_attachment();
        assert_eq!(app.attachment_selection, 0);
        app.prev_attachment();
        assert_eq!(app.attachment_selection, 1);
        app.remove_selected_attachment();
        assert_eq!(app.attachment_selection, 0);
        assert_eq!(
            app.draft.draft().attachments,
            vec![PathBuf::from("/tmp/a.pdf")]
        );
    }

    #[test]
    fn test_connection_result_arrives_on_pump() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        configure_profile(&mut app);

        app.test_connection();
        assert_eq!(app.status_message.as_deref(), Some("Testing connection..."));

        for _ in 0..400 {
            app.pump_events();
            if !app.is_checking_connection() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(!app.is_checking_connection());
        assert_eq!(
            app.status_message.as_deref(),
            Some("SMTP connection successful.")
        );
    }

    #[test]
    fn test_sidebar_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(&dir);
        app.handle_key(key(KeyCode::Char('h')));
        assert_eq!(app.focus, Focus::Sidebar);
        app.handle_key(key(KeyCode::Char('j')));
        app.handle_key(key(KeyCode::Char('j')));
        assert_eq!(app.view, View::Smtp);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.focus, Focus::Page);
    }
}
