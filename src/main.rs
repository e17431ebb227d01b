use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, Write};
use std::process::Command;
use std::sync::Arc;
use std::time::Instant;

use bulkmail::app::{self, Action, App, Focus, Mode, View};
use bulkmail::config::Config;
use bulkmail::send::SmtpConnector;
use bulkmail::{logging, ui};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

fn main() -> Result<()> {
    // Logging failures are not fatal; the UI still works without a log file
    let log_error = logging::init(&logging::default_log_path()).err();

    let config = Arc::new(Config::load());
    let connector = SmtpConnector::new(config.send.timeout(), config.send.hello_name.clone());

    let mut app = App::new(Arc::clone(&config), Arc::new(connector));
    app.load_stores();
    if let Some(e) = log_error {
        app.set_status(&format!("Logging disabled: {}", e));
    }
    tracing::info!(recipients = app.recipients.len(), "bulkmail started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    // Restore terminal even if the loop failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if app.orchestrator.is_running() {
        eprintln!("Waiting for the current recipient to finish...");
        app.finish_send();
    }
    tracing::info!("bulkmail exiting");
    result
}

fn run(terminal: &mut Term, app: &mut App) -> Result<()> {
    loop {
        app.pump_events();
        app.maybe_autosave(Instant::now());
        terminal.draw(|f| render(app, f))?;

        if app.should_quit {
            return Ok(());
        }

        // Poll with timeout so send progress redraws without key presses
        if !event::poll(app::TICK)? {
            continue;
        }

        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if app.mode == Mode::Normal {
                    app.clear_status();
                }
                match app.handle_key(key) {
                    Action::None => {}
                    Action::EditDraft => {
                        let editor = app.config.compose.editor_command();
                        let draft = app.draft.draft();
                        match edit_draft(terminal, &editor, &draft.subject, &draft.body) {
                            Ok(Some((subject, body))) => app.apply_edited_draft(&subject, &body),
                            Ok(None) => app.set_status("Editor exited with an error; draft unchanged"),
                            Err(e) => app.set_status(&format!("Editor failed: {}", e)),
                        }
                    }
                    Action::PickAttachments => {
                        let picker = app.config.compose.file_picker.clone();
                        match pick_files(terminal, &picker) {
                            Ok(Some(files)) => app.add_attachments(files),
                            Ok(None) => {}
                            Err(e) => app.set_status(&format!("File picker failed: {}", e)),
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn render(app: &mut App, f: &mut Frame) {
    let theme = &app.config.theme;
    let area = f.area();

    f.render_widget(
        ratatui::widgets::Block::default().style(Style::default().bg(theme.bg())),
        area,
    );

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(app.config.layout.sidebar_width),
            Constraint::Min(20),
        ])
        .split(rows[0]);

    let sidebar_focused = app.focus == Focus::Sidebar;
    ui::render_sidebar(f, cols[0], app.view, sidebar_focused, theme);

    let page_focused = !sidebar_focused;
    match app.view {
        View::Send => {
            let page = ui::SendPage {
                draft: app.draft.draft(),
                recipient_count: app.recipients.len(),
                attachment_selection: app.attachment_selection,
                log: &app.log,
                progress: app.progress,
                running: app.orchestrator.is_running(),
                log_height: app.config.layout.log_height,
                focused: page_focused,
            };
            ui::render_send_page(f, cols[1], &page, theme);
        }
        View::Recipients => ui::render_recipients(
            f,
            cols[1],
            app.recipients.list(),
            &mut app.recipient_state,
            page_focused,
            theme,
        ),
        View::Smtp => ui::render_smtp(
            f,
            cols[1],
            app.profile.profile(),
            app.smtp_selection,
            page_focused,
            theme,
        ),
        View::About => ui::render_about(f, cols[1], &app.config, page_focused, theme),
    }

    ui::render_help(
        f,
        rows[1],
        app.view,
        app.focus,
        app.mode,
        app.status_message.as_deref(),
        theme,
    );

    match app.mode {
        Mode::Prompt(prompt) => ui::render_prompt(f, area, prompt, &app.input, theme),
        Mode::ConfirmSend => ui::render_confirm_send(f, area, app.recipients.len(), theme),
        Mode::Normal => {}
    }
}

/// Leave the alternate screen, run `f`, and come back
fn suspended<T>(terminal: &mut Term, f: impl FnOnce() -> Result<T>) -> Result<T> {
    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;

    let result = f();

    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    terminal.clear()?;
    result
}

/// Edit subject and body in the user's editor
fn edit_draft(
    terminal: &mut Term,
    editor: &str,
    subject: &str,
    body: &str,
) -> Result<Option<(String, String)>> {
    let mut temp_file = tempfile::Builder::new()
        .prefix("bulkmail-")
        .suffix(".eml")
        .tempfile()?;
    write!(temp_file, "{}", app::draft_template(subject, body))?;
    temp_file.flush()?;
    let path = temp_file.path().to_owned();

    // Allow "code --wait" style editor settings
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");
    let args: Vec<&str> = parts.collect();

    let status = suspended(terminal, || {
        Command::new(program)
            .args(&args)
            .arg(&path)
            .status()
            .with_context(|| format!("running {}", program))
    })?;

    if !status.success() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path)?;
    Ok(Some(app::parse_draft_template(&content)))
}

/// Run a yazi-compatible chooser and return the selected paths
fn pick_files(terminal: &mut Term, picker: &str) -> Result<Option<Vec<String>>> {
    let temp_file = tempfile::NamedTempFile::new()?;
    let temp_path = temp_file.path().to_owned();

    let status = suspended(terminal, || {
        Command::new(picker)
            .arg("--chooser-file")
            .arg(&temp_path)
            .status()
            .with_context(|| format!("running {}", picker))
    })?;

    if !status.success() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&temp_path).unwrap_or_default();
    let files: Vec<String> = content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|s| s.to_string())
        .collect();

    if files.is_empty() {
        Ok(None)
    } else {
        Ok(Some(files))
    }
}
