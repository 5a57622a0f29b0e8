pub mod widgets;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Style};
use ratatui::text::Line;
use ratatui::{DefaultTerminal, Frame};

use crate::pipeline::policy::{Scheme, Theme};
use crate::pipeline::worker::{Extraction, Extractor, Job};
use crate::pipeline::ExtractSettings;

use widgets::SchemeWidget;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// State for the interactive viewer.
///
/// Switching image or theme requests a new extraction; only the result for
/// the most recent request is applied. A failed extraction keeps the
/// previously shown scheme.
pub struct TuiApp {
    pub images: Vec<PathBuf>,
    pub index: usize,
    pub theme: Theme,
    pub scheme: Option<Scheme>,
    pub pending: Option<u64>,
    pub error: Option<String>,
    pub quit: bool,
}

impl TuiApp {
    pub fn new(images: Vec<PathBuf>, theme: Theme) -> Self {
        Self {
            images,
            index: 0,
            theme,
            scheme: None,
            pending: None,
            error: None,
            quit: false,
        }
    }

    pub fn current_job(&self) -> Option<Job> {
        self.images.get(self.index).map(|path| Job {
            path: path.clone(),
            theme: self.theme,
        })
    }

    /// Apply a key press. Returns whether a new extraction is needed.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.quit = true;
                false
            }
            KeyCode::Char('t') => {
                self.theme = self.theme.toggled();
                true
            }
            KeyCode::Char('n') | KeyCode::Right if self.images.len() > 1 => {
                self.index = (self.index + 1) % self.images.len();
                true
            }
            KeyCode::Char('p') | KeyCode::Left if self.images.len() > 1 => {
                self.index = (self.index + self.images.len() - 1) % self.images.len();
                true
            }
            _ => false,
        }
    }

    /// Take a finished extraction if it answers the outstanding request.
    pub fn apply(&mut self, extraction: Extraction) {
        if self.pending != Some(extraction.generation) {
            return;
        }
        self.pending = None;
        match extraction.result {
            Ok(scheme) => {
                self.scheme = Some(scheme);
                self.error = None;
            }
            Err(err) => self.error = Some(err.to_string()),
        }
    }

    fn status_line(&self) -> Line<'static> {
        let name = self
            .images
            .get(self.index)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        let mut text = format!(
            " {name}  [{}]  {}/{}  t: theme  n/p: image  q: quit",
            self.theme,
            self.index + 1,
            self.images.len()
        );
        if self.pending.is_some() {
            text.push_str("  extracting...");
        }
        match &self.error {
            Some(err) => Line::styled(format!(" error: {err}"), Style::default().fg(Color::Red)),
            None => Line::from(text),
        }
    }
}

/// Launch the TUI application.
pub fn run(mut app: TuiApp, settings: ExtractSettings) -> Result<()> {
    let mut extractor = Extractor::spawn(settings);
    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut app, &mut extractor);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    app: &mut TuiApp,
    extractor: &mut Extractor,
) -> Result<()> {
    if let Some(job) = app.current_job() {
        app.pending = Some(extractor.request(job));
    }

    while !app.quit {
        if let Some(extraction) = extractor.try_recv() {
            app.apply(extraction);
        }
        terminal.draw(|frame| draw(frame, app))?;

        if event::poll(POLL_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key.code) {
                    if let Some(job) = app.current_job() {
                        app.pending = Some(extractor.request(job));
                    }
                }
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, app: &TuiApp) {
    let [main, status] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(frame.area());

    match &app.scheme {
        Some(scheme) => frame.render_widget(SchemeWidget::new(scheme), main),
        None => frame.render_widget(Line::from(" extracting colors..."), main),
    }
    frame.render_widget(app.status_line(), status);
}
