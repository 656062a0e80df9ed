mod ui;
mod widgets;

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::db::Database;
use crate::models::Group;
use crate::notify::{BellNotifier, Notifier};
use crate::session::SessionController;
use crate::source::{self, DataSource};
use crate::store::QuestionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Drill,
    Sessions,
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i >= self.items.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) => {
                if i == 0 {
                    self.items.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

pub struct App<N: Notifier> {
    controller: SessionController<Database, N>,
    source: DataSource,
    pub view: View,
    pub sessions: StatefulList<Group>,
    pub status: Option<String>,
    pub should_quit: bool,
}

impl<N: Notifier> App<N> {
    pub fn new(
        db: Database,
        source: DataSource,
        notifier: N,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let store = source::load_store(&db, &source)?;
        let controller = SessionController::new(store, db, notifier)?;

        Ok(Self {
            controller,
            source,
            view: View::Drill,
            sessions: StatefulList::with_items(Vec::new()),
            status: None,
            should_quit: false,
        })
    }

    pub fn controller(&self) -> &SessionController<Database, N> {
        &self.controller
    }

    // A failed refresh keeps the data already loaded
    pub fn refresh_data(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let loaded = source::load_source_text(self.controller.gateway(), &self.source)
            .and_then(|loaded| Ok((QuestionStore::from_text(&loaded.text)?, loaded.from_cache)));
        match loaded {
            Ok((store, from_cache)) => {
                self.controller.reload(store)?;
                self.status = Some(if from_cache {
                    "Reloaded from offline copy".to_string()
                } else {
                    "Reloaded".to_string()
                });
            }
            Err(e) => {
                log::warn!("Reload failed: {}", e);
                self.status = Some(format!("Reload failed: {}", e));
            }
        }
        Ok(())
    }

    fn open_sessions(&mut self) {
        let groups = self.controller.groups();
        let current = self.controller.progress().current_group_id.clone();
        let selected = groups
            .iter()
            .position(|g| Some(&g.id) == current.as_ref())
            .or(if groups.is_empty() { None } else { Some(0) });
        self.sessions = StatefulList { items: groups, selected };
        self.view = View::Sessions;
    }

    fn choose_session(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(group) = self.sessions.selected_item() {
            let id = group.id.clone();
            self.controller.select_group(&id)?;
            self.status = None;
        }
        self.view = View::Drill;
        Ok(())
    }

    fn next_step(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let before = self.controller.progress().total_sessions_completed;
        self.controller.advance()?;
        let after = self.controller.progress().total_sessions_completed;
        self.status = if after > before {
            Some(format!("Session complete! ({} total)", after))
        } else {
            None
        };
        Ok(())
    }

    fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            _ => match self.view {
                View::Drill => self.handle_drill_key(key)?,
                View::Sessions => self.handle_sessions_key(key)?,
            },
        }
        Ok(())
    }

    fn handle_drill_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Char(' ') | KeyCode::Char('a') => {
                self.controller.reveal_answer();
            }
            KeyCode::Char('n') | KeyCode::Char('l') | KeyCode::Right | KeyCode::Enter => {
                self.next_step()?;
            }
            KeyCode::Char('s') => self.open_sessions(),
            KeyCode::Char('p') => self.controller.speak_prompt(),
            KeyCode::Char('P') => self.controller.speak_answer(),
            _ => {}
        }
        Ok(())
    }

    fn handle_sessions_key(&mut self, key: KeyCode) -> Result<(), Box<dyn std::error::Error>> {
        match key {
            KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('s') | KeyCode::Left => {
                self.view = View::Drill;
            }
            KeyCode::Char('j') | KeyCode::Down => self.sessions.next(),
            KeyCode::Char('k') | KeyCode::Up => self.sessions.previous(),
            KeyCode::Char('g') if !self.sessions.items.is_empty() => {
                self.sessions.selected = Some(0);
            }
            KeyCode::Char('G') if !self.sessions.items.is_empty() => {
                self.sessions.selected = Some(self.sessions.items.len() - 1);
            }
            KeyCode::Enter | KeyCode::Char('l') => self.choose_session()?,
            _ => {}
        }
        Ok(())
    }
}

pub fn run(db: Database, source: DataSource) -> Result<(), Box<dyn std::error::Error>> {
    // Load before touching the terminal so a fatal load error prints normally
    let mut app = App::new(db, source, BellNotifier::new(io::stdout()))?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<N: Notifier>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App<N>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key.code, key.modifiers)?;
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
