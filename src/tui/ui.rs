use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::widgets::{drill, sessions};
use super::{App, View};
use crate::notify::Notifier;
use crate::session::DrillView;

pub fn draw<N: Notifier>(f: &mut Frame, app: &App<N>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Session bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    let view = app.controller().current_view();

    draw_session_bar(f, &view, chunks[0]);
    drill::draw(f, &view, chunks[1]);
    if app.view == View::Sessions {
        sessions::draw(f, app, chunks[1]);
    }
    draw_help_bar(f, app, chunks[2]);
}

fn draw_session_bar(f: &mut Frame, view: &DrillView, area: Rect) {
    let title = view
        .group
        .as_ref()
        .map(|g| g.title.clone())
        .unwrap_or_else(|| "-".to_string());

    let line = Line::from(vec![
        Span::styled(
            title,
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("  Session ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} / {}", view.group_position, view.group_count),
            Style::default().fg(Color::White),
        ),
        Span::styled("  Step ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{} / {}", view.step_position, view.step_count),
            Style::default().fg(Color::White),
        ),
        Span::styled("  Completed ", Style::default().fg(Color::Gray)),
        Span::styled(
            format!("{}", view.total_sessions),
            Style::default().fg(Color::Green),
        ),
    ]);

    let bar = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" Hanon "));
    f.render_widget(bar, area);
}

fn draw_help_bar<N: Notifier>(f: &mut Frame, app: &App<N>, area: Rect) {
    let mut spans = Vec::new();

    if let Some(status) = &app.status {
        spans.extend(vec![
            Span::styled(status.clone(), Style::default().fg(Color::Yellow)),
            Span::raw(" | "),
        ]);
    }

    match app.view {
        View::Drill => {
            spans.extend(vec![
                Span::styled("<Space>", Style::default().fg(Color::Cyan)),
                Span::raw(" Answer  "),
                Span::styled("n/<CR>", Style::default().fg(Color::Cyan)),
                Span::raw(" Next  "),
                Span::styled("s", Style::default().fg(Color::Cyan)),
                Span::raw(" Sessions  "),
                Span::styled("p/P", Style::default().fg(Color::Cyan)),
                Span::raw(" Speak  "),
                Span::styled("^r", Style::default().fg(Color::Cyan)),
                Span::raw(" Reload  "),
            ]);
        }
        View::Sessions => {
            spans.extend(vec![
                Span::styled("j/k", Style::default().fg(Color::Cyan)),
                Span::raw(" Nav  "),
                Span::styled("g/G", Style::default().fg(Color::Cyan)),
                Span::raw(" Top/Bot  "),
                Span::styled("<CR>", Style::default().fg(Color::Cyan)),
                Span::raw(" Start  "),
                Span::styled("<Esc>", Style::default().fg(Color::Cyan)),
                Span::raw(" Close  "),
            ]);
        }
    }

    spans.extend(vec![
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::raw(" Quit"),
    ]);

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use std::fs;

    use crate::db::Database;
    use crate::notify::LogNotifier;
    use crate::source::DataSource;

    fn render(app: &App<LogNotifier>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn setup_app(dir: &tempfile::TempDir) -> App<LogNotifier> {
        let path = dir.path().join("questions.csv");
        fs::write(
            &path,
            "group_id,step_no,base_en,base_ja,instruction,answer_en,group_title\n\
             1,1,I eat.,taberu,Past tense,I ate.,Basics\n\
             2,1,She runs.,hashiru,Negate,She does not run.,\n",
        )
        .unwrap();
        let db = Database::open(":memory:").unwrap();
        db.init().unwrap();
        App::new(db, DataSource::File(path), LogNotifier).unwrap()
    }

    #[test]
    fn draws_prompt_and_hides_answer() {
        let dir = tempfile::tempdir().unwrap();
        let app = setup_app(&dir);
        let screen = render(&app);
        assert!(screen.contains("Basics"));
        assert!(screen.contains("I eat."));
        assert!(screen.contains("Past tense"));
        assert!(!screen.contains("I ate."));
    }

    #[test]
    fn draws_answer_once_revealed() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = setup_app(&dir);
        app.controller.reveal_answer();
        let screen = render(&app);
        assert!(screen.contains("I ate."));
    }

    #[test]
    fn draws_session_picker() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = setup_app(&dir);
        app.open_sessions();
        let screen = render(&app);
        assert!(screen.contains("1. Basics"));
        assert!(screen.contains("2. Session 2"));
    }
}
