use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::models::DrillItem;
use crate::session::DrillView;

pub fn draw(f: &mut Frame, view: &DrillView, area: Rect) {
    let Some(item) = &view.item else {
        let block = Block::default().borders(Borders::ALL).title(" Drill ");
        let paragraph = Paragraph::new("No data available")
            .style(Style::default().fg(Color::Red))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Base sentence + gloss
            Constraint::Length(3), // Instruction
            Constraint::Min(0),    // Answer
        ])
        .split(area);

    draw_prompt(f, item, chunks[0]);
    draw_instruction(f, item, chunks[1]);
    draw_answer(f, item, view.answer_revealed, chunks[2]);
}

fn draw_prompt(f: &mut Frame, item: &DrillItem, area: Rect) {
    let text = vec![
        Line::from(Span::styled(
            item.prompt_primary.as_str(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            item.prompt_secondary.as_str(),
            Style::default().fg(Color::Gray),
        )),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Base ")
        .title_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_instruction(f: &mut Frame, item: &DrillItem, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Task ")
        .title_style(Style::default().fg(Color::Magenta));

    let paragraph = Paragraph::new(Span::styled(
        item.instruction.as_str(),
        Style::default().fg(Color::Yellow),
    ))
    .block(block)
    .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn draw_answer(f: &mut Frame, item: &DrillItem, revealed: bool, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Answer ")
        .title_style(Style::default().fg(Color::Green));

    let line = if revealed {
        Line::from(Span::styled(
            item.answer.as_str(),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ))
    } else {
        Line::from(Span::styled(
            "Press <Space> to reveal",
            Style::default().fg(Color::DarkGray),
        ))
    };

    let paragraph = Paragraph::new(line).block(block).wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}
