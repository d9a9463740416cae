//! Modal dialogs drawn over the panels: the topic prompt and yes/no confirms.

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::app::{AppState, Mode, PromptKind};
use crate::theme::Theme;

fn modal_area(frame: &Frame, height: u16) -> Rect {
    frame.area().centered(Constraint::Percentage(60), Constraint::Length(height))
}

/// Renders the AI Creation / Outline topic prompt.
pub fn render_prompt(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let Some(prompt) = &state.prompt else {
        return;
    };
    let area = modal_area(frame, 6);
    frame.render_widget(Clear, area);

    let question = match prompt.kind {
        PromptKind::Create => "What should I write at the caret?",
        PromptKind::Outline => "Topic for the outline:",
    };
    let lines = vec![
        Line::styled(question, Style::default().fg(theme.muted)),
        Line::from(vec![
            Span::styled(prompt.input.clone(), Style::default().fg(theme.text)),
            Span::styled(" ", Style::default().bg(theme.cursor_bg)),
        ]),
        Line::default(),
        Line::styled(
            format!("Enter to generate as {} · {}   Esc to cancel", state.persona, state.tone),
            Style::default().fg(theme.muted),
        ),
    ];
    let block = Block::bordered()
        .title(prompt.kind.title())
        .border_style(Style::default().fg(theme.status_mode_prompt));
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}

/// Renders the delete or quit confirmation for the matching modes.
pub fn render_confirm(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let (title, body) = match state.mode {
        Mode::ConfirmDelete => (
            " Delete document ",
            format!("Delete \"{}\" and its chat history?", state.store.active_document().title),
        ),
        Mode::ConfirmQuit => (
            " Quit ",
            "Generation is still running. Quit anyway?".to_owned(),
        ),
        _ => return,
    };
    let area = modal_area(frame, 5);
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::styled(body, Style::default().fg(theme.text)),
        Line::default(),
        Line::styled("y confirm · n cancel", Style::default().add_modifier(Modifier::BOLD)),
    ];
    let block = Block::bordered()
        .title(title)
        .border_style(Style::default().fg(theme.status_error));
    frame.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}
