//! Copilot panel: per-document transcript above a one-line input box.
//!
//! The transcript is pinned to its bottom; `state.chat_scroll` counts rows
//! scrolled back up from there.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Paragraph, Wrap},
};

use quill_core::{Message, MessageKind, Role};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

const QUOTE_PREVIEW_CHARS: usize = 60;

pub fn render_chat(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Copilot;
    frame.render_widget(panel_block(" Copilot ", is_focused, theme), area);

    let inner = inner_rect(area);
    if inner.width == 0 || inner.height == 0 {
        return;
    }
    let input_height = if state.pending_quote.is_some() { 4 } else { 3 };
    let [transcript_area, input_area] =
        inner.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(input_height)]));

    let lines = transcript_lines(
        state.store.chat_transcript(state.store.active_id()).unwrap_or_default(),
        theme,
    );
    let total: usize = lines.iter().map(|l| wrapped_height(l, transcript_area.width)).sum();
    let max_scroll = total.saturating_sub(usize::from(transcript_area.height));
    let back = usize::from(state.chat_scroll).min(max_scroll);
    state.chat_scroll = u16::try_from(back).unwrap_or(u16::MAX);
    let top = u16::try_from(max_scroll - back).unwrap_or(u16::MAX);

    frame.render_widget(
        Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }).scroll((top, 0)),
        transcript_area,
    );

    render_input(frame, input_area, state, is_focused, theme);
}

fn render_input(frame: &mut Frame, area: Rect, state: &AppState, is_focused: bool, theme: &Theme) {
    let typing = is_focused && state.mode == Mode::Insert;
    let hint = if state.editor.selection().is_some() {
        " Ask Copilot · edits selection "
    } else {
        " Ask Copilot "
    };
    let block = Block::bordered()
        .title(hint)
        .border_style(Style::default().fg(if typing { theme.border_active } else { theme.border_inactive }));

    let mut lines = Vec::new();
    if let Some(quote) = &state.pending_quote {
        let mut preview: String = quote.chars().take(QUOTE_PREVIEW_CHARS).collect();
        if preview.len() < quote.len() {
            preview.push('…');
        }
        lines.push(Line::styled(
            format!("> {}", preview.replace('\n', " ")),
            Style::default().fg(theme.chat_quote).add_modifier(Modifier::ITALIC),
        ));
    }
    if state.chat_input.is_empty() && !typing {
        lines.push(Line::styled("Press i to ask...", Style::default().fg(theme.muted)));
    } else {
        let mut spans = vec![Span::styled(state.chat_input.clone(), Style::default().fg(theme.text))];
        if typing {
            spans.push(Span::styled(" ", Style::default().bg(theme.cursor_bg)));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn transcript_lines(messages: &[Message], theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for msg in messages {
        let (who, color) = match msg.role {
            Role::User => ("You", theme.chat_user),
            Role::Assistant => ("Copilot", theme.chat_assistant),
        };
        lines.push(Line::styled(who, Style::default().fg(color).add_modifier(Modifier::BOLD)));

        match (&msg.card, msg.kind) {
            (Some(card), MessageKind::Card | MessageKind::Confirmation) => {
                let card_style = Style::default().fg(theme.chat_card);
                lines.push(Line::styled(
                    format!("┃ {}", card.title),
                    card_style.add_modifier(Modifier::BOLD),
                ));
                lines.extend(card.content.lines().map(|l| Line::styled(format!("┃ {l}"), card_style)));
                if msg.kind == MessageKind::Confirmation {
                    lines.push(Line::styled(
                        "  [c] insert into document",
                        Style::default().fg(theme.muted),
                    ));
                }
            }
            _ => {
                for text in msg.content.lines() {
                    let style = if text.starts_with("> ") || msg.kind == MessageKind::Quote {
                        Style::default().fg(theme.chat_quote).add_modifier(Modifier::ITALIC)
                    } else {
                        Style::default().fg(theme.text)
                    };
                    lines.push(Line::styled(text.to_owned(), style));
                }
            }
        }
        lines.push(Line::default());
    }
    lines
}

/// Rows `line` occupies when wrapped at `width`.
fn wrapped_height(line: &Line, width: u16) -> usize {
    let width = usize::from(width.max(1));
    line.width().div_ceil(width).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_core::CardData;

    #[test]
    fn confirmation_card_shows_insert_hint() {
        let theme = Theme::dark();
        let card = Message::confirmation(CardData { title: "Outline".into(), content: "a\nb".into() });
        let lines = transcript_lines(&[card], &theme);
        let text: Vec<String> = lines.iter().map(|l| l.to_string()).collect();
        assert_eq!(text[0], "Copilot");
        assert_eq!(text[1], "┃ Outline");
        assert_eq!(text[2], "┃ a");
        assert_eq!(text[3], "┃ b");
        assert!(text[4].contains("[c]"));
    }

    #[test]
    fn spent_card_has_no_hint() {
        let theme = Theme::dark();
        let mut card = Message::confirmation(CardData { title: "T".into(), content: "x".into() });
        card.kind = MessageKind::Card;
        let lines = transcript_lines(&[card], &theme);
        assert!(!lines.iter().any(|l| l.to_string().contains("[c]")));
    }

    #[test]
    fn wrapped_height_rounds_up() {
        assert_eq!(wrapped_height(&Line::from("abcdef"), 4), 2);
        assert_eq!(wrapped_height(&Line::default(), 4), 1);
    }
}
