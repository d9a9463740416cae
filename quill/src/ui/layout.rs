//! Responsive 3-panel layout for quill.
//!
//! Pure layout arithmetic plus the shared panel chrome. Called inside
//! `terminal.draw()` every frame so the layout always tracks the terminal size.
//!
//! At `>= 120` columns documents, editor and copilot are all visible. Between
//! 80 and 119 the document list collapses. Below 80 only the editor remains.
//!
//! `Spacing::Overlap(1)` with `MergeStrategy::Fuzzy` lets adjacent borders share
//! one column and merge their junction glyphs.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use quill_core::text::word_count;

use crate::app::{AppState, Mode};
use crate::theme::Theme;

const LEFT_PCT: u16 = 20;
const CENTER_PCT: u16 = 50;
const RIGHT_PCT: u16 = 30;

/// Returns `[documents, editor, copilot, status_bar]` for the current frame.
///
/// Collapsed panels come back with zero width; callers skip rendering them.
pub fn compute_layout(area: Rect) -> [Rect; 4] {
    let [main_area, status_bar] =
        area.layout(&Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]));

    let constraints = match area.width {
        w if w >= 120 => [
            Constraint::Percentage(LEFT_PCT),
            Constraint::Percentage(CENTER_PCT),
            Constraint::Percentage(RIGHT_PCT),
        ],
        w if w >= 80 => [Constraint::Length(0), Constraint::Percentage(60), Constraint::Fill(1)],
        _ => [Constraint::Length(0), Constraint::Fill(1), Constraint::Length(0)],
    };
    let horizontal = Layout::horizontal(constraints).spacing(Spacing::Overlap(1));
    let [left, center, right] = main_area.layout(&horizontal);

    [left, center, right, status_bar]
}

/// Inner `Rect` of a panel after removing its 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered panel block; thick border when focused.
///
/// `Fuzzy` merging is required because `Exact` draws broken junctions where
/// thick and plain borders meet.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the 1-row status bar.
///
/// Mode, persona, tone, word count and AI rate, followed by the transient
/// status message or a streaming marker while generation runs.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert => (" INSERT ", theme.status_mode_insert),
        Mode::Prompt => (" PROMPT ", theme.status_mode_prompt),
        Mode::Normal | Mode::ConfirmDelete | Mode::ConfirmQuit | Mode::HelpOverlay => {
            (" NORMAL ", theme.status_mode_normal)
        }
    };

    let content = state.active_content();
    let caret = state.editor.position(content);
    let mut spans = vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(format!(" {} · {} ", state.persona, state.tone)),
        Span::raw(format!("│ Ln {}, Col {} ", caret.row + 1, caret.col + 1)),
        Span::raw(format!("│ {} words ", word_count(content))),
    ];
    match state.ai_rate {
        Some(rate) => spans.push(Span::styled(
            format!("│ AI {rate} "),
            Style::default().fg(theme.rate_color(rate.band())),
        )),
        None => spans.push(Span::raw("│ AI -- ")),
    }

    if let Some(status) = &state.status {
        let fg = if status.is_error { theme.status_error } else { theme.status_bar_fg };
        spans.push(Span::styled(format!("│ {}", status.text), Style::default().fg(fg)));
    } else if state.store.is_streaming(state.store.active_id()) {
        spans.push(Span::styled(
            "│ ● streaming (x to stop)",
            Style::default().fg(theme.status_streaming).add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_terminal_shows_three_panels() {
        let [left, center, right, status] = compute_layout(Rect::new(0, 0, 200, 50));
        assert!(left.width > 0 && center.width > 0 && right.width > 0);
        assert_eq!(status.height, 1);
        assert_eq!(status.y, 49);
    }

    #[test]
    fn medium_terminal_hides_documents() {
        let [left, center, right, _] = compute_layout(Rect::new(0, 0, 100, 30));
        assert_eq!(left.width, 0);
        assert!(center.width > right.width && right.width > 0);
    }

    #[test]
    fn narrow_terminal_keeps_only_editor() {
        let [left, center, right, _] = compute_layout(Rect::new(0, 0, 60, 20));
        assert_eq!(left.width, 0);
        assert_eq!(right.width, 0);
        assert!(center.width > 0);
    }
}
