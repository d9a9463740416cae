//! Help overlay: a centred modal listing every keybinding.
//!
//! Drawn in the same `terminal.draw()` pass as the panels; `Clear` erases the
//! background first.

use ratatui::{
    Frame,
    layout::Constraint,
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::theme::Theme;

/// Renders the overlay, scrolled by `help_scroll` rows.
///
/// Skipped below 60 columns, where the centred rect would collapse.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }

    let overlay_area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help · j/k scroll, ? or Esc to dismiss ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Panels"),
        Line::from("  H / L         Focus previous / next panel"),
        Line::from("  Tab           Focus next panel"),
        Line::from(""),
        Line::from("Documents"),
        Line::from("  j / k         Move through the list"),
        Line::from("  Enter         Open the highlighted document"),
        Line::from("  n             New document"),
        Line::from("  D             Delete the active document"),
        Line::from(""),
        Line::from("Editor"),
        Line::from("  i             Type into the focused editor or copilot input"),
        Line::from("  Arrows        Move the caret (Shift extends the selection)"),
        Line::from("  Ctrl-a        Select all"),
        Line::from("  u / Ctrl-r    Undo / redo"),
        Line::from("  y             Quote the selection into the copilot"),
        Line::from(""),
        Line::from("Copilot"),
        Line::from("  a             AI Creation at the caret"),
        Line::from("  O             Draft an outline card"),
        Line::from("  c             Insert the latest outline card"),
        Line::from("  R             Humanize the whole document"),
        Line::from("  x             Stop the running generation"),
        Line::from("  Enter         Send (edits the selection when there is one)"),
        Line::from(""),
        Line::from("Writer"),
        Line::from("  p             Cycle persona: Freshman, Junior, Grad"),
        Line::from("  t             Cycle tone: Casual, Standard, Academic"),
        Line::from("  r             Recheck the AI rate"),
        Line::from(""),
        Line::from("General"),
        Line::from("  Esc           Back to normal mode"),
        Line::from("  ?             Open / close this help"),
        Line::from("  q             Quit (confirms while generation runs)"),
    ])
}
