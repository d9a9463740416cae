//! Document list panel.
//!
//! Newest documents first, in store order. The active document is bold; the
//! list cursor (which may differ until Enter is pressed) is highlighted.

use chrono::{DateTime, Local};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use quill_core::Document;

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_doc_list(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let is_focused = state.focus == PanelFocus::Documents;
    let block = panel_block(format!("Documents ({})", state.store.len()), is_focused, theme);

    let active = state.store.active_id();
    let items: Vec<ListItem> = state
        .store
        .documents()
        .map(|doc| {
            document_item(doc, doc.id == *active, state.store.is_streaming(&doc.id), theme)
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(theme.selection_bg))
        .highlight_symbol("› ");

    frame.render_stateful_widget(list, area, &mut state.doc_list_state);
}

fn document_item(doc: &Document, active: bool, streaming: bool, theme: &Theme) -> ListItem<'static> {
    let mut title_style = Style::default().fg(theme.text);
    if active {
        title_style = title_style.add_modifier(Modifier::BOLD);
    }
    let mut title = vec![Span::styled(doc.title.clone(), title_style)];
    if streaming {
        title.push(Span::styled(" ●", Style::default().fg(theme.status_streaming)));
    }
    let meta = Line::from(Span::styled(
        format!("  {}", updated_label(doc.updated_at)),
        Style::default().fg(theme.muted),
    ));
    ListItem::new(vec![Line::from(title), meta])
}

/// Local "HH:MM" when edited today, otherwise "Mon DD".
fn updated_label(updated_at: i64) -> String {
    let Some(utc) = DateTime::from_timestamp(updated_at, 0) else {
        return String::new();
    };
    let local = utc.with_timezone(&Local);
    if local.date_naive() == Local::now().date_naive() {
        local.format("%H:%M").to_string()
    } else {
        local.format("%b %d").to_string()
    }
}
