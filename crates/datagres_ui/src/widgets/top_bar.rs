use datagres_db::OrderBy;
use ratatui::{
    prelude::{Alignment, Buffer, Constraint, Layout, Rect, Widget},
    style::{Color, Style},
    widgets::Paragraph,
};

use super::hotkey::{Hotkey, HotkeyView};
use crate::page_cache::{CacheStatus, PageCache};

/// Two lines: where we are and what keys do, then the active query state
pub struct TopBarView<'a> {
    pub connection: &'a str,
    pub cache: &'a PageCache,
    pub hotkeys: &'a [Hotkey<'a>],
    pub app_name: &'a str,
}

/// `ORDER BY` summary as shown in the bar
#[must_use]
pub fn describe_order(order_by: &[OrderBy]) -> String {
    if order_by.is_empty() {
        return "unordered".to_string();
    }
    order_by
        .iter()
        .map(|o| format!("{} {}", o.column, o.direction))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Loaded and total row counts, or what is happening instead
#[must_use]
pub fn describe_progress(cache: &PageCache) -> String {
    let loaded = cache.all_rows().len();
    let total = cache.total_rows();
    match cache.status() {
        CacheStatus::Empty => "idle".to_string(),
        CacheStatus::Loading => "loading…".to_string(),
        CacheStatus::Refreshing => format!("{loaded}/{total} rows, refreshing…"),
        CacheStatus::LoadingMore => format!("{loaded}/{total} rows, loading more…"),
        CacheStatus::Errored if cache.is_error() => "error".to_string(),
        CacheStatus::Loaded | CacheStatus::Errored => {
            format!("{loaded}/{total} rows")
        }
    }
}

impl Widget for TopBarView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let [title_row, query_row] =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)])
                .areas(area);
        let [left, middle, right] = Layout::horizontal([
            Constraint::Percentage(30),
            Constraint::Percentage(50),
            Constraint::Percentage(20),
        ])
        .spacing(1)
        .areas(title_row);

        Paragraph::new(format!("{} › {}", self.connection, self.cache.key().table))
            .render(left, buf);
        HotkeyView {
            hotkeys: self.hotkeys,
        }
        .render(middle, buf);
        Paragraph::new(self.app_name.trim_start())
            .alignment(Alignment::Right)
            .render(right, buf);

        let [query, progress] = Layout::horizontal([
            Constraint::Fill(1),
            Constraint::Length(32),
        ])
        .areas(query_row);

        let search = self.cache.search_term();
        let predicate = if search.trim().is_empty() {
            "—".to_string()
        } else {
            search.to_string()
        };
        Paragraph::new(format!(
            "WHERE {predicate}   ORDER BY {}",
            describe_order(self.cache.order_by())
        ))
        .style(Style::default().fg(Color::DarkGray))
        .render(query, buf);
        Paragraph::new(describe_progress(self.cache))
            .alignment(Alignment::Right)
            .render(progress, buf);
    }
}
