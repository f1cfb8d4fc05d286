use datagres_db::{OrderBy, SortDirection};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::Text,
    widgets::{
        Cell, HighlightSpacing, Paragraph, Row, StatefulWidget, Table,
        TableState, Widget,
    },
};

use crate::{
    page_cache::{CacheStatus, PageCache},
    scroll_trigger::Bounds,
    widgets::{cell_text, column_widths},
};

/// Room for the selection bar drawn left of every row
const HIGHLIGHT_WIDTH: u16 = 3;
/// Space a column takes beyond its widest cell: the sort marker and a gap
const COLUMN_PADDING: u16 = 3;

/// Selection, scrolling and measured column widths for a [`PagedTable`]
#[derive(Clone, Debug, Default)]
pub struct PagedTableState {
    pub state: TableState,
    pub column_offset: usize,
    visible_rows: usize,
    widths: Vec<u16>,
    measured_rows: usize,
    measured_generation: Option<u64>,
}

impl PagedTableState {
    #[must_use]
    pub fn selected_row(&self) -> Option<usize> {
        self.state.selected()
    }

    #[must_use]
    pub fn selected_column(&self) -> Option<usize> {
        self.state.selected_column()
    }

    /// Rows that fit under the header at the last render
    #[must_use]
    pub const fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    /// Row range shown at the last render
    #[must_use]
    pub fn viewport(&self) -> Bounds {
        let top = self.state.offset() as i64;
        Bounds::new(top, top + self.visible_rows as i64)
    }

    #[must_use]
    pub fn widths(&self) -> &[u16] {
        &self.widths
    }

    /// Measure rows that arrived since the last call. Everything is
    /// remeasured when the cache was reset or refetched.
    pub fn measure(&mut self, cache: &PageCache) {
        let rows = cache.all_rows();
        if self.measured_generation != Some(cache.generation())
            || rows.len() < self.measured_rows
            || self.widths.len() != cache.columns().len()
        {
            self.widths = column_widths(cache.columns(), &[]);
            self.measured_rows = 0;
            self.measured_generation = Some(cache.generation());
        }

        let fresh = column_widths(cache.columns(), &rows[self.measured_rows..]);
        for (width, new) in self.widths.iter_mut().zip(fresh) {
            *width = (*width).max(new);
        }
        self.measured_rows = rows.len();
    }

    /// Scroll horizontally so the selected column is on screen
    pub fn adjust_offset_for_selected_column(&mut self, area_width: u16) {
        let Some(selected) = self.state.selected_column() else {
            return;
        };
        if selected < self.column_offset {
            self.column_offset = selected;
        } else if !visible_columns(&self.widths, self.column_offset, area_width)
            .contains(&selected)
        {
            self.column_offset = selected;
        }
    }
}

/// The last loaded row, used as the load-more sentinel
#[must_use]
pub fn sentinel(row_count: usize) -> Option<Bounds> {
    let last = row_count.checked_sub(1)? as i64;
    Some(Bounds::new(last, last + 1))
}

/// Columns from `offset` that fit into `area_width`, at least one
fn visible_columns(widths: &[u16], offset: usize, area_width: u16) -> Vec<usize> {
    let mut visible = Vec::new();
    let mut used = 0u16;
    for (idx, &len) in widths.iter().enumerate().skip(offset) {
        let width = len.saturating_add(COLUMN_PADDING);
        if used.saturating_add(width) > area_width {
            break;
        }
        used += width;
        visible.push(idx);
    }
    if visible.is_empty() && !widths.is_empty() {
        visible.push(offset.min(widths.len() - 1));
    }
    visible
}

fn sort_marker(order_by: &[OrderBy], column: &str) -> &'static str {
    match order_by.iter().find(|o| o.column == column) {
        Some(o) if o.direction == SortDirection::Asc => " ▲",
        Some(_) => " ▼",
        None => "",
    }
}

/// Every loaded row of a [`PageCache`], plus a trailing line while the next
/// page is on its way or after it failed
pub struct PagedTable<'a> {
    pub cache: &'a PageCache,
}

impl StatefulWidget for PagedTable<'_> {
    type State = PagedTableState;

    fn render(
        self,
        area: Rect,
        buf: &mut ratatui::buffer::Buffer,
        state: &mut Self::State,
    ) {
        let trailer = match (self.cache.status(), self.cache.error()) {
            (CacheStatus::LoadingMore, _) => Some(
                Paragraph::new("loading more…")
                    .style(Style::default().fg(Color::DarkGray)),
            ),
            (CacheStatus::Errored, Some(failure)) => Some(
                Paragraph::new(format!(
                    "failed to load more rows: {} (r to retry)",
                    failure.error
                ))
                .style(Style::default().fg(Color::Red)),
            ),
            _ => None,
        };
        let (table_area, trailer_area) = if trailer.is_some() {
            let [table_area, trailer_area] =
                Layout::vertical([Constraint::Fill(1), Constraint::Length(1)])
                    .areas(area);
            (table_area, Some(trailer_area))
        } else {
            (area, None)
        };
        if let (Some(trailer), Some(trailer_area)) = (trailer, trailer_area) {
            trailer.render(trailer_area, buf);
        }

        state.visible_rows = usize::from(table_area.height.saturating_sub(1));
        state.measure(self.cache);
        if state.widths.is_empty() {
            return;
        }
        let columns_width = table_area.width.saturating_sub(HIGHLIGHT_WIDTH);
        state.adjust_offset_for_selected_column(columns_width);

        let columns = self.cache.columns();
        let order_by = self.cache.order_by();
        let visible =
            visible_columns(&state.widths, state.column_offset, columns_width);

        let header = visible
            .iter()
            .map(|&idx| {
                let name = &columns[idx];
                Cell::from(format!("{name}{}", sort_marker(order_by, name)))
            })
            .collect::<Row>()
            .style(Style::default().add_modifier(Modifier::BOLD))
            .height(1);

        let rows = self.cache.all_rows().iter().map(|row| {
            visible
                .iter()
                .map(|&idx| {
                    Cell::from(row.get(idx).map(cell_text).unwrap_or_default())
                })
                .collect::<Row>()
                .height(1)
        });

        let constraints = visible
            .iter()
            .map(|&idx| {
                Constraint::Length(
                    state.widths[idx].saturating_add(COLUMN_PADDING - 1),
                )
            })
            .collect::<Vec<_>>();

        let original_col = state.state.selected_column();
        let relative_col = original_col
            .and_then(|col| visible.iter().position(|&idx| idx == col));
        state.state.select_column(relative_col);

        let table = Table::new(rows, constraints)
            .header(header)
            .row_highlight_style(
                Style::default()
                    .add_modifier(Modifier::REVERSED | Modifier::BOLD)
                    .fg(Color::Black)
                    .bg(Color::Yellow),
            )
            .column_highlight_style(Style::default().fg(Color::Cyan))
            .cell_highlight_style(
                Style::default()
                    .add_modifier(Modifier::REVERSED)
                    .fg(Color::Magenta),
            )
            .highlight_symbol(Text::from(" █ "))
            .highlight_spacing(HighlightSpacing::Always);

        StatefulWidget::render(table, table_area, buf, &mut state.state);
        state.state.select_column(original_col);
    }
}

#[cfg(test)]
mod tests {
    use datagres_db::TableDataPage;
    use ratatui::buffer::Buffer;
    use serde_json::json;

    use super::*;
    use crate::page_cache::CacheKey;

    fn loaded_cache() -> PageCache {
        let mut cache = PageCache::new(CacheKey::new("local", "users"), 2);
        let ticket = cache.set_order_by(vec![OrderBy::desc("id")]).unwrap();
        cache.complete(
            &ticket,
            Ok(TableDataPage {
                columns: vec!["id".into(), "name".into()],
                rows: vec![vec![json!(4), json!("Alice")], vec![json!(3), json!("Bob")]],
                total_rows: 4,
                page: 1,
                page_size: 2,
            }),
        );
        cache
    }

    fn line(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn test_sentinel_is_last_row() {
        assert_eq!(sentinel(0), None);
        assert_eq!(sentinel(4), Some(Bounds::new(3, 4)));
    }

    #[test]
    fn test_visible_columns_fit_width() {
        assert_eq!(visible_columns(&[4, 4, 4], 0, 14), vec![0, 1]);
        assert_eq!(visible_columns(&[4, 4, 4], 2, 10), vec![2]);
        assert_eq!(visible_columns(&[40], 0, 10), vec![0]);
        assert!(visible_columns(&[], 0, 10).is_empty());
    }

    #[test]
    fn test_measure_is_incremental_and_resets() {
        let mut cache = loaded_cache();
        let mut state = PagedTableState::default();
        state.measure(&cache);
        assert_eq!(state.widths(), [2, 5]);

        let ticket = cache.fetch_next_page().unwrap();
        cache.complete(
            &ticket,
            Ok(TableDataPage {
                columns: vec!["id".into(), "name".into()],
                rows: vec![vec![json!(2), json!("Jane")], vec![json!(1), json!("Johnathan")]],
                total_rows: 4,
                page: 2,
                page_size: 2,
            }),
        );
        state.measure(&cache);
        assert_eq!(state.widths(), [2, 9]);

        cache.set_order_by(Vec::new());
        state.measure(&cache);
        assert!(state.widths().is_empty());
    }

    #[test]
    fn test_render_shows_header_rows_and_loading_line() {
        let mut cache = loaded_cache();
        cache.fetch_next_page();

        let area = Rect::new(0, 0, 30, 5);
        let mut buf = Buffer::empty(area);
        let mut state = PagedTableState::default();
        state.state.select(Some(0));
        PagedTable { cache: &cache }.render(area, &mut buf, &mut state);

        assert!(line(&buf, 0).contains("id ▼"));
        assert!(line(&buf, 1).contains("Alice"));
        assert!(line(&buf, 2).contains("Bob"));
        assert!(line(&buf, 4).contains("loading more"));
        assert_eq!(state.visible_rows(), 3);
        assert_eq!(state.viewport(), Bounds::new(0, 3));
    }
}
