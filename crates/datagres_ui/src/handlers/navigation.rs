use crossterm::event::KeyCode;

use crate::widgets::table::PagedTableState;

/// Helper for table navigation operations
pub struct TableNavigationHandler;

impl TableNavigationHandler {
    /// Clamps the row selection to the loaded rows
    pub fn clamp_selection(table: &mut PagedTableState, row_count: usize) {
        match table.state.selected() {
            _ if row_count == 0 => table.state.select(None),
            Some(selected) if selected >= row_count => {
                table.state.select(Some(row_count - 1));
            }
            None => table.state.select(Some(0)),
            Some(_) => {}
        }
    }

    /// Clamps the column selection and offset to the available columns
    pub fn clamp_columns(table: &mut PagedTableState, column_count: usize) {
        if let Some(selected_col) = table.state.selected_column()
            && selected_col >= column_count
        {
            table
                .state
                .select_column(column_count.checked_sub(1));
        }

        if table.column_offset >= column_count {
            table.column_offset = column_count.saturating_sub(1);
        }
    }

    /// Move the selection for `key`. Returns `true` if the key was a
    /// navigation key.
    pub fn handle(
        table: &mut PagedTableState,
        key: KeyCode,
        row_count: usize,
        column_count: usize,
    ) -> bool {
        let page = table.visible_rows().max(1);
        let selected = table.state.selected().unwrap_or(0);

        match key {
            KeyCode::Char('j') | KeyCode::Down => {
                table.state.select(Some(selected.saturating_add(1)));
            }
            KeyCode::Char('k') | KeyCode::Up => {
                table.state.select(Some(selected.saturating_sub(1)));
            }
            KeyCode::PageDown => {
                table.state.select(Some(selected.saturating_add(page)));
            }
            KeyCode::PageUp => {
                table.state.select(Some(selected.saturating_sub(page)));
            }
            KeyCode::Char('g') | KeyCode::Home => {
                table.state.select(Some(0));
                table.column_offset = 0;
            }
            KeyCode::Char('G') | KeyCode::End => {
                table.state.select(row_count.checked_sub(1));
            }
            KeyCode::Char('h') | KeyCode::Left => {
                // start from the last column when nothing is selected
                match table.state.selected_column() {
                    None => table
                        .state
                        .select_column(column_count.checked_sub(1)),
                    Some(col) => {
                        table.state.select_column(Some(col.saturating_sub(1)));
                    }
                }
            }
            KeyCode::Char('l') | KeyCode::Right => {
                match table.state.selected_column() {
                    None => table.state.select_column(Some(0)),
                    Some(col) => {
                        table.state.select_column(Some(col.saturating_add(1)));
                    }
                }
            }
            _ => return false,
        }

        Self::clamp_selection(table, row_count);
        Self::clamp_columns(table, column_count);
        true
    }
}
