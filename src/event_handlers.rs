use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use datagres_ui::TableNavigationHandler;

use crate::app::App;

impl App<'_> {
    /// Reads one crossterm event and updates the state of [`App`].
    pub fn handle_crossterm_events(&mut self) -> Result<()> {
        // resizes are picked up by the next draw
        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            self.on_key_event(key);
        }

        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    pub fn on_key_event(&mut self, key: KeyEvent) {
        if self.where_input.is_active {
            self.on_where_input_key(key);
            return;
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c' | 'C')) => self.quit(),
            (_, KeyCode::Char('/')) => {
                let current = self.fetcher.cache().search_term().to_string();
                self.where_input.activate(&current);
            }
            (_, KeyCode::Char('s')) => self.cycle_sort(),
            (_, KeyCode::Char('r')) => self.refresh(),
            (_, KeyCode::Enter) => self.describe_selected_row(),
            (_, code) => {
                let cache = self.fetcher.cache();
                TableNavigationHandler::handle(
                    &mut self.table_state,
                    code,
                    cache.all_rows().len(),
                    cache.columns().len(),
                );
            }
        }
    }

    /// Keys while the WHERE editor is open. Typing only edits the pending
    /// predicate; Enter commits it and fetches.
    fn on_where_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                let active = self.fetcher.cache().search_term().to_string();
                self.fetcher.set_search_term(active);
                self.where_input.deactivate();
                return;
            }
            KeyCode::Enter => {
                self.where_input.deactivate();
                if self.fetcher.handle_search_commit() {
                    self.table_state.state.select(Some(0));
                    self.status_line.clear();
                }
                return;
            }
            KeyCode::Char(ch) if !ch.is_control() => self.where_input.add_char(ch),
            KeyCode::Backspace => self.where_input.delete_char(),
            KeyCode::Left => self.where_input.move_cursor_left(),
            KeyCode::Right => self.where_input.move_cursor_right(),
            KeyCode::Home => self.where_input.move_cursor_to_start(),
            KeyCode::End => self.where_input.move_cursor_to_end(),
            _ => return,
        }
        let text = self.where_input.text().to_string();
        self.fetcher.set_search_term(text);
    }
}
