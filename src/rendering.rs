use datagres_ui::{
    CacheStatus,
    widgets::{table::PagedTable, top_bar::TopBarView},
};
use ratatui::{
    Frame,
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{APP_NAME, App};

const TOPBAR_HEIGHT: u16 = 2;
const WHERE_INPUT_HEIGHT: u16 = 3;

impl App<'_> {
    /// Renders the user interface.
    pub fn render(&mut self, frame: &mut Frame) {
        let where_height = if self.where_input.is_active {
            WHERE_INPUT_HEIGHT
        } else {
            0
        };
        let [top_bar, where_area, main_area, status_area] = Layout::vertical([
            Constraint::Length(TOPBAR_HEIGHT),
            Constraint::Length(where_height),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .areas(frame.area());

        frame.render_widget(
            TopBarView {
                connection: &self.connection_name,
                cache: self.fetcher.cache(),
                hotkeys: &self.hotkeys,
                app_name: APP_NAME,
            },
            top_bar,
        );
        frame.render_widget(&self.where_input, where_area);

        let block = Block::new()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.cache_key().table))
            .title_alignment(Alignment::Center);
        let inner_area = block.inner(main_area);
        frame.render_widget(block, main_area);

        let cache = self.fetcher.cache();
        match cache.status() {
            CacheStatus::Errored if cache.is_error() => {
                let message = cache
                    .error()
                    .map(|failure| failure.error.to_string())
                    .unwrap_or_default();
                frame.render_widget(
                    Paragraph::new(vec![
                        Line::from(message).style(Style::default().fg(Color::Red)),
                        Line::from(""),
                        Line::from("Press r to retry or / to edit the WHERE clause"),
                    ])
                    .wrap(Wrap { trim: true }),
                    inner_area,
                );
            }
            CacheStatus::Empty | CacheStatus::Loading => {
                frame.render_widget(
                    Paragraph::new("Loading…").alignment(Alignment::Center),
                    inner_area,
                );
            }
            CacheStatus::Loaded | CacheStatus::Errored
                if cache.all_rows().is_empty() =>
            {
                frame.render_widget(
                    Paragraph::new("No rows match").alignment(Alignment::Center),
                    inner_area,
                );
            }
            CacheStatus::Loaded
            | CacheStatus::Errored
            | CacheStatus::LoadingMore
            | CacheStatus::Refreshing => {
                frame.render_stateful_widget(
                    PagedTable { cache },
                    inner_area,
                    &mut self.table_state,
                );
            }
        }

        frame.render_widget(&self.status_line, status_area);
    }
}
