use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::widgets::text_input::TextInput;

/// Editor for the raw WHERE predicate shown above the table
#[derive(Debug, Clone, Default)]
pub struct WhereInput {
    input: TextInput,
    pub is_active: bool,
}

impl WhereInput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start editing, seeded with the predicate currently in effect
    pub fn activate(&mut self, current: &str) {
        self.is_active = true;
        self.input.set_text(current);
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.input.clear();
    }

    pub fn add_char(&mut self, ch: char) {
        self.input.add_char(ch);
    }

    pub fn delete_char(&mut self) {
        self.input.delete_char();
    }

    pub const fn move_cursor_left(&mut self) {
        self.input.move_cursor_left();
    }

    pub fn move_cursor_right(&mut self) {
        self.input.move_cursor_right();
    }

    pub const fn move_cursor_to_start(&mut self) {
        self.input.move_cursor_to_start();
    }

    pub fn move_cursor_to_end(&mut self) {
        self.input.move_cursor_to_end();
    }

    pub fn clear(&mut self) {
        self.input.clear();
    }

    #[must_use]
    pub fn text(&self) -> &str {
        self.input.text()
    }
}

impl Widget for &WhereInput {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        if !self.is_active {
            return;
        }

        let block = Block::new()
            .borders(Borders::ALL)
            .title(" WHERE (Enter to run, Esc to cancel) ")
            .title_alignment(Alignment::Left);
        let inner_area = block.inner(area);
        block.render(area, buf);

        let (before, after) = self.input.split_at_cursor();
        let line = Line::from(vec![
            Span::raw(before),
            Span::styled("█", Style::default().fg(Color::White)),
            Span::raw(after),
        ]);

        Paragraph::new(line)
            .style(Style::default().fg(Color::White))
            .render(inner_area, buf);
    }
}
