use ratatui::{
    prelude::*,
    style::Style,
    widgets::{Paragraph, Widget},
};

/// A one-line message at the bottom of the screen
#[derive(Clone, Debug, Default)]
pub struct StatusLine {
    message: String,
    is_error: bool,
}

impl StatusLine {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            message: String::new(),
            is_error: false,
        }
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.is_error = false;
    }

    pub fn set_error(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.is_error = true;
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.is_error
    }

    pub fn clear(&mut self) {
        self.message.clear();
        self.is_error = false;
    }
}

impl Widget for &StatusLine {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let style = if self.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default()
        };

        Paragraph::new(self.message.as_str())
            .style(style)
            .wrap(ratatui::widgets::Wrap { trim: true })
            .render(area, buf);
    }
}
