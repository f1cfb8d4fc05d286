use crossterm::event::KeyCode;
use ratatui::{
    prelude::{Buffer, Rect, Widget},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hotkey<'a> {
    pub keycode: KeyCode,
    pub description: &'a str,
}

pub const TABLE_HOTKEYS: [Hotkey; 4] = [
    Hotkey {
        keycode: KeyCode::Char('/'),
        description: "Where",
    },
    Hotkey {
        keycode: KeyCode::Char('s'),
        description: "Sort",
    },
    Hotkey {
        keycode: KeyCode::Char('r'),
        description: "Refresh",
    },
    Hotkey {
        keycode: KeyCode::Char('q'),
        description: "Quit",
    },
];

pub struct HotkeyView<'a> {
    pub hotkeys: &'a [Hotkey<'a>],
}

impl Widget for HotkeyView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let key_style = Style::default().fg(Color::Cyan);
        let spans = self
            .hotkeys
            .iter()
            .flat_map(|hotkey| {
                [
                    Span::styled(format!("<{}>", hotkey.keycode), key_style),
                    Span::raw(format!(" {}  ", hotkey.description)),
                ]
            })
            .collect::<Vec<_>>();

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
