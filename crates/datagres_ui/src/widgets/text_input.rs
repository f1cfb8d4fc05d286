/// A single-line text input with a cursor.
///
/// The cursor counts characters, not bytes, so multi-byte input edits
/// cleanly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    text: String,
    cursor_position: usize,
}

impl TextInput {
    /// Create a new empty `TextInput`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a `TextInput` with initial text and cursor at the end
    #[must_use]
    pub fn with_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor_position = text.chars().count();
        Self {
            text,
            cursor_position,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Cursor position in characters
    #[must_use]
    pub const fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Set the text and move cursor to the end
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor_position = self.text.chars().count();
    }

    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor_position)
            .map_or(self.text.len(), |(i, _)| i)
    }

    /// Text before and after the cursor
    #[must_use]
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.byte_index())
    }

    /// Insert a character at the cursor position
    pub fn add_char(&mut self, ch: char) {
        let index = self.byte_index();
        self.text.insert(index, ch);
        self.cursor_position += 1;
    }

    /// Delete the character before the cursor (backspace)
    pub fn delete_char(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.byte_index();
            self.text.remove(index);
        }
    }

    pub const fn move_cursor_left(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
        }
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.text.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub const fn move_cursor_to_start(&mut self) {
        self.cursor_position = 0;
    }

    pub fn move_cursor_to_end(&mut self) {
        self.cursor_position = self.text.chars().count();
    }

    /// Clear all text and reset cursor
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_position = 0;
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_char() {
        let mut input = TextInput::new();
        input.add_char('a');
        assert_eq!(input.text(), "a");
        assert_eq!(input.cursor_position(), 1);
    }

    #[test]
    fn test_delete_char() {
        let mut input = TextInput::with_text("hello");
        input.delete_char();
        assert_eq!(input.text(), "hell");
        assert_eq!(input.cursor_position(), 4);
    }

    #[test]
    fn test_cursor_movement() {
        let mut input = TextInput::with_text("hello");
        input.move_cursor_to_start();
        assert_eq!(input.cursor_position(), 0);
        input.move_cursor_right();
        assert_eq!(input.cursor_position(), 1);
        input.move_cursor_left();
        assert_eq!(input.cursor_position(), 0);
        input.move_cursor_left();
        assert_eq!(input.cursor_position(), 0);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut input = TextInput::with_text("name = 'Zoë'");
        input.move_cursor_left();
        input.delete_char();
        assert_eq!(input.text(), "name = 'Zo'");

        input.add_char('é');
        assert_eq!(input.split_at_cursor(), ("name = 'Zoé", "'"));
    }
}
