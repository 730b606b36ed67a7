use crate::util::unicode;

/// Single-line edit buffer. `cursor` is a byte offset that always sits on
/// a grapheme boundary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub text: String,
    pub cursor: usize,
}

impl TextInput {
    /// Buffer holding `text` with the cursor at the end
    pub fn new(text: &str) -> Self {
        TextInput {
            text: text.to_string(),
            cursor: text.len(),
        }
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, s: &str) {
        let clean: String = s.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        self.text.insert_str(self.cursor, &clean);
        self.cursor += clean.len();
    }

    pub fn backspace(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(prev..self.cursor, "");
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.text, self.cursor) {
            self.text.replace_range(self.cursor..next, "");
        }
    }

    pub fn left(&mut self) {
        if let Some(prev) = unicode::prev_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = prev;
        }
    }

    pub fn right(&mut self) {
        if let Some(next) = unicode::next_grapheme_boundary(&self.text, self.cursor) {
            self.cursor = next;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.len();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Replace the whole buffer, cursor at the end
    pub fn set(&mut self, text: &str) {
        *self = TextInput::new(text);
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Terminal column of the cursor
    pub fn cursor_col(&self) -> usize {
        unicode::byte_offset_to_display_col(&self.text, self.cursor)
    }

    /// Text with the password mask applied
    pub fn masked(&self) -> String {
        "*".repeat(self.text.chars().count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edits_at_cursor() {
        let mut input = TextInput::new("2025-01");
        input.insert('-');
        input.insert_str("05");
        assert_eq!(input.text, "2025-01-05");
        input.home();
        input.delete();
        assert_eq!(input.text, "025-01-05");
        input.end();
        input.backspace();
        assert_eq!(input.text, "025-01-0");
    }

    #[test]
    fn test_cursor_steps_over_wide_chars() {
        let mut input = TextInput::new("修正");
        assert_eq!(input.cursor_col(), 4);
        input.left();
        assert_eq!(input.cursor, 3);
        assert_eq!(input.cursor_col(), 2);
        input.insert('a');
        assert_eq!(input.text, "修a正");
        input.backspace();
        input.backspace();
        assert_eq!(input.text, "正");
        assert_eq!(input.cursor, 0);
        input.backspace();
        assert_eq!(input.text, "正");
    }

    #[test]
    fn test_paste_drops_newlines_and_mask_hides_text() {
        let mut input = TextInput::default();
        input.insert_str("ab\ncd");
        assert_eq!(input.text, "abcd");
        assert_eq!(input.masked(), "****");
    }
}
