//! Input rules shared by the aggregates.
//!
//! Rules apply to new commands only. Replaying history never re-validates,
//! so an event written under an older, looser rule still loads.

use thiserror::Error;

/// Why a piece of user-supplied text was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is {length} characters long (maximum {max})")]
    TooLong {
        field: &'static str,
        length: usize,
        max: usize,
    },

    #[error("{field} must not contain {character:?}")]
    ForbiddenCharacter {
        field: &'static str,
        character: char,
    },

    #[error("{field} must not contain control characters")]
    ControlCharacter { field: &'static str },
}

/// A length and character rule for one kind of text field.
#[derive(Debug, Clone, Copy)]
pub struct TextRule {
    field: &'static str,
    max_chars: usize,
    forbidden: &'static [char],
    allow_control: bool,
}

impl TextRule {
    /// A rule accepting 1..=`max_chars` characters with no control characters.
    pub const fn new(field: &'static str, max_chars: usize) -> Self {
        Self {
            field,
            max_chars,
            forbidden: &[],
            allow_control: false,
        }
    }

    /// Additionally rejects any of `chars`.
    pub const fn forbidding(mut self, chars: &'static [char]) -> Self {
        self.forbidden = chars;
        self
    }

    /// Allows line breaks and other control characters.
    pub const fn multiline(mut self) -> Self {
        self.allow_control = true;
        self
    }

    /// Maximum length in characters.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Trims `raw` and checks it, returning the value to store.
    pub fn check(&self, raw: &str) -> Result<String, TextError> {
        let value = raw.trim();
        if value.is_empty() {
            return Err(TextError::Empty { field: self.field });
        }

        let length = value.chars().count();
        if length > self.max_chars {
            return Err(TextError::TooLong {
                field: self.field,
                length,
                max: self.max_chars,
            });
        }

        if let Some(character) = value.chars().find(|c| self.forbidden.contains(c)) {
            return Err(TextError::ForbiddenCharacter {
                field: self.field,
                character,
            });
        }

        if !self.allow_control && value.chars().any(char::is_control) {
            return Err(TextError::ControlCharacter { field: self.field });
        }

        Ok(value.to_string())
    }
}

pub const CATEGORY_NAME: TextRule = TextRule::new("category name", 100).forbidding(&['/', '\\']);

/// Note titles double as file names in the UI.
pub const NOTE_TITLE: TextRule = TextRule::new("note title", 255)
    .forbidding(&['/', '\\', ':', '*', '?', '"', '<', '>', '|']);

pub const TAG_NAME: TextRule = TextRule::new("tag name", 50);

pub const TODO_TEXT: TextRule = TextRule::new("todo text", 500).multiline();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_before_checking() {
        assert_eq!(CATEGORY_NAME.check("  Work  ").unwrap(), "Work");
        assert_eq!(
            CATEGORY_NAME.check("   "),
            Err(TextError::Empty {
                field: "category name"
            })
        );
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let name = "é".repeat(50);
        assert!(TAG_NAME.check(&name).is_ok());
        assert!(matches!(
            TAG_NAME.check(&format!("{name}x")),
            Err(TextError::TooLong { length: 51, max: 50, .. })
        ));
    }

    #[test]
    fn note_titles_reject_path_characters() {
        assert!(NOTE_TITLE.check("todo.txt").is_ok());
        assert!(matches!(
            NOTE_TITLE.check("a/b.txt"),
            Err(TextError::ForbiddenCharacter { character: '/', .. })
        ));
        assert!(NOTE_TITLE.check("what?").is_err());
    }

    #[test]
    fn only_todo_text_allows_line_breaks() {
        assert!(TODO_TEXT.check("milk\neggs").is_ok());
        assert!(matches!(
            TAG_NAME.check("a\tb"),
            Err(TextError::ControlCharacter { .. })
        ));
    }
}
