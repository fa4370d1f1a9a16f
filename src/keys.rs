use std::fmt;

use crate::error::{ExperimentError, Result};

/// A single admissible keypress, as delivered by a [`crate::input::KeySource`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Letter(char),
    Space,
    Quit,
}

impl Key {
    /// The key a participant has to press to type `c`.
    pub fn for_char(c: char) -> Self {
        if c == ' ' {
            Key::Space
        } else {
            Key::Letter(c)
        }
    }

    pub fn is_quit(&self) -> bool {
        matches!(self, Key::Quit)
    }
}

// Log labels: letters as themselves, "space" and "escape" for the markers.
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Letter(c) => write!(f, "{c}"),
            Key::Space => f.write_str("space"),
            Key::Quit => f.write_str("escape"),
        }
    }
}

/// The letters a participant can type. Space and quit are always admissible.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Alphabet {
    letters: Vec<char>,
}

impl Alphabet {
    pub fn new(letters: &str) -> Result<Self> {
        let mut seen = Vec::new();
        for c in letters.chars() {
            if !c.is_ascii_lowercase() {
                return Err(ExperimentError::invalid_config(format!(
                    "alphabet may only contain lowercase ascii letters, found {c:?}"
                )));
            }
            if seen.contains(&c) {
                return Err(ExperimentError::invalid_config(format!(
                    "alphabet contains {c:?} more than once"
                )));
            }
            seen.push(c);
        }
        if seen.is_empty() {
            return Err(ExperimentError::invalid_config("alphabet is empty"));
        }
        Ok(Self { letters: seen })
    }

    pub fn contains(&self, c: char) -> bool {
        self.letters.contains(&c)
    }

    pub fn len(&self) -> usize {
        self.letters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Maps a typed character onto an admissible key, if it is one.
    pub fn key_for(&self, c: char) -> Option<Key> {
        if c == ' ' {
            return Some(Key::Space);
        }
        let lower = c.to_ascii_lowercase();
        self.contains(lower).then_some(Key::Letter(lower))
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self {
            letters: ('a'..='z').collect(),
        }
    }
}
