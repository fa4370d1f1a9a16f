use crate::error::{ExperimentError, Result};
use crate::keys::{Alphabet, Key};

/// The normalized text of one block: lowercase letters from the alphabet and spaces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetText {
    chars: Vec<char>,
}

impl TargetText {
    /// Lowercases `raw` and drops every character that is neither in the
    /// alphabet nor a space.
    pub fn normalize(raw: &str, alphabet: &Alphabet) -> Self {
        let chars = raw
            .chars()
            .flat_map(char::to_lowercase)
            .filter(|&c| c == ' ' || alphabet.contains(c))
            .collect();
        Self { chars }
    }

    /// Normalizes a story, rejecting it when the source exceeds `max_len` characters.
    pub fn from_story(index: usize, raw: &str, alphabet: &Alphabet, max_len: usize) -> Result<Self> {
        let length = raw.chars().count();
        if length > max_len {
            return Err(ExperimentError::TextTooLong {
                index,
                length,
                max: max_len,
            });
        }
        Ok(Self::normalize(raw, alphabet))
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Expected key at `position`, `None` once the text is complete.
    pub fn target_response(&self, position: usize) -> Option<Key> {
        self.chars.get(position).copied().map(Key::for_char)
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn as_string(&self) -> String {
        self.chars.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn normalize_lowercases_and_filters() {
        let text = TargetText::normalize("The Fox, 2 dogs!", &Alphabet::default());
        assert_eq!(text.as_string(), "the fox  dogs");
    }

    #[test]
    fn normalize_respects_custom_alphabet() {
        let alphabet = Alphabet::new("ab").unwrap();
        let text = TargetText::normalize("a cab", &alphabet);
        assert_eq!(text.as_string(), "a ab");
    }

    #[test]
    fn target_response_uses_space_marker() {
        let text = TargetText::normalize("a b", &Alphabet::default());
        assert_eq!(text.target_response(0), Some(Key::Letter('a')));
        assert_eq!(text.target_response(1), Some(Key::Space));
        assert_eq!(text.target_response(2), Some(Key::Letter('b')));
        assert_eq!(text.target_response(3), None);
    }

    #[test]
    fn from_story_rejects_long_sources() {
        let alphabet = Alphabet::default();
        assert!(TargetText::from_story(1, "abcde", &alphabet, 5).is_ok());
        assert_matches!(
            TargetText::from_story(2, "abcdef", &alphabet, 5),
            Err(ExperimentError::TextTooLong {
                index: 2,
                length: 6,
                max: 5
            })
        );
    }

    #[test]
    fn empty_text() {
        let text = TargetText::normalize("123", &Alphabet::default());
        assert!(text.is_empty());
        assert_eq!(text.target_response(0), None);
    }
}
