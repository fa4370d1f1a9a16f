use std::collections::VecDeque;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::error::{ExperimentError, Result};
use crate::keys::{Alphabet, Key};

/// Blocking source of admissible keypresses.
pub trait KeySource {
    /// Waits for the next admissible key. Anything outside the alphabet,
    /// space and quit never comes out of here.
    fn next_key(&mut self) -> Result<Key>;
}

impl<K: KeySource + ?Sized> KeySource for Box<K> {
    fn next_key(&mut self) -> Result<Key> {
        (**self).next_key()
    }
}

/// Keyboard input from the terminal.
pub struct CrosstermKeys {
    alphabet: Alphabet,
}

impl CrosstermKeys {
    pub fn new(alphabet: Alphabet) -> Self {
        Self { alphabet }
    }

    /// Maps a terminal key event onto an admissible key.
    pub fn admit(&self, key: &KeyEvent) -> Option<Key> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Esc => Some(Key::Quit),
            // ctrl+c to quit
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::Quit),
            KeyCode::Char(_) if key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
                None
            }
            KeyCode::Char(c) => self.alphabet.key_for(c),
            _ => None,
        }
    }
}

impl KeySource for CrosstermKeys {
    fn next_key(&mut self) -> Result<Key> {
        loop {
            let event = event::read().map_err(|e| ExperimentError::io("reading the keyboard", e))?;
            if let Event::Key(key) = event {
                if let Some(admitted) = self.admit(&key) {
                    return Ok(admitted);
                }
            }
        }
    }
}

/// Pre-recorded keypresses, for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    keys: VecDeque<Key>,
}

impl ScriptedKeys {
    pub fn new<I: IntoIterator<Item = Key>>(keys: I) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    /// Letters and spaces of `typed`, in order.
    pub fn typing(typed: &str) -> Self {
        Self::new(typed.chars().map(Key::for_char))
    }

    pub fn then(mut self, key: Key) -> Self {
        self.keys.push_back(key);
        self
    }

    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl KeySource for ScriptedKeys {
    fn next_key(&mut self) -> Result<Key> {
        self.keys.pop_front().ok_or(ExperimentError::InputClosed)
    }
}

/// Blocks until space (start, `true`) or quit (`false`); letters are ignored.
pub fn wait_for_start<K: KeySource + ?Sized>(keys: &mut K) -> Result<bool> {
    loop {
        match keys.next_key()? {
            Key::Space => return Ok(true),
            Key::Quit => return Ok(false),
            Key::Letter(_) => {}
        }
    }
}
