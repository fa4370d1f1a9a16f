use std::fs;
use std::path::Path;

use include_dir::{include_dir, Dir};
use serde::Deserialize;

use crate::error::{ExperimentError, Result};
use crate::keys::Alphabet;
use crate::text::TargetText;

static STORY_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/stories");

/// The paragraphs typed in one session, one block each.
#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct StorySet {
    pub name: String,
    pub stories: Vec<String>,
}

impl StorySet {
    /// The set compiled into the binary.
    pub fn builtin() -> Result<Self> {
        let file = STORY_DIR.get_file("default.json").ok_or_else(|| {
            ExperimentError::invalid_config("built-in story set is missing")
        })?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| ExperimentError::invalid_config("built-in story set is not utf-8"))?;
        serde_json::from_str(contents).map_err(|e| ExperimentError::json("parsing built-in stories", e))
    }

    /// Reads a `.json` story set, or plain text with blocks separated by blank lines.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|e| ExperimentError::io("reading the story file", e))?;

        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            return serde_json::from_str(&contents)
                .map_err(|e| ExperimentError::json("parsing the story file", e));
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "stories".to_string());
        Ok(Self::from_plain_text(name, &contents))
    }

    pub fn from_plain_text(name: impl Into<String>, contents: &str) -> Self {
        let mut stories = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() {
                if !current.is_empty() {
                    stories.push(current.join(" "));
                    current.clear();
                }
            } else {
                current.push(line);
            }
        }
        if !current.is_empty() {
            stories.push(current.join(" "));
        }
        Self {
            name: name.into(),
            stories,
        }
    }

    /// Normalizes every story, failing on the first one over `max_len`.
    pub fn prepare(&self, alphabet: &Alphabet, max_len: usize) -> Result<Vec<TargetText>> {
        self.stories
            .iter()
            .enumerate()
            .map(|(i, story)| TargetText::from_story(i + 1, story, alphabet, max_len))
            .collect()
    }
}
