use crate::error::Result;
use crate::policy::Feedback;
use crate::text::TargetText;

/// Full-screen messages shown around the blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Instructions; `ready` once the participant may press space.
    Landing { ready: bool },
    Intermission,
    Credits,
}

/// Display side of the experiment. Implementations only render; every
/// decision is made by the engine.
pub trait Presenter {
    /// Shows `text` with the first `cursor` characters marked as accepted.
    fn stimulus(&mut self, text: &TargetText, cursor: usize) -> Result<()>;

    fn feedback(&mut self, feedback: Feedback) -> Result<()>;

    fn screen(&mut self, screen: Screen) -> Result<()>;
}

impl<P: Presenter + ?Sized> Presenter for Box<P> {
    fn stimulus(&mut self, text: &TargetText, cursor: usize) -> Result<()> {
        (**self).stimulus(text, cursor)
    }

    fn feedback(&mut self, feedback: Feedback) -> Result<()> {
        (**self).feedback(feedback)
    }

    fn screen(&mut self, screen: Screen) -> Result<()> {
        (**self).screen(screen)
    }
}

/// Headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
    fn stimulus(&mut self, _text: &TargetText, _cursor: usize) -> Result<()> {
        Ok(())
    }

    fn feedback(&mut self, _feedback: Feedback) -> Result<()> {
        Ok(())
    }

    fn screen(&mut self, _screen: Screen) -> Result<()> {
        Ok(())
    }
}

/// Display line for a text: spaces are shown as underscores.
pub fn display_chars(text: &TargetText) -> String {
    text.chars()
        .iter()
        .map(|&c| if c == ' ' { '_' } else { c })
        .collect()
}
