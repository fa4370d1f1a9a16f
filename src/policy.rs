use rand::Rng;
use strum_macros::Display;

use crate::error::{ExperimentError, Result};

/// Ground truth of a keypress against the expected key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect,
}

impl Outcome {
    pub fn of(is_correct: bool) -> Self {
        if is_correct {
            Outcome::Correct
        } else {
            Outcome::Incorrect
        }
    }
}

/// What the participant is told about a keypress.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Feedback {
    Positive,
    Negative,
}

/// Whether the feedback told the truth, and if not, which way it lied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum Condition {
    #[strum(serialize = "control")]
    Control,
    #[strum(serialize = "error inserted")]
    ErrorInserted,
    #[strum(serialize = "error rectified")]
    ErrorRectified,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
    pub feedback: Feedback,
    pub condition: Condition,
}

impl Decision {
    /// The cursor moves on exactly when the participant is told they were right.
    pub fn advances(&self) -> bool {
        self.feedback == Feedback::Positive
    }
}

/// Probabilities of sham feedback, fixed for a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeceptionPolicy {
    false_error: f64,
    rectify: f64,
}

impl DeceptionPolicy {
    pub fn new(false_error: f64, rectify: f64) -> Result<Self> {
        check_probability("false error", false_error)?;
        check_probability("rectify", rectify)?;
        Ok(Self {
            false_error,
            rectify,
        })
    }

    /// Truthful feedback on every keypress.
    pub fn honest() -> Self {
        Self {
            false_error: 0.0,
            rectify: 0.0,
        }
    }

    pub fn false_error(&self) -> f64 {
        self.false_error
    }

    pub fn rectify(&self) -> f64 {
        self.rectify
    }

    /// Decides feedback for a keypress given one uniform draw in `[0, 1)`.
    pub fn decide(&self, outcome: Outcome, draw: f64) -> Decision {
        match outcome {
            Outcome::Correct if draw < self.false_error => Decision {
                feedback: Feedback::Negative,
                condition: Condition::ErrorInserted,
            },
            Outcome::Correct => Decision {
                feedback: Feedback::Positive,
                condition: Condition::Control,
            },
            Outcome::Incorrect if draw < self.rectify => Decision {
                feedback: Feedback::Positive,
                condition: Condition::ErrorRectified,
            },
            Outcome::Incorrect => Decision {
                feedback: Feedback::Negative,
                condition: Condition::Control,
            },
        }
    }

    /// Draws once from `rng` and decides.
    pub fn apply<R: Rng + ?Sized>(&self, outcome: Outcome, rng: &mut R) -> Decision {
        let draw: f64 = rng.gen();
        self.decide(outcome, draw)
    }
}

fn check_probability(name: &str, p: f64) -> Result<()> {
    if (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(ExperimentError::invalid_config(format!(
            "{name} probability must lie in [0, 1], got {p}"
        )))
    }
}
