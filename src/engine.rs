use std::time::{Duration, Instant};

use chrono::Local;
use rand::Rng;
use tracing::debug;

use crate::error::Result;
use crate::input::KeySource;
use crate::keys::Key;
use crate::markers::{MarkerCode, MarkerSink, NoopMarkers};
use crate::policy::{DeceptionPolicy, Decision, Outcome};
use crate::present::{NullPresenter, Presenter};
use crate::record::TrialRecord;
use crate::text::TargetText;

/// Typing progress through one block.
#[derive(Debug, Clone)]
pub struct Block {
    pub number: u32,
    text: TargetText,
    cursor: usize,
    trial: u32,
    records: Vec<TrialRecord>,
}

impl Block {
    pub fn new(number: u32, text: TargetText) -> Self {
        Self {
            number,
            text,
            cursor: 0,
            trial: 1,
            records: Vec::new(),
        }
    }

    pub fn text(&self) -> &TargetText {
        &self.text
    }

    /// Number of accepted characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Trial number the next keypress will get.
    pub fn next_trial(&self) -> u32 {
        self.trial
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.text.len()
    }

    pub fn target_response(&self) -> Option<Key> {
        self.text.target_response(self.cursor)
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<TrialRecord> {
        self.records
    }
}

/// Result of feeding one key to a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Recorded(Decision),
    Quit,
    /// The block was already finished; nothing happened.
    Ignored,
}

/// How a block ended.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockOutcome {
    Completed(Vec<TrialRecord>),
    /// The participant pressed quit; holds the records made before that.
    Quit(Vec<TrialRecord>),
}

impl BlockOutcome {
    pub fn records(&self) -> &[TrialRecord] {
        match self {
            BlockOutcome::Completed(records) | BlockOutcome::Quit(records) => records,
        }
    }
}

/// Walks a participant through blocks, one keypress at a time, deciding
/// whether to report each keypress truthfully.
pub struct TrialEngine<R, M = NoopMarkers, P = NullPresenter> {
    session: u32,
    policy: DeceptionPolicy,
    rng: R,
    markers: M,
    presenter: P,
}

impl<R: Rng> TrialEngine<R> {
    pub fn new(session: u32, policy: DeceptionPolicy, rng: R) -> Self {
        Self {
            session,
            policy,
            rng,
            markers: NoopMarkers,
            presenter: NullPresenter,
        }
    }
}

impl<R: Rng, M: MarkerSink, P: Presenter> TrialEngine<R, M, P> {
    pub fn with_markers<M2: MarkerSink>(self, markers: M2) -> TrialEngine<R, M2, P> {
        TrialEngine {
            session: self.session,
            policy: self.policy,
            rng: self.rng,
            markers,
            presenter: self.presenter,
        }
    }

    pub fn with_presenter<P2: Presenter>(self, presenter: P2) -> TrialEngine<R, M, P2> {
        TrialEngine {
            session: self.session,
            policy: self.policy,
            rng: self.rng,
            markers: self.markers,
            presenter,
        }
    }

    pub fn session(&self) -> u32 {
        self.session
    }

    pub fn policy(&self) -> &DeceptionPolicy {
        &self.policy
    }

    pub fn markers(&self) -> &M {
        &self.markers
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Shows the current state of `block` and marks the stimulus onset.
    ///
    /// The returned instant is taken as soon as the stimulus is drawn, so a
    /// marker pulse held afterwards counts towards the response time.
    pub fn present(&mut self, block: &Block) -> Result<Instant> {
        self.presenter.stimulus(&block.text, block.cursor)?;
        let shown_at = Instant::now();
        self.markers.send(MarkerCode::Reset)?;
        self.markers.send(MarkerCode::TrialShown)?;
        Ok(shown_at)
    }

    /// Applies one keypress to `block`.
    ///
    /// Quit leaves the block untouched. Any other key produces exactly one
    /// record, and the cursor moves by one iff the feedback shown was positive.
    pub fn press(&mut self, block: &mut Block, key: Key, response_time: Duration) -> Result<Step> {
        if key.is_quit() {
            return Ok(Step::Quit);
        }
        let Some(target_response) = block.target_response() else {
            return Ok(Step::Ignored);
        };
        self.markers.send(MarkerCode::Keypress)?;

        let outcome = Outcome::of(key == target_response);
        let decision = self.policy.apply(outcome, &mut self.rng);

        self.presenter.feedback(decision.feedback)?;
        self.markers.send(MarkerCode::for_decision(outcome, &decision))?;

        debug!(
            block = block.number,
            trial = block.trial,
            cursor = block.cursor,
            key = %key,
            expected = %target_response,
            ms = response_time.as_millis() as u64,
            feedback = %decision.feedback,
            condition = %decision.condition,
            "keypress"
        );

        block.records.push(TrialRecord {
            session: self.session,
            block: block.number,
            trial: block.trial,
            cursor_position: block.cursor,
            timestamp: Local::now(),
            response_time,
            target_response,
            response: key,
            feedback: decision.feedback,
            condition: decision.condition,
        });

        block.trial += 1;
        if decision.advances() {
            block.cursor += 1;
        }
        Ok(Step::Recorded(decision))
    }

    /// Runs a block to completion or until the participant quits.
    pub fn run_block<K: KeySource + ?Sized>(
        &mut self,
        number: u32,
        text: TargetText,
        keys: &mut K,
    ) -> Result<BlockOutcome> {
        let mut block = Block::new(number, text);
        while !block.is_finished() {
            let shown_at = self.present(&block)?;
            let key = keys.next_key()?;
            let response_time = shown_at.elapsed();
            if self.press(&mut block, key, response_time)? == Step::Quit {
                debug!(block = number, cursor = block.cursor, "quit during block");
                return Ok(BlockOutcome::Quit(block.into_records()));
            }
        }
        Ok(BlockOutcome::Completed(block.into_records()))
    }
}
