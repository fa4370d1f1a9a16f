use std::thread;
use std::time::Duration;

use rand::Rng;
use tracing::{info, warn};

use crate::config::Settings;
use crate::engine::{BlockOutcome, TrialEngine};
use crate::error::Result;
use crate::input::{wait_for_start, KeySource};
use crate::log::LogWriter;
use crate::markers::MarkerSink;
use crate::present::{Presenter, Screen};
use crate::summary::BlockSummary;
use crate::text::TargetText;

/// Pauses between the screens of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timing {
    pub landing_wait: Duration,
    pub intermission: Duration,
    pub credits: Duration,
}

impl From<&Settings> for Timing {
    fn from(settings: &Settings) -> Self {
        Self {
            landing_wait: Duration::from_millis(settings.landing_wait_ms),
            intermission: Duration::from_millis(settings.intermission_ms),
            credits: Duration::from_millis(settings.credits_ms),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed { blocks: usize, trials: usize },
    /// Quit pressed; only blocks finished before that were written.
    Quit { completed_blocks: usize },
}

/// A whole session: landing page, every block with its intermission, credits.
pub struct Experiment<R, M, P, K> {
    engine: TrialEngine<R, M, P>,
    keys: K,
    log: LogWriter,
    texts: Vec<TargetText>,
    timing: Timing,
}

impl<R, M, P, K> Experiment<R, M, P, K>
where
    R: Rng,
    M: MarkerSink,
    P: Presenter,
    K: KeySource,
{
    pub fn new(
        engine: TrialEngine<R, M, P>,
        keys: K,
        log: LogWriter,
        texts: Vec<TargetText>,
        timing: Timing,
    ) -> Self {
        Self {
            engine,
            keys,
            log,
            texts,
            timing,
        }
    }

    pub fn engine(&self) -> &TrialEngine<R, M, P> {
        &self.engine
    }

    pub fn run(&mut self) -> Result<RunOutcome> {
        info!(
            session = self.engine.session(),
            blocks = self.texts.len(),
            "session started"
        );

        if !self.landing()? {
            info!("quit before the first block");
            return Ok(RunOutcome::Quit {
                completed_blocks: 0,
            });
        }

        let mut trials = 0;
        for (idx, text) in self.texts.iter().enumerate() {
            let number = idx as u32 + 1;
            self.engine.presenter_mut().screen(Screen::Intermission)?;
            pause(self.timing.intermission);

            info!(block = number, characters = text.len(), "block started");
            match self.engine.run_block(number, text.clone(), &mut self.keys)? {
                BlockOutcome::Completed(records) => {
                    self.log.append(&records)?;
                    trials += records.len();
                    let summary = BlockSummary::from_records(&records);
                    info!(
                        block = number,
                        trials = summary.trials,
                        control = summary.control,
                        errors_inserted = summary.errors_inserted,
                        errors_rectified = summary.errors_rectified,
                        accuracy = summary.accuracy,
                        mean_ms = %format!("{:.0}", summary.mean_response_ms),
                        sd_ms = %format!("{:.0}", summary.std_dev_response_ms),
                        "block completed"
                    );
                }
                BlockOutcome::Quit(records) => {
                    warn!(
                        block = number,
                        discarded = records.len(),
                        "quit during block, unfinished block not written"
                    );
                    return Ok(RunOutcome::Quit {
                        completed_blocks: idx,
                    });
                }
            }
        }

        self.engine.presenter_mut().screen(Screen::Credits)?;
        pause(self.timing.credits);
        info!(blocks = self.texts.len(), trials, "session completed");
        Ok(RunOutcome::Completed {
            blocks: self.texts.len(),
            trials,
        })
    }

    /// Instructions, then space to begin or quit to leave.
    fn landing(&mut self) -> Result<bool> {
        let presenter = self.engine.presenter_mut();
        presenter.screen(Screen::Landing { ready: false })?;
        pause(self.timing.landing_wait);
        presenter.screen(Screen::Landing { ready: true })?;
        wait_for_start(&mut self.keys)
    }
}

fn pause(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}
