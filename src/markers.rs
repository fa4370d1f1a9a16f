use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ExperimentError, Result};
use crate::policy::{Condition, Decision, Outcome};

/// Event codes sent to the EEG recorder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarkerCode {
    Reset,
    TrialShown,
    Keypress,
    Correct,
    Incorrect,
    ErrorInserted,
    ErrorRectified,
}

impl MarkerCode {
    pub fn value(&self) -> u8 {
        match self {
            MarkerCode::Reset => 0,
            MarkerCode::TrialShown => 1,
            MarkerCode::Keypress => 2,
            MarkerCode::Correct => 11,
            MarkerCode::Incorrect => 12,
            MarkerCode::ErrorInserted => 13,
            MarkerCode::ErrorRectified => 14,
        }
    }

    /// Code describing a decided trial: true outcome for control trials,
    /// the manipulation otherwise.
    pub fn for_decision(outcome: Outcome, decision: &Decision) -> Self {
        match (decision.condition, outcome) {
            (Condition::Control, Outcome::Correct) => MarkerCode::Correct,
            (Condition::Control, Outcome::Incorrect) => MarkerCode::Incorrect,
            (Condition::ErrorInserted, _) => MarkerCode::ErrorInserted,
            (Condition::ErrorRectified, _) => MarkerCode::ErrorRectified,
        }
    }
}

/// Destination for event markers.
pub trait MarkerSink {
    fn send(&mut self, code: MarkerCode) -> Result<()>;
}

impl<M: MarkerSink + ?Sized> MarkerSink for Box<M> {
    fn send(&mut self, code: MarkerCode) -> Result<()> {
        (**self).send(code)
    }
}

/// No hardware attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMarkers;

impl MarkerSink for NoopMarkers {
    fn send(&mut self, _code: MarkerCode) -> Result<()> {
        Ok(())
    }
}

/// Stands in for the port while debugging; every non-reset code is logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMarkers;

impl MarkerSink for TracingMarkers {
    fn send(&mut self, code: MarkerCode) -> Result<()> {
        if code != MarkerCode::Reset {
            debug!(code = code.value(), ?code, "fake trigger");
        }
        Ok(())
    }
}

/// Writes marker bytes to an I/O port through a port device file such as `/dev/port`.
#[derive(Debug)]
pub struct PortMarkers {
    file: File,
    address: u64,
}

impl PortMarkers {
    pub fn open<P: AsRef<Path>>(device: P, address: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .open(device.as_ref())
            .map_err(|e| ExperimentError::io("opening the marker port", e))?;
        let mut sink = Self { file, address };
        sink.send(MarkerCode::Reset)?;
        info!(
            device = %device.as_ref().display(),
            address = %format!("{address:#X}"),
            "connected to marker port"
        );
        Ok(sink)
    }
}

impl MarkerSink for PortMarkers {
    fn send(&mut self, code: MarkerCode) -> Result<()> {
        let value = code.value();
        self.file
            .seek(SeekFrom::Start(self.address))
            .and_then(|_| self.file.write_all(&[value]))
            .and_then(|_| self.file.flush())
            .map_err(|source| ExperimentError::Marker {
                code: value,
                source,
            })
    }
}

/// Holds every non-reset code on the wrapped sink for `pulse`, then clears it.
///
/// A latched port would otherwise carry each code only until the next write,
/// which can be microseconds apart and shorter than one EEG sample.
#[derive(Debug)]
pub struct PulsedMarkers<S> {
    inner: S,
    pulse: Duration,
    cleared: bool,
}

impl<S: MarkerSink> PulsedMarkers<S> {
    pub fn new(inner: S, pulse: Duration) -> Self {
        Self {
            inner,
            pulse,
            cleared: false,
        }
    }

    pub fn pulse(&self) -> Duration {
        self.pulse
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: MarkerSink> MarkerSink for PulsedMarkers<S> {
    fn send(&mut self, code: MarkerCode) -> Result<()> {
        if code == MarkerCode::Reset {
            if !self.cleared {
                self.inner.send(MarkerCode::Reset)?;
                self.cleared = true;
            }
            return Ok(());
        }
        self.inner.send(code)?;
        self.cleared = false;
        thread::sleep(self.pulse);
        self.inner.send(MarkerCode::Reset)?;
        self.cleared = true;
        Ok(())
    }
}

/// Which marker sink a run uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkerConfig {
    #[default]
    None,
    Fake,
    Port {
        device: PathBuf,
        address: u64,
        /// How long each code stays on the port before it is cleared.
        #[serde(default = "default_pulse_ms")]
        pulse_ms: u64,
    },
}

pub const DEFAULT_PORT_DEVICE: &str = "/dev/port";
pub const DEFAULT_PORT_ADDRESS: u64 = 0xDFF8;
pub const DEFAULT_PULSE_MS: u64 = 5;

fn default_pulse_ms() -> u64 {
    DEFAULT_PULSE_MS
}

/// Builds the configured sink. Called once at startup.
pub fn from_config(config: &MarkerConfig) -> Result<Box<dyn MarkerSink>> {
    Ok(match config {
        MarkerConfig::None => Box::new(NoopMarkers),
        MarkerConfig::Fake => Box::new(TracingMarkers),
        MarkerConfig::Port {
            device,
            address,
            pulse_ms,
        } => Box::new(PulsedMarkers::new(
            PortMarkers::open(device, *address)?,
            Duration::from_millis(*pulse_ms),
        )),
    })
}

/// Records every code it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingMarkers {
    pub codes: Vec<MarkerCode>,
}

impl MarkerSink for RecordingMarkers {
    fn send(&mut self, code: MarkerCode) -> Result<()> {
        self.codes.push(code);
        Ok(())
    }
}
