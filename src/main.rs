use authorship::{
    config::{ConfigStore, ExperimentConfig, FileConfigStore, Rate, Settings},
    engine::TrialEngine,
    experiment::{Experiment, RunOutcome, Timing},
    input::CrosstermKeys,
    log::LogWriter,
    markers::{self, MarkerConfig, DEFAULT_PULSE_MS},
    stories::StorySet,
    text::TargetText,
    ui::TerminalPresenter,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    error::Error,
    fs,
    io::{self, stdin},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{info, Level};

/// typing experiment with manipulated keystroke feedback
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Presents paragraphs to type and reports every keystroke as right or wrong, occasionally lying about it, while logging each keypress and sending EEG event markers."
)]
pub struct Cli {
    /// experiment config file (json)
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// results log to append to
    #[clap(short = 'o', long)]
    log_file: Option<PathBuf>,

    /// stories to type, one block each (.json, or plain text separated by blank lines)
    #[clap(short = 's', long)]
    stories: Option<PathBuf>,

    /// falsely report an error on one in N correct keypresses
    #[clap(long, conflicts_with = "false_error_rate")]
    false_error_odds: Option<f64>,

    /// probability of falsely reporting an error on a correct keypress
    #[clap(long)]
    false_error_rate: Option<f64>,

    /// falsely accept one in N wrong keypresses
    #[clap(long, conflicts_with = "rectify_rate")]
    rectify_odds: Option<f64>,

    /// probability of falsely accepting a wrong keypress
    #[clap(long)]
    rectify_rate: Option<f64>,

    /// seed for the feedback manipulation, for reproducible runs
    #[clap(long)]
    seed: Option<u64>,

    /// send EEG markers through this port device (e.g. /dev/port)
    #[clap(long)]
    marker_port: Option<PathBuf>,

    /// I/O address of the parallel port
    #[clap(long, value_parser = parse_address, default_value = "0xDFF8")]
    marker_address: u64,

    /// how long each marker code stays on the port, in milliseconds
    #[clap(long, default_value_t = DEFAULT_PULSE_MS)]
    marker_pulse_ms: u64,

    /// log markers instead of sending them
    #[clap(long, conflicts_with = "marker_port")]
    fake_markers: bool,

    /// verbose diagnostics and no enforced reading time on the instructions
    #[clap(long)]
    debug: bool,

    /// validate config, stories and results log, print the next session, and exit
    /// without writing anything
    #[clap(long)]
    check: bool,
}

fn parse_address(s: &str) -> Result<u64, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid port address `{s}`: {e}"))
}

impl Cli {
    /// Layers command-line overrides on top of the loaded config.
    fn apply(&self, cfg: &mut ExperimentConfig) {
        if let Some(path) = &self.log_file {
            cfg.log_path = Some(path.clone());
        }
        if let Some(path) = &self.stories {
            cfg.stories_path = Some(path.clone());
        }
        if let Some(odds) = self.false_error_odds {
            cfg.false_error = Rate::Odds(odds);
        }
        if let Some(p) = self.false_error_rate {
            cfg.false_error = Rate::Probability(p);
        }
        if let Some(odds) = self.rectify_odds {
            cfg.rectify = Rate::Odds(odds);
        }
        if let Some(p) = self.rectify_rate {
            cfg.rectify = Rate::Probability(p);
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(device) = &self.marker_port {
            cfg.markers = MarkerConfig::Port {
                device: device.clone(),
                address: self.marker_address,
                pulse_ms: self.marker_pulse_ms,
            };
        }
        if self.fake_markers {
            cfg.markers = MarkerConfig::Fake;
        }
        if self.debug {
            cfg.landing_wait_ms = 0;
        }
    }
}

fn init_tracing(cli: &Cli, results_path: &Path) -> Result<(), Box<dyn Error>> {
    let level = if cli.debug { Level::DEBUG } else { Level::INFO };
    if cli.check {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_max_level(level)
            .init();
        return Ok(());
    }

    // The terminal belongs to the stimulus display; diagnostics go next to the results.
    let diagnostics = results_path.with_file_name("authorship.log");
    if let Some(parent) = diagnostics.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&diagnostics)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();
    Ok(())
}

/// Runs its closure when dropped, so early returns still restore the terminal.
struct RestoreOnDrop<F: FnMut()>(F);

impl<F: FnMut()> Drop for RestoreOnDrop<F> {
    fn drop(&mut self) {
        (self.0)()
    }
}

fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

fn load_texts(settings: &Settings) -> Result<Vec<TargetText>, Box<dyn Error>> {
    let stories = match &settings.stories_path {
        Some(path) => StorySet::from_path(path)?,
        None => StorySet::builtin()?,
    };
    info!(name = %stories.name, blocks = stories.stories.len(), "stories loaded");
    Ok(stories.prepare(&settings.alphabet, settings.max_paragraph_length)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let mut cfg = store.load()?;
    cli.apply(&mut cfg);
    let settings = cfg.validate()?;

    init_tracing(&cli, &settings.log_path)?;
    info!(
        config = %store.path().display(),
        false_error = settings.policy.false_error(),
        rectify = settings.policy.rectify(),
        "experiment configured"
    );

    let texts = load_texts(&settings)?;

    if cli.check {
        let session = LogWriter::peek_session(&settings.log_path, &settings.schema)?;
        println!(
            "ok: {} blocks, next session {} in {}",
            texts.len(),
            session.id,
            settings.log_path.display()
        );
        return Ok(());
    }

    let (log, session) = LogWriter::open(&settings.log_path, settings.schema.clone())?;

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let markers = markers::from_config(&settings.markers)?;
    let seed = settings.seed.unwrap_or_else(rand::random);
    info!(session = session.id, seed, "session assigned");

    enable_raw_mode()?;
    let restore = RestoreOnDrop(restore_terminal);
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let engine = TrialEngine::new(session.id, settings.policy, StdRng::seed_from_u64(seed))
        .with_markers(markers)
        .with_presenter(TerminalPresenter::new(terminal));
    let keys = CrosstermKeys::new(settings.alphabet.clone());
    let mut experiment = Experiment::new(engine, keys, log, texts, Timing::from(&settings));

    let outcome = experiment.run();
    drop(experiment);
    drop(restore);

    match outcome? {
        RunOutcome::Completed { blocks, trials } => {
            info!(blocks, trials, "run finished");
        }
        RunOutcome::Quit { completed_blocks } => {
            info!(completed_blocks, "run quit by participant");
        }
    }
    Ok(())
}
