// Library surface for the binary, headless runs and integration tests.
pub mod app_dirs;
pub mod config;
pub mod engine;
pub mod error;
pub mod experiment;
pub mod input;
pub mod keys;
pub mod log;
pub mod markers;
pub mod policy;
pub mod present;
pub mod record;
pub mod session;
pub mod stories;
pub mod summary;
pub mod text;
pub mod ui;

pub use error::{ExperimentError, Result};
