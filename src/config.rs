use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::{ExperimentError, Result};
use crate::keys::Alphabet;
use crate::markers::MarkerConfig;
use crate::policy::DeceptionPolicy;
use crate::record::{Column, Schema};

/// Rate of sham feedback, either as a probability or as odds (`1 / odds`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Rate {
    Probability(f64),
    Odds(f64),
}

impl Rate {
    pub fn probability(&self) -> Result<f64> {
        match *self {
            Rate::Probability(p) if (0.0..=1.0).contains(&p) => Ok(p),
            Rate::Probability(p) => Err(ExperimentError::invalid_config(format!(
                "probability must lie in [0, 1], got {p}"
            ))),
            Rate::Odds(n) if n.is_finite() && n >= 1.0 => Ok(1.0 / n),
            Rate::Odds(n) => Err(ExperimentError::invalid_config(format!(
                "odds must be a finite number of at least 1, got {n}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExperimentConfig {
    pub max_paragraph_length: usize,
    pub false_error: Rate,
    pub rectify: Rate,
    pub alphabet: String,
    pub columns: Vec<Column>,
    pub log_path: Option<PathBuf>,
    pub stories_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub markers: MarkerConfig,
    pub landing_wait_ms: u64,
    pub intermission_ms: u64,
    pub credits_ms: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            max_paragraph_length: 250,
            false_error: Rate::Odds(100.0),
            rectify: Rate::Odds(10.0),
            alphabet: "abcdefghijklmnopqrstuvwxyz".to_string(),
            columns: Column::ALL.to_vec(),
            log_path: None,
            stories_path: None,
            seed: None,
            markers: MarkerConfig::None,
            landing_wait_ms: 10_000,
            intermission_ms: 3_000,
            credits_ms: 2_000,
        }
    }
}

/// Checked form of [`ExperimentConfig`], ready to build the engine and log from.
#[derive(Debug, Clone)]
pub struct Settings {
    pub max_paragraph_length: usize,
    pub policy: DeceptionPolicy,
    pub alphabet: Alphabet,
    pub schema: Schema,
    pub log_path: PathBuf,
    pub stories_path: Option<PathBuf>,
    pub seed: Option<u64>,
    pub markers: MarkerConfig,
    pub landing_wait_ms: u64,
    pub intermission_ms: u64,
    pub credits_ms: u64,
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<Settings> {
        if self.max_paragraph_length == 0 {
            return Err(ExperimentError::invalid_config(
                "max_paragraph_length must be positive",
            ));
        }
        let false_error = self.false_error.probability()?;
        let rectify = self.rectify.probability()?;
        let log_path = match &self.log_path {
            Some(p) => p.clone(),
            None => AppDirs::results_path().ok_or_else(|| {
                ExperimentError::invalid_config("no log path given and no home directory found")
            })?,
        };

        Ok(Settings {
            max_paragraph_length: self.max_paragraph_length,
            policy: DeceptionPolicy::new(false_error, rectify)?,
            alphabet: Alphabet::new(&self.alphabet)?,
            schema: Schema::new(self.columns.clone())?,
            log_path,
            stories_path: self.stories_path.clone(),
            seed: self.seed,
            markers: self.markers.clone(),
            landing_wait_ms: self.landing_wait_ms,
            intermission_ms: self.intermission_ms,
            credits_ms: self.credits_ms,
        })
    }
}

pub trait ConfigStore {
    fn load(&self) -> Result<ExperimentConfig>;
    fn save(&self, cfg: &ExperimentConfig) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = AppDirs::config_path().unwrap_or_else(|| PathBuf::from("authorship.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    /// Missing file means defaults; a file that cannot be read or parsed is an error.
    fn load(&self) -> Result<ExperimentConfig> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ExperimentConfig::default())
            }
            Err(e) => return Err(ExperimentError::io("reading the config file", e)),
        };
        serde_json::from_slice(&bytes).map_err(|e| ExperimentError::json("parsing the config file", e))
    }

    fn save(&self, cfg: &ExperimentConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ExperimentError::io("creating the config directory", e))?;
        }
        let data = serde_json::to_vec_pretty(cfg)
            .map_err(|e| ExperimentError::json("serializing the config", e))?;
        fs::write(&self.path, data).map_err(|e| ExperimentError::io("writing the config file", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = ExperimentConfig::default();
        store.save(&cfg).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn save_and_load_custom_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        let store = FileConfigStore::with_path(&path);
        let cfg = ExperimentConfig {
            max_paragraph_length: 120,
            false_error: Rate::Probability(0.05),
            rectify: Rate::Odds(4.0),
            alphabet: "abc".into(),
            columns: vec![Column::Trial, Column::Response],
            log_path: Some(dir.path().join("out.csv")),
            stories_path: None,
            seed: Some(42),
            markers: MarkerConfig::Fake,
            landing_wait_ms: 0,
            intermission_ms: 0,
            credits_ms: 0,
        };
        store.save(&cfg).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(cfg, loaded);
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("absent.json"));
        assert_eq!(store.load().unwrap(), ExperimentConfig::default());
    }

    #[test]
    fn garbage_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let store = FileConfigStore::with_path(&path);
        assert_matches!(store.load(), Err(ExperimentError::Json { .. }));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"rectify":{"probability":0.25}}"#).unwrap();
        let cfg = FileConfigStore::with_path(&path).load().unwrap();
        assert_eq!(cfg.rectify, Rate::Probability(0.25));
        assert_eq!(cfg.false_error, Rate::Odds(100.0));
        assert_eq!(cfg.max_paragraph_length, 250);
    }

    #[test]
    fn odds_convert_to_probabilities() {
        assert_eq!(Rate::Odds(100.0).probability().unwrap(), 0.01);
        assert_eq!(Rate::Odds(1.0).probability().unwrap(), 1.0);
        assert_eq!(Rate::Probability(0.3).probability().unwrap(), 0.3);
        assert!(Rate::Odds(0.5).probability().is_err());
        assert!(Rate::Odds(f64::INFINITY).probability().is_err());
        assert!(Rate::Probability(1.2).probability().is_err());
    }

    #[test]
    fn validate_defaults() {
        let dir = tempdir().unwrap();
        let cfg = ExperimentConfig {
            log_path: Some(dir.path().join("results.csv")),
            ..ExperimentConfig::default()
        };
        let settings = cfg.validate().unwrap();
        assert_eq!(settings.policy.false_error(), 0.01);
        assert_eq!(settings.policy.rectify(), 0.1);
        assert_eq!(settings.alphabet.len(), 26);
        assert_eq!(settings.schema, Schema::full());
    }

    #[test]
    fn validate_rejects_bad_fields() {
        let base = ExperimentConfig {
            log_path: Some(PathBuf::from("results.csv")),
            ..ExperimentConfig::default()
        };
        let zero_len = ExperimentConfig {
            max_paragraph_length: 0,
            ..base.clone()
        };
        assert!(zero_len.validate().is_err());
        let empty_alphabet = ExperimentConfig {
            alphabet: String::new(),
            ..base.clone()
        };
        assert!(empty_alphabet.validate().is_err());
        let no_columns = ExperimentConfig {
            columns: vec![],
            ..base.clone()
        };
        assert!(no_columns.validate().is_err());
        let bad_rate = ExperimentConfig {
            false_error: Rate::Probability(-0.5),
            ..base
        };
        assert!(bad_rate.validate().is_err());
    }
}
