use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "authorship")
    }

    /// Behavioural results shared across sessions.
    pub fn results_path() -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.data_dir().join("behavioural").join("results.csv"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project().map(|dirs| dirs.config_dir().join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_file_names() {
        if let Some(path) = AppDirs::results_path() {
            assert!(path.ends_with("behavioural/results.csv"));
        }
        if let Some(path) = AppDirs::config_path() {
            assert!(path.ends_with("config.json"));
        }
    }
}
