//! Environment-driven settings.
//!
//! `.env` is loaded by the binary before these are read.

use std::env;
use std::path::PathBuf;

use crate::artifact::local::DEFAULT_STORE_DIR;

/// Environment variable naming the artifact store directory.
pub const ARTIFACT_ROOT_ENV: &str = "BASIC_CLEANING_ARTIFACT_ROOT";

/// Job type recorded for runs of this step.
pub const DEFAULT_JOB_TYPE: &str = "basic_cleaning";

/// Where the step keeps and writes its files.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Root of the local artifact store
    pub artifact_root: PathBuf,
    /// Directory the cleaned CSV is written to before publishing
    pub work_dir: PathBuf,
    pub job_type: String,
}

impl Settings {
    /// Read settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let artifact_root = env::var(ARTIFACT_ROOT_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR));

        Self {
            artifact_root,
            ..Self::default()
        }
    }

    pub fn with_artifact_root(mut self, root: Option<PathBuf>) -> Self {
        if let Some(root) = root {
            self.artifact_root = root;
        }
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_job_type(mut self, job_type: impl Into<String>) -> Self {
        self.job_type = job_type.into();
        self
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from(DEFAULT_STORE_DIR),
            work_dir: PathBuf::from("."),
            job_type: DEFAULT_JOB_TYPE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.artifact_root, PathBuf::from(".artifacts"));
        assert_eq!(settings.work_dir, PathBuf::from("."));
        assert_eq!(settings.job_type, "basic_cleaning");
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::default()
            .with_artifact_root(Some(PathBuf::from("/tmp/store")))
            .with_artifact_root(None)
            .with_work_dir("/tmp/work")
            .with_job_type("cleaning");
        assert_eq!(settings.artifact_root, PathBuf::from("/tmp/store"));
        assert_eq!(settings.work_dir, PathBuf::from("/tmp/work"));
        assert_eq!(settings.job_type, "cleaning");
    }
}
