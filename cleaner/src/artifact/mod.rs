//! Versioned artifacts.
//!
//! An artifact is an immutable file registered under a name, a type tag and a
//! description. Each publish under a name creates the next version, starting
//! at `v0`. Inputs are referenced as `name:version` where version is
//! `latest`, `vN` or `N`.
//!
//! [`ArtifactStore`] is the seam to the tracking system;
//! [`LocalArtifactStore`] keeps everything under one directory.

pub mod local;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{ArtifactError, ArtifactResult};
use crate::run::{RunInfo, RunRecord};

pub use local::LocalArtifactStore;

static REFERENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z0-9][A-Za-z0-9._-]*)(?::(?P<version>latest|v?\d+))?$")
        .expect("artifact reference pattern is valid")
});

/// Which version of an artifact to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Number(u32),
}

impl fmt::Display for VersionSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionSelector::Latest => write!(f, "latest"),
            VersionSelector::Number(n) => write!(f, "v{}", n),
        }
    }
}

/// A parsed `name:version` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRef {
    pub name: String,
    pub version: VersionSelector,
}

impl ArtifactRef {
    /// Parse `name`, `name:latest`, `name:v3` or `name:3`.
    pub fn parse(reference: &str) -> ArtifactResult<Self> {
        let invalid = || ArtifactError::InvalidReference(reference.to_string());
        let caps = REFERENCE_RE.captures(reference.trim()).ok_or_else(invalid)?;

        let version = match caps.name("version").map(|m| m.as_str()) {
            None | Some("latest") => VersionSelector::Latest,
            Some(v) => v
                .trim_start_matches('v')
                .parse()
                .map(VersionSelector::Number)
                .map_err(|_| invalid())?,
        };

        Ok(Self {
            name: caps["name"].to_string(),
            version,
        })
    }

    /// Whether `name` can be used as an artifact name.
    pub fn is_valid_name(name: &str) -> bool {
        REFERENCE_RE
            .captures(name)
            .is_some_and(|c| c.name("version").is_none())
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

/// What to publish.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    /// Local file to register.
    pub path: PathBuf,
}

impl ArtifactSpec {
    pub fn new(
        name: impl Into<String>,
        artifact_type: impl Into<String>,
        description: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Self {
        Self {
            name: name.into(),
            artifact_type: artifact_type.into(),
            description: description.into(),
            path: path.as_ref().to_path_buf(),
        }
    }
}

/// Manifest of one published artifact version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactVersion {
    pub name: String,
    pub version: u32,
    #[serde(rename = "type")]
    pub artifact_type: String,
    pub description: String,
    pub file_name: String,
    pub size_bytes: u64,
    pub created_at: String,
    /// Run that produced this version
    pub run_id: Option<String>,
    /// Parameters of the producing run
    #[serde(default)]
    pub run_config: Map<String, Value>,
}

impl ArtifactVersion {
    /// Exact reference to this version, e.g. `clean_sample.csv:v2`.
    pub fn reference(&self) -> ArtifactRef {
        ArtifactRef {
            name: self.name.clone(),
            version: VersionSelector::Number(self.version),
        }
    }
}

/// An external artifact store and run tracker.
pub trait ArtifactStore {
    /// All versions of an artifact, oldest first. Unknown names give an empty list.
    fn versions(&self, name: &str) -> ArtifactResult<Vec<ArtifactVersion>>;

    /// Resolve a reference to a concrete version.
    fn resolve(&self, reference: &ArtifactRef) -> ArtifactResult<ArtifactVersion> {
        let versions = self.versions(&reference.name)?;
        if versions.is_empty() {
            return Err(ArtifactError::NotFound(reference.name.clone()));
        }

        let found = match reference.version {
            VersionSelector::Latest => versions.into_iter().last(),
            VersionSelector::Number(n) => versions.into_iter().find(|v| v.version == n),
        };
        found.ok_or_else(|| ArtifactError::VersionNotFound {
            name: reference.name.clone(),
            version: reference.version.to_string(),
        })
    }

    /// Local readable path of a resolved version's file.
    fn file_path(&self, version: &ArtifactVersion) -> ArtifactResult<PathBuf>;

    /// Register a file as the next version of `spec.name`.
    fn publish(&self, spec: &ArtifactSpec, run: &RunInfo) -> ArtifactResult<ArtifactVersion>;

    /// Persist the record of a run.
    fn record_run(&self, record: &RunRecord) -> ArtifactResult<PathBuf>;
}
