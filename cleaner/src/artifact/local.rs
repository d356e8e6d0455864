//! Directory-backed artifact store.
//!
//! Layout under the root:
//!
//! ```text
//! artifacts/<name>/v<N>/<file>
//! artifacts/<name>/v<N>/manifest.json
//! runs/<run id>.json
//! ```
//!
//! A version directory is created with `create_dir`, never reused, so a
//! published version cannot be overwritten.

use std::fs;
use std::path::{Path, PathBuf};

use super::{ArtifactRef, ArtifactSpec, ArtifactStore, ArtifactVersion};
use crate::error::{ArtifactError, ArtifactResult};
use crate::run::{RunInfo, RunRecord};

/// Directory where artifacts are stored when nothing else is configured
pub const DEFAULT_STORE_DIR: &str = ".artifacts";

const MANIFEST: &str = "manifest.json";

/// Artifact store rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    /// Create a store rooted at `root`. Nothing is created until first publish.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_dir(&self, name: &str) -> PathBuf {
        self.root.join("artifacts").join(name)
    }

    fn version_dir(&self, name: &str, version: u32) -> PathBuf {
        self.artifact_dir(name).join(format!("v{}", version))
    }

    fn runs_dir(&self) -> PathBuf {
        self.root.join("runs")
    }

    fn read_manifest(path: &Path) -> ArtifactResult<ArtifactVersion> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Copy the file and write the manifest into a fresh version directory.
    fn write_version(
        &self,
        dir: &Path,
        spec: &ArtifactSpec,
        file_name: &str,
        version: ArtifactVersion,
    ) -> ArtifactResult<ArtifactVersion> {
        let size_bytes = fs::copy(&spec.path, dir.join(file_name))?;
        let version = ArtifactVersion { size_bytes, ..version };
        let content = serde_json::to_string_pretty(&version)?;
        fs::write(dir.join(MANIFEST), content)?;
        Ok(version)
    }
}

impl Default for LocalArtifactStore {
    fn default() -> Self {
        Self::new(DEFAULT_STORE_DIR)
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn versions(&self, name: &str) -> ArtifactResult<Vec<ArtifactVersion>> {
        let dir = self.artifact_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path().join(MANIFEST);
            if path.is_file() {
                versions.push(Self::read_manifest(&path)?);
            }
        }

        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    fn file_path(&self, version: &ArtifactVersion) -> ArtifactResult<PathBuf> {
        let path = self
            .version_dir(&version.name, version.version)
            .join(&version.file_name);
        if !path.is_file() {
            return Err(ArtifactError::NotFound(format!(
                "{} (missing file {})",
                version.reference(),
                path.display()
            )));
        }
        Ok(path)
    }

    fn publish(&self, spec: &ArtifactSpec, run: &RunInfo) -> ArtifactResult<ArtifactVersion> {
        if !ArtifactRef::is_valid_name(&spec.name) {
            return Err(ArtifactError::InvalidReference(spec.name.clone()));
        }
        if !spec.path.is_file() {
            return Err(ArtifactError::PublishRejected(format!(
                "{} is not a readable file",
                spec.path.display()
            )));
        }
        let file_name = spec
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                ArtifactError::PublishRejected(format!("{} has no file name", spec.path.display()))
            })?
            .to_string();

        let next = self
            .versions(&spec.name)?
            .last()
            .map(|v| v.version + 1)
            .unwrap_or(0);

        fs::create_dir_all(self.artifact_dir(&spec.name))?;
        let dir = self.version_dir(&spec.name, next);
        fs::create_dir(&dir).map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => ArtifactError::PublishRejected(format!(
                "{}:v{} already exists",
                spec.name, next
            )),
            _ => ArtifactError::Io(e),
        })?;

        let version = ArtifactVersion {
            name: spec.name.clone(),
            version: next,
            artifact_type: spec.artifact_type.clone(),
            description: spec.description.clone(),
            file_name: file_name.clone(),
            size_bytes: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
            run_id: Some(run.id.to_string()),
            run_config: run.config.clone(),
        };

        // A half-written version must not be visible to readers
        self.write_version(&dir, spec, &file_name, version)
            .map_err(|e| {
                let _ = fs::remove_dir_all(&dir);
                e
            })
    }

    fn record_run(&self, record: &RunRecord) -> ArtifactResult<PathBuf> {
        fs::create_dir_all(self.runs_dir())?;
        let path = self.runs_dir().join(format!("{}.json", record.id));
        let content = serde_json::to_string_pretty(record)?;
        fs::write(&path, content)?;
        Ok(path)
    }
}
