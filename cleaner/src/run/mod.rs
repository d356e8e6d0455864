//! Tracking run handle.
//!
//! A [`Run`] is created at the start of a job, used to fetch inputs and
//! publish outputs through an [`ArtifactStore`], and consumed by
//! [`Run::finish`] or [`Run::fail`], which write the run record. Lines
//! logged through the run's own `log_*` methods are stored in that record;
//! other output on the shared broadcaster is not.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = LocalArtifactStore::new(".artifacts");
//! let mut run = Run::init(&store, "basic_cleaning");
//! run.config_update(&args)?;
//! let input = run.use_artifact(&ArtifactRef::parse("sample.csv:latest")?)?;
//! // ...
//! run.log_artifact(&ArtifactSpec::new("clean.csv", "clean_sample", "Cleaned", "clean.csv"))?;
//! run.finish(serde_json::json!({}))?;
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use uuid::Uuid;

use crate::artifact::{ArtifactRef, ArtifactSpec, ArtifactStore, ArtifactVersion};
use crate::error::{RunError, RunResult};
use crate::logs::{log_info, LogEntry, LOG_BROADCASTER};

/// Final state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// Identity and parameters of a run, attached to everything it publishes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunInfo {
    pub id: Uuid,
    pub job_type: String,
    pub config: Map<String, Value>,
}

impl RunInfo {
    pub fn new(job_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            job_type: job_type.into(),
            config: Map::new(),
        }
    }
}

/// What the tracking store keeps about a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: Uuid,
    pub job_type: String,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub config: Map<String, Value>,
    /// Exact references of the artifacts used
    pub inputs: Vec<String>,
    /// Exact references of the artifacts published
    pub outputs: Vec<String>,
    #[serde(default)]
    pub summary: Value,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl RunRecord {
    /// A record for a run that has just started.
    pub fn from_info(info: RunInfo) -> Self {
        Self {
            id: info.id,
            job_type: info.job_type,
            status: RunStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            config: info.config,
            inputs: Vec::new(),
            outputs: Vec::new(),
            summary: Value::Null,
            logs: Vec::new(),
        }
    }
}

/// An input artifact resolved for a run.
#[derive(Debug, Clone)]
pub struct UsedArtifact {
    pub version: ArtifactVersion,
    /// Local readable copy of the artifact's file
    pub path: PathBuf,
}

/// A live run against an artifact store.
pub struct Run<'a> {
    store: &'a dyn ArtifactStore,
    info: RunInfo,
    started_at: DateTime<Utc>,
    inputs: Vec<ArtifactVersion>,
    outputs: Vec<ArtifactVersion>,
    logs: Receiver<LogEntry>,
}

impl<'a> Run<'a> {
    /// Start a run of the given job type.
    pub fn init(store: &'a dyn ArtifactStore, job_type: &str) -> Self {
        let run = Self {
            store,
            info: RunInfo::new(job_type),
            started_at: Utc::now(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            logs: LOG_BROADCASTER.subscribe(),
        };
        run.log_info(format!("Run {} started ({})", run.info.id, run.info.job_type));
        run
    }

    pub fn id(&self) -> Uuid {
        self.info.id
    }

    pub fn info(&self) -> &RunInfo {
        &self.info
    }

    pub fn config(&self) -> &Map<String, Value> {
        &self.info.config
    }

    // =========================================================================
    // Run-scoped logging
    // =========================================================================

    fn log(&self, entry: LogEntry) {
        LOG_BROADCASTER.log(entry.for_run(self.info.id));
    }

    pub fn log_info(&self, msg: impl Into<String>) {
        self.log(LogEntry::info(msg));
    }

    pub fn log_success(&self, msg: impl Into<String>) {
        self.log(LogEntry::success(msg));
    }

    pub fn log_warning(&self, msg: impl Into<String>) {
        self.log(LogEntry::warning(msg));
    }

    pub fn log_error(&self, msg: impl Into<String>) {
        self.log(LogEntry::error(msg));
    }

    pub fn log_info_indent(&self, msg: impl Into<String>, indent: u8) {
        self.log(LogEntry::info(msg).with_indent(indent));
    }

    /// Record parameters. `params` must serialize to a JSON object; its keys
    /// are merged into the run config.
    pub fn config_update<T: Serialize>(&mut self, params: &T) -> RunResult<()> {
        match serde_json::to_value(params)? {
            Value::Object(map) => {
                self.info.config.extend(map);
                Ok(())
            }
            other => Err(RunError::Config(format!(
                "expected an object of parameters, got {}",
                other
            ))),
        }
    }

    /// Resolve an input artifact to a concrete version and a local path.
    ///
    /// The exact version used is recorded as an input of the run.
    pub fn use_artifact(&mut self, reference: &ArtifactRef) -> RunResult<UsedArtifact> {
        let version = self.store.resolve(reference).map_err(RunError::Fetch)?;
        let path = self.store.file_path(&version).map_err(RunError::Fetch)?;

        self.log_info(format!("Using artifact {} ({})", version.reference(), path.display()));
        self.inputs.push(version.clone());
        Ok(UsedArtifact { version, path })
    }

    /// Publish a file as a new artifact version tied to this run.
    pub fn log_artifact(&mut self, spec: &ArtifactSpec) -> RunResult<ArtifactVersion> {
        let version = self
            .store
            .publish(spec, &self.info)
            .map_err(RunError::Publish)?;

        self.log_success(format!(
            "Published {} ({}, {} bytes)",
            version.reference(),
            version.artifact_type,
            version.size_bytes
        ));
        self.outputs.push(version.clone());
        Ok(version)
    }

    /// End the run successfully and store its record.
    pub fn finish(self, summary: Value) -> RunResult<RunRecord> {
        self.close(RunStatus::Finished, summary)
    }

    /// End the run as failed and store its record.
    pub fn fail(self, error: &RunError) -> RunResult<RunRecord> {
        let summary = serde_json::json!({ "error": error.to_string() });
        self.close(RunStatus::Failed, summary)
    }

    fn close(self, status: RunStatus, summary: Value) -> RunResult<RunRecord> {
        let id = self.info.id;
        let record = RunRecord {
            id: self.info.id,
            job_type: self.info.job_type,
            status,
            started_at: self.started_at,
            finished_at: Some(Utc::now()),
            config: self.info.config,
            inputs: self.inputs.iter().map(|v| v.reference().to_string()).collect(),
            outputs: self.outputs.iter().map(|v| v.reference().to_string()).collect(),
            summary,
            logs: self.logs.try_iter().filter(|e| e.run_id == Some(id)).collect(),
        };

        let path = self.store.record_run(&record)?;
        log_info(format!("Run record written to {}", path.display()));
        Ok(record)
    }
}
