//! The cleaning job, end to end.
//!
//! ```text
//! init run ─▶ record args ─▶ fetch input ─▶ read ─▶ clean ─▶ write CSV ─▶ publish ─▶ finish
//! ```
//!
//! Any failure marks the run failed and is returned unchanged. Nothing is
//! published unless every earlier step succeeded.
//!
//! # Example
//!
//! ```rust,ignore
//! use basic_cleaning::{go, CleaningArgs, LocalArtifactStore, Settings};
//!
//! let settings = Settings::from_env();
//! let store = LocalArtifactStore::new(&settings.artifact_root);
//! let outcome = go(&args, &store, &settings)?;
//! println!("Published {}", outcome.output.reference());
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

use crate::artifact::{ArtifactRef, ArtifactSpec, ArtifactStore, ArtifactVersion};
use crate::clean::{clean_with_report, CleanReport};
use crate::config::Settings;
use crate::error::{RunError, RunResult};
use crate::logs::log_warning;
use crate::parser::{read_table_file, write_table_file};
use crate::run::Run;

/// Parameters of one cleaning run, recorded in the run config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningArgs {
    /// Input reference, e.g. `sample.csv:latest`
    pub input_artifact: String,
    /// File name and artifact name of the cleaned table
    pub output_artifact_name: String,
    pub output_artifact_type: String,
    pub output_artifact_desc: String,
    pub min_price: f64,
    pub max_price: f64,
}

/// What a successful run produced.
#[derive(Debug, Clone, Serialize)]
pub struct CleaningOutcome {
    pub run_id: Uuid,
    pub input: ArtifactVersion,
    pub output: ArtifactVersion,
    /// Local copy of the cleaned CSV
    pub output_path: PathBuf,
    pub report: CleanReport,
}

/// Run the cleaning step against `store`.
pub fn go(
    args: &CleaningArgs,
    store: &dyn ArtifactStore,
    settings: &Settings,
) -> RunResult<CleaningOutcome> {
    let mut run = Run::init(store, &settings.job_type);

    match execute(&mut run, args, settings) {
        Ok(outcome) => {
            run.finish(serde_json::to_value(&outcome.report)?)?;
            Ok(outcome)
        }
        Err(e) => {
            run.log_error(e.to_string());
            if let Err(record_err) = run.fail(&e) {
                log_warning(format!("Could not record failed run: {}", record_err));
            }
            Err(e)
        }
    }
}

fn execute(run: &mut Run<'_>, args: &CleaningArgs, settings: &Settings) -> RunResult<CleaningOutcome> {
    run.config_update(args)?;

    let reference = ArtifactRef::parse(&args.input_artifact).map_err(RunError::Fetch)?;
    let input = run.use_artifact(&reference)?;

    let table = read_table_file(&input.path)?;
    run.log_success(format!(
        "Read {} rows, {} columns",
        table.len(),
        table.columns().len()
    ));

    run.log_info("Cleaning data");
    let cleaned = clean_with_report(&table, args.min_price, args.max_price)?;
    print_report(run, &cleaned.report);

    let output_path = settings.work_dir.join(&args.output_artifact_name);
    run.log_info(format!("Save {} as .csv", args.output_artifact_desc));
    write_table_file(&cleaned.table, &output_path)?;

    run.log_info(format!("Uploading {} file", args.output_artifact_name));
    let output = run.log_artifact(&ArtifactSpec::new(
        &args.output_artifact_name,
        &args.output_artifact_type,
        &args.output_artifact_desc,
        &output_path,
    ))?;

    Ok(CleaningOutcome {
        run_id: run.id(),
        input: input.version,
        output,
        output_path,
        report: cleaned.report,
    })
}

fn print_report(run: &Run<'_>, report: &CleanReport) {
    run.log_info_indent(
        format!("{} rows outside the price range dropped", report.dropped_by_price),
        1,
    );
    run.log_info_indent(
        format!("{} rows outside New York City dropped", report.dropped_by_location),
        1,
    );
    if report.unparsed_dates > 0 {
        run.log_warning(format!(
            "{} last_review values could not be parsed and were cleared",
            report.unparsed_dates
        ));
    }
    run.log_success(format!(
        "{} of {} rows kept",
        report.output_rows, report.input_rows
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::LocalArtifactStore;
    use crate::error::{ArtifactError, SchemaError};
    use crate::run::{RunInfo, RunRecord, RunStatus};
    use std::fs;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    const SAMPLE: &str = "\
id,name,price,last_review,longitude,latitude
1,kept,50,2019-05-21,-73.9,40.7
2,cheap,5,2019-05-21,-73.9,40.7
3,far,50,2019-05-21,-72.0,40.7
4,undated,50,not-a-date,-73.9,40.7
";

    struct Fixture {
        root: TempDir,
        work: TempDir,
        store: LocalArtifactStore,
        settings: Settings,
    }

    fn fixture(sample: &str) -> Fixture {
        let root = tempdir().unwrap();
        let work = tempdir().unwrap();
        let store = LocalArtifactStore::new(root.path());

        let raw = work.path().join("sample.csv");
        fs::write(&raw, sample).unwrap();
        store
            .publish(
                &ArtifactSpec::new("sample.csv", "raw_data", "Raw listings", &raw),
                &RunInfo::new("download"),
            )
            .unwrap();
        fs::remove_file(&raw).unwrap();

        let settings = Settings::default()
            .with_artifact_root(Some(root.path().to_path_buf()))
            .with_work_dir(work.path());
        Fixture { root, work, store, settings }
    }

    fn args() -> CleaningArgs {
        CleaningArgs {
            input_artifact: "sample.csv:latest".into(),
            output_artifact_name: "clean_sample.csv".into(),
            output_artifact_type: "clean_sample".into(),
            output_artifact_desc: "Data with outliers and null values removed".into(),
            min_price: 10.0,
            max_price: 350.0,
        }
    }

    fn run_records(root: &Path) -> Vec<RunRecord> {
        fs::read_dir(root.join("runs"))
            .unwrap()
            .map(|e| serde_json::from_str(&fs::read_to_string(e.unwrap().path()).unwrap()).unwrap())
            .collect()
    }

    #[test]
    fn test_go_cleans_and_publishes() {
        let fx = fixture(SAMPLE);
        let outcome = go(&args(), &fx.store, &fx.settings).unwrap();

        assert_eq!(outcome.input.reference().to_string(), "sample.csv:v0");
        assert_eq!(outcome.output.reference().to_string(), "clean_sample.csv:v0");
        assert_eq!(outcome.output.artifact_type, "clean_sample");
        assert_eq!(
            outcome.output.description,
            "Data with outliers and null values removed"
        );
        assert_eq!(outcome.output.run_config["min_price"], serde_json::json!(10.0));
        assert_eq!(outcome.report.output_rows, 2);

        let expected = "\
id,name,price,last_review,longitude,latitude
1,kept,50,2019-05-21,-73.9,40.7
4,undated,50,,-73.9,40.7
";
        assert_eq!(fs::read_to_string(&outcome.output_path).unwrap(), expected);
        assert_eq!(outcome.output_path, fx.work.path().join("clean_sample.csv"));

        let published = fx.store.file_path(&outcome.output).unwrap();
        assert_eq!(fs::read_to_string(published).unwrap(), expected);

        let records = run_records(fx.root.path());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, RunStatus::Finished);
        assert_eq!(records[0].inputs, vec!["sample.csv:v0"]);
        assert_eq!(records[0].summary["unparsed_dates"], 1);
        assert!(records[0].logs.iter().any(|l| l.message == "Cleaning data"));
        assert!(records[0].logs.iter().all(|l| l.run_id == Some(outcome.run_id)));
    }

    #[test]
    fn test_second_run_creates_new_version() {
        let fx = fixture(SAMPLE);
        go(&args(), &fx.store, &fx.settings).unwrap();
        let second = go(&args(), &fx.store, &fx.settings).unwrap();
        assert_eq!(second.output.version, 1);
    }

    #[test]
    fn test_missing_input_fails_before_cleaning() {
        let fx = fixture(SAMPLE);
        let mut bad = args();
        bad.input_artifact = "other.csv:latest".into();

        let err = go(&bad, &fx.store, &fx.settings).unwrap_err();
        assert!(matches!(err, RunError::Fetch(ArtifactError::NotFound(_))));
        assert!(!fx.work.path().join("clean_sample.csv").exists());

        let records = run_records(fx.root.path());
        assert_eq!(records[0].status, RunStatus::Failed);
    }

    #[test]
    fn test_malformed_reference_is_fetch_error() {
        let fx = fixture(SAMPLE);
        let mut bad = args();
        bad.input_artifact = "sample.csv:newest".into();

        let err = go(&bad, &fx.store, &fx.settings).unwrap_err();
        assert!(matches!(err, RunError::Fetch(ArtifactError::InvalidReference(_))));
    }

    #[test]
    fn test_non_numeric_price_publishes_nothing() {
        let fx = fixture("price,last_review,longitude,latitude\nabc,2019-05-21,-73.9,40.7\n");

        let err = go(&args(), &fx.store, &fx.settings).unwrap_err();
        assert!(matches!(err, RunError::Schema(SchemaError::NotNumeric { .. })));
        assert!(fx.store.versions("clean_sample.csv").unwrap().is_empty());
    }

    #[test]
    fn test_publish_failure_leaves_local_file() {
        let fx = fixture(SAMPLE);
        let mut bad = args();
        bad.output_artifact_name = "clean sample.csv".into();

        let err = go(&bad, &fx.store, &fx.settings).unwrap_err();
        assert!(matches!(err, RunError::Publish(_)));
        assert!(fx.work.path().join("clean sample.csv").is_file());

        let records = run_records(fx.root.path());
        assert_eq!(records[0].status, RunStatus::Failed);
        assert!(records[0].outputs.is_empty());
    }

    #[test]
    fn test_inverted_range_publishes_header_only() {
        let fx = fixture(SAMPLE);
        let mut inverted = args();
        inverted.min_price = 350.0;
        inverted.max_price = 10.0;

        let outcome = go(&inverted, &fx.store, &fx.settings).unwrap();
        assert_eq!(outcome.report.output_rows, 0);
        assert_eq!(
            fs::read_to_string(outcome.output_path).unwrap(),
            "id,name,price,last_review,longitude,latitude\n"
        );
    }
}
