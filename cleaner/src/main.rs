//! basic-cleaning CLI - clean a listings artifact and publish the result
//!
//! ```bash
//! basic-cleaning \
//!     --input_artifact sample.csv:latest \
//!     --output_artifact_name clean_sample.csv \
//!     --output_artifact_type clean_sample \
//!     --output_artifact_desc "Data with outliers and null values removed" \
//!     --min_price 10 \
//!     --max_price 350
//! ```
//!
//! The artifact store lives in `.artifacts/` unless `--artifact_root` or
//! `BASIC_CLEANING_ARTIFACT_ROOT` (also read from `.env`) says otherwise.

use basic_cleaning::config::{ARTIFACT_ROOT_ENV, DEFAULT_JOB_TYPE};
use basic_cleaning::{go, CleaningArgs, LocalArtifactStore, Settings};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "basic-cleaning")]
#[command(about = "This step cleans the data", long_about = None)]
struct Cli {
    /// Input csv data file name (eg: 'sample.csv:latest')
    #[arg(long = "input_artifact")]
    input_artifact: String,

    /// Name of cleaned file saved as .csv file (eg: 'clean_sample.csv')
    #[arg(long = "output_artifact_name")]
    output_artifact_name: String,

    /// Type of artifact file (eg: 'clean_sample')
    #[arg(long = "output_artifact_type")]
    output_artifact_type: String,

    /// Description of output file generated
    #[arg(long = "output_artifact_desc")]
    output_artifact_desc: String,

    /// Price lower limit (eg: 10)
    #[arg(long = "min_price", allow_negative_numbers = true)]
    min_price: f64,

    /// Price upper limit (eg: 350)
    #[arg(long = "max_price", allow_negative_numbers = true)]
    max_price: f64,

    /// Artifact store directory
    #[arg(long = "artifact_root", env = ARTIFACT_ROOT_ENV)]
    artifact_root: Option<PathBuf>,

    /// Directory the cleaned CSV is written to
    #[arg(long = "work_dir", default_value = ".")]
    work_dir: PathBuf,

    /// Job type recorded with the run
    #[arg(long = "job_type", default_value = DEFAULT_JOB_TYPE)]
    job_type: String,
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()
        .with_artifact_root(cli.artifact_root)
        .with_work_dir(cli.work_dir)
        .with_job_type(cli.job_type);

    let args = CleaningArgs {
        input_artifact: cli.input_artifact,
        output_artifact_name: cli.output_artifact_name,
        output_artifact_type: cli.output_artifact_type,
        output_artifact_desc: cli.output_artifact_desc,
        min_price: cli.min_price,
        max_price: cli.max_price,
    };

    let store = LocalArtifactStore::new(&settings.artifact_root);
    let outcome = go(&args, &store, &settings)?;

    eprintln!(
        "✨ Done! {} -> {} ({} of {} rows)",
        outcome.input.reference(),
        outcome.output.reference(),
        outcome.report.output_rows,
        outcome.report.input_rows
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_underscore_flags() {
        let cli = Cli::try_parse_from([
            "basic-cleaning",
            "--input_artifact", "sample.csv:latest",
            "--output_artifact_name", "clean_sample.csv",
            "--output_artifact_type", "clean_sample",
            "--output_artifact_desc", "Data with outliers and null values removed",
            "--min_price", "10",
            "--max_price", "350",
        ])
        .unwrap();

        assert_eq!(cli.input_artifact, "sample.csv:latest");
        assert_eq!(cli.min_price, 10.0);
        assert_eq!(cli.max_price, 350.0);
        assert_eq!(cli.job_type, "basic_cleaning");
        assert_eq!(cli.work_dir, PathBuf::from("."));
    }

    #[test]
    fn test_price_bounds_required() {
        let result = Cli::try_parse_from([
            "basic-cleaning",
            "--input_artifact", "sample.csv:latest",
            "--output_artifact_name", "clean_sample.csv",
            "--output_artifact_type", "clean_sample",
            "--output_artifact_desc", "desc",
            "--min_price", "10",
        ]);
        assert!(result.is_err());
    }
}
