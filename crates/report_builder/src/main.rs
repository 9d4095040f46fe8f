//! Report Builder CLI
//!
//! IBTrACS CSV → best-track archive JSON converter
//! Forecast cube JSON → compressed feature store builder
//! Validation and calibration runs over stored features

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "report_builder")]
#[command(about = "Build validation inputs and run cyclone detection validation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Convert an IBTrACS CSV export into a best-track archive JSON
    Besttrack {
        /// Input IBTrACS CSV file path
        #[arg(long)]
        csv: PathBuf,

        /// Output archive JSON file path
        #[arg(long)]
        out: PathBuf,
    },

    /// Build a compressed feature store from a forecast cube JSON
    Features {
        /// Input forecast cube JSON file path
        #[arg(long)]
        r#in: PathBuf,

        /// Output feature store file path
        #[arg(long)]
        out: PathBuf,

        /// Output metadata JSON file
        #[arg(long)]
        metadata: Option<PathBuf>,
    },

    /// Validate stored features against a best-track archive
    Validate {
        /// Feature store file path
        #[arg(long)]
        features: PathBuf,

        /// Best-track archive JSON path
        #[arg(long)]
        archive: PathBuf,

        /// Validation window start (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        start: String,

        /// Validation window end (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        end: String,

        /// Detection parameter YAML file (canonical defaults when omitted)
        #[arg(long)]
        params: Option<PathBuf>,

        /// Minimum archive points per reference storm
        #[arg(long, default_value_t = tc_core::orchestrator::DEFAULT_MIN_ARCHIVE_POINTS)]
        min_points: usize,

        /// Output prefix for the report files
        #[arg(long, default_value = "validation")]
        out: PathBuf,
    },

    /// Sweep detection parameters against a best-track archive
    Calibrate {
        /// Feature store file path
        #[arg(long)]
        features: PathBuf,

        /// Best-track archive JSON path
        #[arg(long)]
        archive: PathBuf,

        /// Validation window start (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        start: String,

        /// Validation window end (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        end: String,

        /// Base parameter YAML file (canonical defaults when omitted)
        #[arg(long)]
        params: Option<PathBuf>,

        /// Minimum archive points per reference storm
        #[arg(long, default_value_t = tc_core::orchestrator::DEFAULT_MIN_ARCHIVE_POINTS)]
        min_points: usize,

        /// Output JSON file for the sweep results
        #[arg(long, default_value = "calibration_results.json")]
        out: PathBuf,
    },

    /// Generate synthetic fixture files for the other subcommands
    Synthetic {
        /// Output directory for the fixture files
        #[arg(long, default_value = "synthetic_fixtures")]
        out_dir: PathBuf,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Besttrack { csv, out } => {
            println!("Converting IBTrACS CSV to best-track archive...");
            println!("   Input:  {}", csv.display());
            println!("   Output: {}", out.display());

            let stats = report_builder::build_archive(&csv, &out)?;
            print_archive_stats(&stats);
        }

        Commands::Features { r#in, out, metadata } => {
            println!("Building feature store from forecast cube...");
            println!("   Input:  {}", r#in.display());
            println!("   Output: {}", out.display());

            let meta = report_builder::build_feature_store(&r#in, &out)?;
            print_store_metadata(&meta);

            if let Some(metadata_path) = metadata {
                save_metadata(&metadata_path, &meta)?;
            }
        }

        Commands::Validate {
            features,
            archive,
            start,
            end,
            params,
            min_points,
            out,
        } => {
            let window_start = parse_window_time(&start)?;
            let window_end = parse_window_time(&end)?;
            let params = load_params(params.as_deref())?;

            println!("Running validation...");
            println!("   Features: {}", features.display());
            println!("   Archive:  {}", archive.display());
            println!("   Window:   {} to {}", window_start, window_end);

            let cube = tc_core::load_features(&features)?;
            let mut orchestrator =
                tc_core::ValidationOrchestrator::new(&archive, window_start, window_end)
                    .with_min_archive_points(min_points);
            orchestrator.load_references()?;
            let report = orchestrator.run_validation(&cube, &params)?;
            let files = report.write_files(&out)?;

            println!("\n{}", report.render_text());
            println!("\nReport written to:");
            println!("   {}", files.text.display());
            println!("   {}", files.json.display());
        }

        Commands::Calibrate {
            features,
            archive,
            start,
            end,
            params,
            min_points,
            out,
        } => {
            let window_start = parse_window_time(&start)?;
            let window_end = parse_window_time(&end)?;
            let base = load_params(params.as_deref())?;

            println!("Running calibration sweep...");
            println!("   Features: {}", features.display());
            println!("   Archive:  {}", archive.display());
            println!("   Window:   {} to {}", window_start, window_end);

            let cube = tc_core::load_features(&features)?;
            tc_core::orchestrator::ensure_model_provenance(&cube.metadata)?;
            let references =
                tc_core::load_best_tracks(&archive, window_start, window_end, min_points)?;
            println!("   References: {} storms", references.len());

            let plan = tc_core::generate_calibration_plan(&base);
            let outcome = tc_core::run_calibration_sweep(&cube, &references, &base, &plan)?;

            let mut results = outcome.history.clone();
            results.sort_by(|a, b| b.score.total_cmp(&a.score));
            tc_core::calibration::save_calibration_results(&results, &out)?;

            println!("\nSweep finished: {} runs", outcome.history.len());
            println!(
                "   Best score: {:.3} (recall {:.1}%, precision {:.1}%)",
                outcome.best.score,
                outcome.best.metrics.detection.recall * 100.0,
                outcome.best.metrics.detection.precision * 100.0
            );
            println!("   Best parameters:");
            println!("{}", serde_json::to_string_pretty(&outcome.best.params)?);
            println!("\nResults saved to: {}", out.display());
        }

        Commands::Synthetic { out_dir } => {
            println!("Generating drifting-storm fixtures...");
            std::fs::create_dir_all(&out_dir)?;

            let scenario = tc_core::drifting_storm_scenario()?;

            let cube_path = out_dir.join("cube.json");
            let cube_file = tc_core::ForecastCubeFile::from_cube(&scenario.cube);
            std::fs::write(&cube_path, serde_json::to_string_pretty(&cube_file)?)?;

            let archive_path = out_dir.join("archive.json");
            std::fs::write(
                &archive_path,
                serde_json::to_string_pretty(&scenario.archive)?,
            )?;

            let store_path = out_dir.join("features.tcf");
            let features = tc_core::extract_features(&scenario.cube)?;
            tc_core::save_features(&store_path, &features)?;

            println!("\nFixtures written:");
            println!("   Cube JSON:     {}", cube_path.display());
            println!("   Archive JSON:  {}", archive_path.display());
            println!("   Feature store: {}", store_path.display());
            println!(
                "   Window:        {} to {}",
                scenario.window_start, scenario.window_end
            );
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_archive_stats(stats: &report_builder::ArchiveStats) {
    println!("\nArchive built.");
    println!("   Rows read:    {}", stats.total_rows);
    println!("   Points kept:  {}", stats.parsed);
    println!("   Rows skipped: {}", stats.skipped);
    println!("   Storms:       {}", stats.storms);
}

#[cfg(feature = "cli")]
fn print_store_metadata(meta: &report_builder::StoreMetadata) {
    println!("\nFeature store built.");
    println!("   Model:       {}", meta.model);
    println!(
        "   Shape:       {} x {} x {} (time x lat x lon)",
        meta.shape[0], meta.shape[1], meta.shape[2]
    );
    println!(
        "   Input size:  {} bytes ({:.2} KB)",
        meta.original_size,
        meta.original_size as f64 / 1024.0
    );
    println!(
        "   Stored size: {} bytes ({:.2} KB)",
        meta.stored_size,
        meta.stored_size as f64 / 1024.0
    );
    println!("   Compression: {:.1}%", meta.compression_ratio * 100.0);
    println!("   Created:     {}", meta.created_at);
}

#[cfg(feature = "cli")]
fn save_metadata(path: &PathBuf, meta: &report_builder::StoreMetadata) -> Result<()> {
    let metadata_json = serde_json::to_string_pretty(meta)?;
    std::fs::write(path, metadata_json)?;
    println!("\nMetadata saved to: {}", path.display());
    Ok(())
}

#[cfg(feature = "cli")]
fn load_params(path: Option<&std::path::Path>) -> Result<tc_core::CalibrationParams> {
    match path {
        Some(p) => tc_core::CalibrationParams::from_yaml_file(p)
            .with_context(|| format!("failed to load parameters from {}", p.display())),
        None => Ok(tc_core::CalibrationParams::default()),
    }
}

/// Accepts a bare date (taken as midnight UTC) or a full RFC 3339 timestamp.
#[cfg(feature = "cli")]
fn parse_window_time(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("invalid time '{raw}', expected YYYY-MM-DD or RFC 3339"))?;
    Ok(date.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("report_builder CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
