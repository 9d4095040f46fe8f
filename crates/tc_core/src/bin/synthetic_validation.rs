use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use tc_core::orchestrator::DEFAULT_MIN_ARCHIVE_POINTS;
use tc_core::{
    archive_summary, detect_cyclones, detection_summary, drifting_storm_scenario,
    extract_features, feature_info, load_best_tracks, load_features, quiet_scenario,
    run_complete_validation, save_features, Assessment, CalibrationParams,
};

fn main() -> Result<()> {
    println!("Running synthetic validation scenarios...");

    let out_dir = Path::new("validation_output");
    fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    // Scenario 1: one drifting storm, expected to be detected and matched.
    println!("\nScenario 1: drifting storm");
    let scenario = drifting_storm_scenario()?;
    let features = extract_features(&scenario.cube)?;
    let info = feature_info(&features);
    println!(
        "extracted {} diagnostic fields over {:?}",
        info.num_features, info.shape
    );

    let store_path = out_dir.join("features.tcf");
    save_features(&store_path, &features)?;
    let restored = load_features(&store_path)?;
    if restored.expected_shape() != features.expected_shape() {
        bail!("feature store round trip changed the cube shape");
    }
    println!(
        "feature store round trip ok ({} bytes on disk)",
        fs::metadata(&store_path)?.len()
    );

    let archive_path = out_dir.join("archive.json");
    fs::write(
        &archive_path,
        serde_json::to_string_pretty(&scenario.archive)?,
    )?;
    let references = load_best_tracks(
        &archive_path,
        scenario.window_start,
        scenario.window_end,
        DEFAULT_MIN_ARCHIVE_POINTS,
    )?;
    let summary = archive_summary(&references);
    println!(
        "archive: {} storm(s), mean lifetime {:.0} h",
        summary.num_storms, summary.lifetime_hours.mean
    );

    let completed = run_complete_validation(
        &features,
        &archive_path,
        scenario.window_start,
        scenario.window_end,
        None,
        &out_dir.join("drifting"),
    )?;
    let report = &completed.report;
    println!(
        "detected {} cyclone(s), {} hit(s), assessment {}",
        report.detected_cyclones,
        report.metrics.detection.hits,
        report
            .metrics
            .performance_assessment
            .overall_assessment
            .label()
    );
    if report.metrics.detection.hits != 1 {
        bail!("expected 1 hit, got {}", report.metrics.detection.hits);
    }
    if report.metrics.performance_assessment.overall_assessment != Assessment::Good {
        bail!("drifting storm scenario should assess GOOD");
    }
    println!("report written to {}", completed.files.text.display());

    // Scenario 2: quiet atmosphere, nothing should be detected.
    println!("\nScenario 2: quiet atmosphere");
    let scenario = quiet_scenario()?;
    let features = extract_features(&scenario.cube)?;
    let cyclones = detect_cyclones(&features, &CalibrationParams::default())?;
    let summary = detection_summary(&cyclones);
    if summary.total_cyclones != 0 {
        bail!("quiet scenario detected {} cyclones", summary.total_cyclones);
    }
    println!("no detections, as expected");

    println!("\nAll scenarios passed.");
    Ok(())
}
