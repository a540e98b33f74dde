//! `ExportReport(report, name, format)` (§4.6, §6): text, JSON or CSV into a
//! configured output directory, created if absent.
//!
//! Grounded on the teacher's `IndustryReportingEngine`
//! (`crates/testing/src/reporting/mod.rs`) for the "create the output
//! directory, then write one file per format" shape, trimmed of its HTML
//! dashboard and analytics-engine extras, since this spec only names the
//! three formats in §6.

use crate::error::VerifierResult;
use crate::verifier::ComprehensiveVerificationReport;
use pis_core::ExportFormat;
use std::path::{Path, PathBuf};

const CSV_HEADER: &str = "Position,Requested_Samples,Actual_Samples,Total_Time_ms,Samples_Per_Second,Neural_Net_Evaluations,Cached_Evaluations,Heuristic_Evaluations,Is_Valid,Warnings_Count,Errors_Count";

/// Writes `report` as `name.<ext>` under `output_dir`, creating the
/// directory if it does not exist yet.
pub async fn export_report(
    report: &ComprehensiveVerificationReport,
    name: &str,
    format: ExportFormat,
    output_dir: &Path,
) -> VerifierResult<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;
    let (ext, content) = match format {
        ExportFormat::Json => ("json", render_json(report)?),
        ExportFormat::Csv => ("csv", render_csv(report)),
        ExportFormat::Text => ("txt", render_text(report)),
        ExportFormat::None => ("txt", render_text(report)),
    };
    let path = output_dir.join(format!("{name}.{ext}"));
    tokio::fs::write(&path, content).await?;
    Ok(path)
}

fn render_json(report: &ComprehensiveVerificationReport) -> VerifierResult<String> {
    let summary = serde_json::json!({
        "total_scenarios": report.total_scenarios,
        "passed": report.passed,
        "failed": report.failed,
        "warnings_count": report.warnings_count,
        "errors_count": report.errors_count,
        "throughput_min": report.throughput_min,
        "throughput_avg": report.throughput_avg,
        "throughput_max": report.throughput_max,
        "neural_net_scenarios": report.neural_net_scenarios,
        "heuristic_scenarios": report.heuristic_scenarios,
        "overall_success": report.overall_success,
        "generated_at": report.generated_at,
    });
    let document = serde_json::json!({
        "summary": summary,
        "individual_results": report.individual_results,
    });
    Ok(serde_json::to_string_pretty(&document)?)
}

fn render_csv(report: &ComprehensiveVerificationReport) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for r in &report.individual_results {
        out.push_str(&format!(
            "{},{},{},{:.3},{:.3},{},{},{},{},{},{}\n",
            csv_escape(&r.position_fen),
            r.requested_samples,
            r.actual_samples,
            r.total_time_ms,
            r.samples_per_second,
            r.neural_net_evaluations,
            r.cached_evaluations,
            r.heuristic_evaluations,
            r.is_valid(),
            r.warnings.len(),
            r.errors.len(),
        ));
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn render_text(report: &ComprehensiveVerificationReport) -> String {
    let mut out = report.summary_text();
    out.push_str("\n\n");
    for r in &report.individual_results {
        out.push_str(&format!(
            "--- {} ---\n\
             position: {}\n\
             requested/actual samples: {}/{}\n\
             total_time_ms: {:.3}, samples_per_second: {:.3}\n\
             neural_net/cached/heuristic: {}/{}/{}\n\
             selected_move: {}\n\
             valid: {}\n\
             warnings: {:?}\n\
             errors: {:?}\n\n",
            r.scenario,
            r.position_fen,
            r.requested_samples,
            r.actual_samples,
            r.total_time_ms,
            r.samples_per_second,
            r.neural_net_evaluations,
            r.cached_evaluations,
            r.heuristic_evaluations,
            r.selected_move.as_deref().unwrap_or("<none>"),
            r.is_valid(),
            r.warnings,
            r.errors,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verifier::Verifier;

    #[tokio::test]
    async fn export_json_and_csv_round_trip_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = Verifier::new();
        let report = verifier.run_standard_test_suite();

        let json_path = export_report(&report, "standard", ExportFormat::Json, dir.path())
            .await
            .unwrap();
        let json_contents = tokio::fs::read_to_string(&json_path).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json_contents).unwrap();
        assert!(parsed["summary"]["overall_success"].is_boolean());

        let csv_path = export_report(&report, "standard", ExportFormat::Csv, dir.path())
            .await
            .unwrap();
        let csv_contents = tokio::fs::read_to_string(&csv_path).await.unwrap();
        assert!(csv_contents.starts_with(CSV_HEADER));
        assert_eq!(
            csv_contents.lines().count(),
            report.individual_results.len() + 1
        );
    }

    #[tokio::test]
    async fn export_text_contains_the_summary_line() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = Verifier::new();
        let report = verifier.run_edge_case_test_suite();
        let path = export_report(&report, "edge-case", ExportFormat::Text, dir.path())
            .await
            .unwrap();
        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(contents.contains("PIS verification report"));
    }
}
