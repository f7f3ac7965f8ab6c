//! Report output - console summary and JSON persistence

use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use std::path::{Path, PathBuf};
use tracing::{error, info};

use paasport_common::{Report, Result};

/// Print the human-readable phase summary
pub fn print_summary(report: &Report) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Phase", "Result", "Duration", "Error"]);
    for phase in &report.phases {
        table.add_row(vec![
            phase.phase.to_string(),
            if phase.success { "PASS" } else { "FAIL" }.to_string(),
            format!("{} ms", phase.duration_ms),
            phase.error.clone().unwrap_or_default(),
        ]);
    }

    println!("{table}");

    for phase in &report.phases {
        if phase.success {
            info!("✓ {} ({} ms)", phase.phase, phase.duration_ms);
        } else {
            error!(
                "✗ {} - {}",
                phase.phase,
                phase.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if report.overall_success {
        info!("Integration run passed ({} phase(s))", report.phases.len());
    } else {
        error!(
            "Integration run failed ({}/{} phase(s) passed)",
            report.phases.iter().filter(|p| p.success).count(),
            report.phases.len()
        );
    }
}

/// Serialize the full structured report to a JSON file
pub fn write_report(report: &Report, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;

    info!("Report written to {}", path.display());
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use paasport_common::{Phase, PhaseResult};
    use std::time::Duration;

    #[test]
    fn written_report_parses_back_identically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("integration-report.json");

        let mut report = Report::new("0.1.0");
        report.record(PhaseResult::failed(
            Phase::ApiIntegration,
            Duration::from_millis(7),
            "GET /health returned 500",
        ));
        report.finalize();

        write_report(&report, &path).unwrap();

        let parsed: Report =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
