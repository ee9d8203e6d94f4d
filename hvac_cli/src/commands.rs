use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hvac_core::export::write_summary_csv;
use hvac_core::pdf::render_report_pdf;
use hvac_core::store::{parse_reports, ReportStore};
use tracing::info;

use crate::output;

pub fn list(store: &impl ReportStore, json: bool) -> Result<()> {
    let reports = store.load_all().context("failed to load reports")?;
    if json {
        let rows: Vec<serde_json::Value> = reports
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "reportNumber": r.report_number,
                    "customerName": r.customer_name,
                    "rooms": r.rooms.len(),
                    "outcome": r.evaluate().outcome,
                })
            })
            .collect();
        return output::print_json(&rows);
    }
    output::print_report_list(&reports);
    Ok(())
}

pub fn evaluate(store: &impl ReportStore, id: &str, json: bool) -> Result<()> {
    let report = store
        .get(id)
        .with_context(|| format!("failed to load report '{id}'"))?;
    let evaluation = report.evaluate();
    if json {
        return output::print_json(&evaluation);
    }
    output::print_evaluation(&report, &evaluation);
    Ok(())
}

pub fn summary(store: &impl ReportStore, id: &str, json: bool) -> Result<()> {
    let report = store
        .get(id)
        .with_context(|| format!("failed to load report '{id}'"))?;
    let summary = report.summary();
    if json {
        return output::print_json(&summary);
    }
    output::print_summary(&summary);
    Ok(())
}

pub fn csv(store: &impl ReportStore, id: &str, out: Option<PathBuf>) -> Result<()> {
    let report = store
        .get(id)
        .with_context(|| format!("failed to load report '{id}'"))?;
    let summary = report.summary();
    match out {
        Some(path) => {
            let file = fs::File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            write_summary_csv(&summary, file).context("failed to write CSV")?;
            info!(path = %path.display(), "csv written");
            println!("[OK] {}", path.display());
        }
        None => write_summary_csv(&summary, io::stdout().lock()).context("failed to write CSV")?,
    }
    Ok(())
}

pub fn pdf(store: &impl ReportStore, id: &str, out: &Path) -> Result<()> {
    let report = store
        .get(id)
        .with_context(|| format!("failed to load report '{id}'"))?;
    let bytes = render_report_pdf(&report)
        .with_context(|| format!("failed to render report '{}'", report.report_number))?;
    fs::write(out, &bytes).with_context(|| format!("failed to write {}", out.display()))?;
    info!(path = %out.display(), bytes = bytes.len(), "pdf written");
    println!("[OK] {}", out.display());
    Ok(())
}

pub fn import(store: &mut impl ReportStore, file: &Path) -> Result<()> {
    let contents =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let reports = parse_reports(&contents)
        .with_context(|| format!("{} does not contain valid reports", file.display()))?;
    let count = reports.len();
    for report in reports {
        let number = report.report_number.clone();
        store
            .upsert(report)
            .with_context(|| format!("failed to store report '{number}'"))?;
    }
    println!("[OK] imported {count} report(s)");
    Ok(())
}
