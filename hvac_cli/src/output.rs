use anyhow::Result;
use hvac_core::compliance::{ReportEvaluation, ReportSummary};
use hvac_core::Report;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn status(pass: bool) -> &'static str {
    if pass {
        "[OK]  "
    } else {
        "[FAIL]"
    }
}

pub fn print_report_list(reports: &[Report]) {
    if reports.is_empty() {
        println!("No reports stored.");
        return;
    }
    println!("{:<38} {:<16} {:<28} {:>5}  Outcome", "ID", "Report No", "Customer", "Rooms");
    for report in reports {
        println!(
            "{:<38} {:<16} {:<28} {:>5}  {}",
            report.id,
            report.report_number,
            report.customer_name,
            report.rooms.len(),
            report.evaluate().assessment()
        );
    }
}

pub fn print_evaluation(report: &Report, evaluation: &ReportEvaluation) {
    println!("=== {} ({}) ===\n", report.report_number, report.customer_name);
    for room in &evaluation.rooms {
        println!(
            "  {} {} {}: {}",
            status(room.compliant),
            room.room_number,
            room.room_name,
            room.verdict_label()
        );
        for key in room.failing_tests() {
            println!("         - {}", key.display_name());
        }
    }
    println!("\n  {}", evaluation.assessment());
}

pub fn print_summary(summary: &ReportSummary) {
    println!("=== {} ===", summary.report_number);
    for room in &summary.rooms {
        println!(
            "\n--- {} {} ({:.2} m³): {} ---",
            room.room_number, room.room_name, room.volume, room.verdict_label
        );
        for test in &room.tests {
            let marker = if test.is_selected { "x" } else { " " };
            let result = match test.verdict {
                Some(_) => test.verdict_text(),
                None if test.is_selected => "veri yok",
                None => "",
            };
            println!(
                "  [{}] {:<36} {:<32} {:<20} {}",
                marker, test.test_name, test.display_value, test.criteria_text, result
            );
        }
    }
    println!("\n{}", summary.assessment);
}
