//! # CSV Export
//!
//! One row per selected test of every room, read from a [`ReportSummary`].
//! Unselected tests are left out; a selected test without data is written
//! with an empty result column.

use std::io::Write;

use csv::Writer;
use serde::Serialize;

use crate::compliance::summary::ReportSummary;
use crate::errors::{HvacError, HvacResult};

#[derive(Debug, Serialize)]
struct TestRow<'a> {
    #[serde(rename = "Rapor No")]
    report_number: &'a str,
    #[serde(rename = "Mahal No")]
    room_number: &'a str,
    #[serde(rename = "Mahal Adı")]
    room_name: &'a str,
    #[serde(rename = "Hacim (m³)")]
    volume: f64,
    #[serde(rename = "Test")]
    test_name: &'a str,
    #[serde(rename = "Tekrar")]
    instance_count: usize,
    #[serde(rename = "Ölçülen Değer")]
    display_value: &'a str,
    #[serde(rename = "Kriter")]
    criteria: &'a str,
    #[serde(rename = "Sonuç")]
    result: &'a str,
    #[serde(rename = "Mahal Sonucu")]
    room_result: &'a str,
}

fn csv_error(e: csv::Error) -> HvacError {
    HvacError::SerializationError {
        reason: format!("CSV: {}", e),
    }
}

/// Write the summary as CSV to any writer.
pub fn write_summary_csv<W: Write>(summary: &ReportSummary, out: W) -> HvacResult<()> {
    let mut writer = Writer::from_writer(out);
    for room in &summary.rooms {
        for test in room.selected_tests() {
            writer
                .serialize(TestRow {
                    report_number: &summary.report_number,
                    room_number: &room.room_number,
                    room_name: &room.room_name,
                    volume: room.volume,
                    test_name: &test.test_name,
                    instance_count: test.instance_count,
                    display_value: &test.display_value,
                    criteria: &test.criteria_text,
                    result: test.verdict_text(),
                    room_result: &room.verdict_label,
                })
                .map_err(csv_error)?;
        }
    }
    writer.flush().map_err(|e| HvacError::SerializationError {
        reason: format!("CSV: {}", e),
    })
}

/// CSV as a string
pub fn summary_csv_string(summary: &ReportSummary) -> HvacResult<String> {
    let mut buffer = Vec::new();
    write_summary_csv(summary, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| HvacError::Internal {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}
