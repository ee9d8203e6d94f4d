//! # Summary Builder
//!
//! Display-ready breakdown of every room and all eight test types, selected
//! or not. Document generators read this structure and never look at raw
//! measurement fields.
//!
//! ## JSON Example
//!
//! ```json
//! {
//!   "key": "pressureDifference",
//!   "testName": "Basınç Farkı",
//!   "isSelected": true,
//!   "hasData": true,
//!   "verdict": "pass",
//!   "displayValue": "7.0 Pa",
//!   "criteriaText": "≥ 6 Pa",
//!   "instanceCount": 1
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::compliance::aggregate::{evaluate_report, evaluate_room, evaluate_test, ReportOutcome};
use crate::compliance::conversions::sampling_point_count;
use crate::compliance::criteria::{airflow_total, criteria_text};
use crate::compliance::{verdict_label, Verdict};
use crate::measurements::TestKey;
use crate::report::Report;
use crate::room::Room;

/// One test type of one room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    pub key: TestKey,
    pub test_name: String,
    pub is_selected: bool,
    pub has_data: bool,
    /// `None` exactly when `has_data` is false
    pub verdict: Option<Verdict>,
    pub display_value: String,
    pub criteria_text: String,
    pub instance_count: usize,
}

impl TestSummary {
    /// Verdict label, or an empty string when not evaluated
    pub fn verdict_text(&self) -> &'static str {
        self.verdict.map(Verdict::label).unwrap_or("")
    }
}

/// All tests of one room plus the room verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: String,
    pub room_number: String,
    pub room_name: String,
    pub surface_area: f64,
    pub height: f64,
    pub volume: f64,
    /// ISO 14644-1 minimum sampling locations for the floor area
    pub sampling_points: u32,
    pub compliant: bool,
    pub verdict_label: String,
    pub tests: Vec<TestSummary>,
}

impl RoomSummary {
    pub fn selected_tests(&self) -> impl Iterator<Item = &TestSummary> {
        self.tests.iter().filter(|t| t.is_selected)
    }
}

/// Whole-report breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub report_id: String,
    pub report_number: String,
    pub outcome: ReportOutcome,
    pub assessment: String,
    pub rooms: Vec<RoomSummary>,
}

fn summarize_test(room: &Room, key: TestKey) -> TestSummary {
    let is_selected = room.is_selected(key);
    let records = if is_selected { room.records_for(key) } else { Vec::new() };
    let ctx = room.evaluation_context();

    let verdict = if is_selected { evaluate_test(room, key) } else { None };

    let per_record = records
        .iter()
        .map(|record| record.display_value(&ctx))
        .filter(|value| !value.is_empty())
        .collect::<Vec<_>>()
        .join(" / ");
    let display_value = match airflow_total(&records, &ctx) {
        Some(total) if records.len() > 1 => format!("{} ({})", total.display(), per_record),
        _ => per_record,
    };

    // the threshold that decided the verdict, not the form text
    let criteria = criteria_text(key);

    TestSummary {
        key,
        test_name: key.display_name().to_string(),
        is_selected,
        has_data: verdict.is_some(),
        verdict,
        display_value,
        criteria_text: criteria.to_string(),
        instance_count: room.test_count(key),
    }
}

/// Breakdown of one room over all eight test types.
pub fn summarize_room(room: &Room) -> RoomSummary {
    let evaluation = evaluate_room(room);
    RoomSummary {
        room_id: room.id.clone(),
        room_number: room.room_number.clone(),
        room_name: room.room_name.clone(),
        surface_area: room.surface_area().0,
        height: room.height().0,
        volume: room.volume().0,
        sampling_points: sampling_point_count(room.surface_area()),
        compliant: evaluation.compliant,
        verdict_label: verdict_label(evaluation.compliant).to_string(),
        tests: TestKey::ALL
            .into_iter()
            .map(|key| summarize_test(room, key))
            .collect(),
    }
}

/// Breakdown of every room plus the overall assessment.
pub fn summarize_report(report: &Report) -> ReportSummary {
    let evaluation = evaluate_report(&report.rooms);
    ReportSummary {
        report_id: report.id.clone(),
        report_number: report.report_number.clone(),
        outcome: evaluation.outcome,
        assessment: evaluation.assessment().to_string(),
        rooms: report.rooms.iter().map(summarize_room).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurements::{
        AirflowData, HepaLeakage, MeasurementRecord, ParticleCount, PressureDifference,
    };
    use crate::units::{Meters, SquareMeters};

    fn sample_room() -> Room {
        let mut room = Room::new("101", "Ameliyathane", SquareMeters(14.0), Meters(3.0));
        room.select_test(TestKey::PressureDifference);
        room.select_test(TestKey::ParticleCount);
        room.set_record(MeasurementRecord::PressureDifference(PressureDifference {
            pressure: Some(7.0),
            ..Default::default()
        }))
        .unwrap();
        room
    }

    #[test]
    fn test_summary_covers_all_types() {
        let summary = summarize_room(&sample_room());
        assert_eq!(summary.tests.len(), 8);
        let keys: Vec<TestKey> = summary.tests.iter().map(|t| t.key).collect();
        assert_eq!(keys, TestKey::ALL.to_vec());
        assert_eq!(summary.selected_tests().count(), 2);
        assert_eq!(summary.volume, 42.0);
        assert_eq!(summary.sampling_points, 12);
    }

    #[test]
    fn test_verdict_null_iff_no_data() {
        let summary = summarize_room(&sample_room());
        for test in &summary.tests {
            assert_eq!(test.verdict.is_none(), !test.has_data, "{}", test.key);
        }

        let pressure = &summary.tests[1];
        assert_eq!(pressure.key, TestKey::PressureDifference);
        assert_eq!(pressure.verdict, Some(Verdict::Pass));
        assert_eq!(pressure.display_value, "7.0 Pa");
        assert_eq!(pressure.criteria_text, "≥ 6 Pa");

        let particles = &summary.tests[4];
        assert!(particles.is_selected);
        assert!(!particles.has_data);
        assert_eq!(particles.verdict_text(), "");

        // selected-but-unmeasured fails the room
        assert!(!summary.compliant);
        assert_eq!(summary.verdict_label, "UYGUN DEĞİL");
    }

    #[test]
    fn test_summary_is_idempotent() {
        let mut room = sample_room();
        room.set_record(MeasurementRecord::ParticleCount(ParticleCount {
            particle05: Some(3_000.0),
            ..Default::default()
        }))
        .unwrap();
        let first = summarize_room(&room);
        let second = summarize_room(&room);
        assert_eq!(first, second);
        assert!(first.compliant);
    }

    #[test]
    fn test_criteria_text_is_the_applied_threshold() {
        let mut room = Room::new("101", "Ameliyathane", SquareMeters(14.0), Meters(3.0));
        room.select_test(TestKey::HepaLeakage);
        room.set_record(MeasurementRecord::HepaLeakage(HepaLeakage {
            criteria: Some("≤ %0,5".to_string()),
            max_leakage: Some(0.5),
            actual_leakage: Some(0.02),
            ..Default::default()
        }))
        .unwrap();

        let hepa = &summarize_room(&room).tests[3];
        assert_eq!(hepa.key, TestKey::HepaLeakage);
        assert_eq!(hepa.verdict, Some(Verdict::Fail));
        assert_eq!(hepa.criteria_text, "Sızıntı ≤ %0,01");
    }

    #[test]
    fn test_airflow_instances_show_total() {
        let mut room = Room::new("101", "Ameliyathane", SquareMeters(14.0), Meters(3.0));
        room.set_test_count(TestKey::AirflowData, 2);
        for index in 0..2 {
            room.update_instance(
                TestKey::AirflowData,
                index,
                MeasurementRecord::AirflowData(AirflowData {
                    flow_rate: Some(500.0),
                    ..Default::default()
                }),
            )
            .unwrap();
        }

        let airflow = &summarize_room(&room).tests[0];
        assert_eq!(airflow.verdict, Some(Verdict::Pass));
        assert_eq!(
            airflow.display_value,
            "Toplam 1000.00 m³/h, 23.81 ACH (500.00 m³/h, 11.90 ACH / 500.00 m³/h, 11.90 ACH)"
        );
    }

    #[test]
    fn test_summary_json_shape() {
        let summary = summarize_room(&sample_room());
        let json = serde_json::to_value(&summary.tests[1]).unwrap();
        assert_eq!(json["testName"], "Basınç Farkı");
        assert_eq!(json["isSelected"], true);
        assert_eq!(json["verdict"], "pass");

        let unselected = serde_json::to_value(&summary.tests[0]).unwrap();
        assert!(unselected["verdict"].is_null());
    }

    #[test]
    fn test_report_summary() {
        let mut report = Report::new("RPR-001", "Şehir Hastanesi");
        report.add_room(sample_room());
        let summary = summarize_report(&report);
        assert_eq!(summary.outcome, ReportOutcome::NonCompliant);
        assert_eq!(summary.assessment, "Sistem, referans standartlara UYGUN DEĞİL.");
        assert_eq!(summary.rooms.len(), 1);
    }
}
