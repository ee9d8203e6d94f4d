//! # Room and Report Aggregation
//!
//! A room is compliant when it has at least one selected test and every
//! selected test passes. A selected test without a usable measurement fails
//! the room. When a test type has repeated instances, every instance must be
//! measured and pass.
//!
//! A report is the conjunction of its rooms; a report without rooms has no
//! verdict at all ([`ReportOutcome::NoData`]).

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::compliance::criteria::{airflow_total, validate_air_change_rate};
use crate::compliance::{verdict_label, Verdict};
use crate::measurements::TestKey;
use crate::room::Room;

/// Assessment sentence for a compliant system
pub const REPORT_COMPLIANT: &str = "Sistem, referans standartlara UYGUNDUR.";

/// Assessment sentence for a non-compliant system
pub const REPORT_NON_COMPLIANT: &str = "Sistem, referans standartlara UYGUN DEĞİL.";

/// Assessment text when there is nothing to evaluate
pub const REPORT_NO_DATA: &str = "Veri bulunamadı";

/// One selected test's share of the room verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestContribution {
    pub key: TestKey,
    /// `None` when nothing usable was measured
    pub verdict: Option<Verdict>,
}

impl TestContribution {
    /// Unmeasured contributions count as failures.
    pub fn passes(&self) -> bool {
        self.verdict == Some(Verdict::Pass)
    }
}

/// Verdict of a single room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomEvaluation {
    pub room_id: String,
    pub room_number: String,
    pub room_name: String,
    pub compliant: bool,
    pub contributions: Vec<TestContribution>,
}

impl RoomEvaluation {
    pub fn verdict_label(&self) -> &'static str {
        verdict_label(self.compliant)
    }

    /// Selected tests that kept the room from passing
    pub fn failing_tests(&self) -> Vec<TestKey> {
        self.contributions
            .iter()
            .filter(|c| !c.passes())
            .map(|c| c.key)
            .collect()
    }
}

/// Overall report result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReportOutcome {
    Compliant,
    NonCompliant,
    NoData,
}

impl ReportOutcome {
    pub fn assessment(self) -> &'static str {
        match self {
            ReportOutcome::Compliant => REPORT_COMPLIANT,
            ReportOutcome::NonCompliant => REPORT_NON_COMPLIANT,
            ReportOutcome::NoData => REPORT_NO_DATA,
        }
    }
}

/// Verdicts of every room plus the overall outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEvaluation {
    pub outcome: ReportOutcome,
    pub rooms: Vec<RoomEvaluation>,
}

impl ReportEvaluation {
    /// False for both a failed and an empty report.
    pub fn is_compliant(&self) -> bool {
        self.outcome == ReportOutcome::Compliant
    }

    pub fn assessment(&self) -> &'static str {
        self.outcome.assessment()
    }
}

/// Verdict for one test type of a room, across all of its instances.
///
/// `None` when no record of this type has a usable measurement. Once any
/// instance is measured, an unmeasured sibling makes the test fail. Airflow
/// instances are supply filters of one room: their flows are summed and the
/// air change rate of the total decides.
pub fn evaluate_test(room: &Room, key: TestKey) -> Option<Verdict> {
    let ctx = room.evaluation_context();
    let records = room.records_for(key);
    let verdicts: Vec<Option<Verdict>> = records.iter().map(|record| record.evaluate(&ctx)).collect();

    if verdicts.iter().all(Option::is_none) {
        return None;
    }
    if verdicts.iter().any(Option::is_none) {
        return Some(Verdict::Fail);
    }
    if key == TestKey::AirflowData {
        return airflow_total(&records, &ctx)
            .map(|total| Verdict::from(validate_air_change_rate(total.air_change_rate.0)));
    }
    Some(Verdict::from(
        verdicts.iter().all(|v| *v == Some(Verdict::Pass)),
    ))
}

/// Room verdict over exactly the selected tests.
pub fn evaluate_room(room: &Room) -> RoomEvaluation {
    let contributions: Vec<TestContribution> = room
        .selected_tests()
        .iter()
        .map(|&key| TestContribution {
            key,
            verdict: evaluate_test(room, key),
        })
        .collect();

    let compliant = !contributions.is_empty() && contributions.iter().all(TestContribution::passes);

    debug!(
        room = %room.room_number,
        selected = contributions.len(),
        compliant,
        "room evaluated"
    );

    RoomEvaluation {
        room_id: room.id.clone(),
        room_number: room.room_number.clone(),
        room_name: room.room_name.clone(),
        compliant,
        contributions,
    }
}

/// Overall outcome across all rooms.
pub fn evaluate_report(rooms: &[Room]) -> ReportEvaluation {
    let rooms: Vec<RoomEvaluation> = rooms.iter().map(evaluate_room).collect();

    let outcome = if rooms.is_empty() {
        ReportOutcome::NoData
    } else if rooms.iter().all(|r| r.compliant) {
        ReportOutcome::Compliant
    } else {
        ReportOutcome::NonCompliant
    };

    debug!(rooms = rooms.len(), ?outcome, "report evaluated");

    ReportEvaluation { outcome, rooms }
}
