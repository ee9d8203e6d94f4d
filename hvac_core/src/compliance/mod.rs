//! # Compliance Engine
//!
//! The single source of truth for every compliance decision. Everything
//! else (room mutation helpers, CSV/PDF export, the CLI) calls into this
//! module instead of comparing raw fields itself.
//!
//! ## Pipeline
//!
//! ```text
//! MeasurementRecord ──► conversions ──► criteria / iso ──► aggregate (room ► report)
//!                                               └────────► summary
//! ```
//!
//! - [`conversions`] - room volume, flow rate, air change rate, sampling points
//! - [`criteria`] - fixed thresholds and per-test predicates
//! - [`iso`] - ISO 14644-1 class from the 0.5 µm particle count
//! - [`aggregate`] - room verdict and overall report outcome
//! - [`summary`] - per-room, per-test breakdown consumed by documents
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::compliance::evaluate_room;
//! use hvac_core::measurements::{MeasurementRecord, PressureDifference, TestKey};
//! use hvac_core::room::Room;
//! use hvac_core::units::{Meters, SquareMeters};
//!
//! let mut room = Room::new("101", "Ameliyathane 1", SquareMeters(14.0), Meters(3.0));
//! room.select_test(TestKey::PressureDifference);
//! room.set_record(MeasurementRecord::PressureDifference(PressureDifference {
//!     pressure: Some(7.0),
//!     ..Default::default()
//! }))?;
//!
//! let evaluation = evaluate_room(&room);
//! assert!(evaluation.compliant);
//! assert_eq!(evaluation.verdict_label(), "UYGUNDUR");
//! # Ok::<(), hvac_core::errors::HvacError>(())
//! ```

pub mod aggregate;
pub mod conversions;
pub mod criteria;
pub mod iso;
pub mod summary;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use aggregate::{
    evaluate_report, evaluate_room, evaluate_test, ReportEvaluation, ReportOutcome,
    RoomEvaluation, TestContribution,
};
pub use criteria::EvaluationContext;
pub use iso::IsoClass;
pub use summary::{summarize_report, summarize_room, ReportSummary, RoomSummary, TestSummary};

/// Label printed for a compliant test, room or report
pub const COMPLIANT_LABEL: &str = "UYGUNDUR";

/// Label printed for a non-compliant test, room or report
pub const NON_COMPLIANT_LABEL: &str = "UYGUN DEĞİL";

/// Outcome of an evaluated rule. "Not evaluated" is `Option::<Verdict>::None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn is_pass(self) -> bool {
        self == Verdict::Pass
    }

    pub fn label(self) -> &'static str {
        verdict_label(self.is_pass())
    }
}

impl From<bool> for Verdict {
    fn from(passes: bool) -> Self {
        if passes {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// "UYGUNDUR" / "UYGUN DEĞİL"
pub fn verdict_label(compliant: bool) -> &'static str {
    if compliant {
        COMPLIANT_LABEL
    } else {
        NON_COMPLIANT_LABEL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_labels() {
        assert_eq!(Verdict::Pass.label(), "UYGUNDUR");
        assert_eq!(Verdict::Fail.to_string(), "UYGUN DEĞİL");
        assert_eq!(Verdict::from(true), Verdict::Pass);
    }

    #[test]
    fn test_verdict_serialization() {
        assert_eq!(serde_json::to_string(&Verdict::Fail).unwrap(), "\"fail\"");
        let none: Option<Verdict> = None;
        assert_eq!(serde_json::to_string(&none).unwrap(), "null");
    }
}
