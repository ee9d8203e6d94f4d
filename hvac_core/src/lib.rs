//! # hvac_core - Cleanroom HVAC Qualification Engine
//!
//! `hvac_core` decides whether hospital cleanrooms pass their HVAC performance
//! tests (air change rate, pressure cascade, HEPA integrity, particle class,
//! recovery, climate, noise) and whether a whole report is compliant. All
//! inputs and outputs are JSON-serializable.
//!
//! ## Design Philosophy
//!
//! - **One rule set**: every verdict comes from [`compliance`]
//! - **Tri-state verdicts**: "not measured" is never silently "failed" or "passed"
//! - **JSON-First**: reports round-trip through the `hvac-reports` layout
//! - **Rich Errors**: structured error types, not just strings
//!
//! ## Quick Start
//!
//! ```rust
//! use hvac_core::measurements::{MeasurementRecord, PressureDifference, TestKey};
//! use hvac_core::report::Report;
//! use hvac_core::room::Room;
//! use hvac_core::units::{Meters, SquareMeters};
//!
//! let mut room = Room::new("101", "Ameliyathane 1", SquareMeters(36.0), Meters(3.0));
//! room.select_test(TestKey::PressureDifference);
//! room.set_record(MeasurementRecord::PressureDifference(PressureDifference {
//!     pressure: Some(12.0),
//!     ..Default::default()
//! }))?;
//!
//! let mut report = Report::new("RPR-001", "Şehir Hastanesi");
//! report.add_room(room);
//! assert!(report.evaluate().is_compliant());
//! # Ok::<(), hvac_core::errors::HvacError>(())
//! ```
//!
//! ## Modules
//!
//! - [`compliance`] - validators, ISO classifier, room/report aggregation, summaries
//! - [`measurements`] - test keys and per-test measurement records
//! - [`room`] - rooms, test selection and repeated test instances
//! - [`report`] - report records and calibration checks
//! - [`devices`] - measuring device calibration records
//! - [`store`] - report persistence with atomic saves and locking
//! - [`export`] - CSV export of report summaries
//! - [`pdf`] - Typst PDF reports
//! - [`units`] - type-safe unit wrappers
//! - [`errors`] - structured error types

pub mod compliance;
pub mod devices;
pub mod errors;
pub mod export;
pub mod measurements;
pub mod pdf;
pub mod report;
pub mod room;
pub mod store;
pub mod units;

// Re-export commonly used types at crate root for convenience
pub use compliance::{ReportOutcome, ReportSummary, RoomSummary, Verdict};
pub use errors::{HvacError, HvacResult};
pub use measurements::{MeasurementRecord, TestKey};
pub use report::Report;
pub use room::Room;
pub use store::{JsonFileStore, MemoryStore, ReportStore};
