//! # Report Records
//!
//! The `Report` struct is the root container for one qualification job:
//! customer and test metadata, the measuring devices used, and the rooms.
//! Reports persist as camelCase JSON inside the `hvac-reports` array (see
//! [`crate::store`]).
//!
//! ## Structure
//!
//! ```text
//! Report
//! ├── id, version, reportNumber, customer/hospital/department
//! ├── testDate, testerName, standard
//! ├── devices: Vec<MeasuringDevice>
//! ├── rooms: Vec<Room>
//! └── createdAt, updatedAt
//! ```
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::report::Report;
//! use hvac_core::room::Room;
//! use hvac_core::units::{Meters, SquareMeters};
//!
//! let mut report = Report::new("RPR-2024-017", "Şehir Hastanesi");
//! report.add_room(Room::new("101", "Ameliyathane 1", SquareMeters(36.0), Meters(3.0)));
//!
//! let json = serde_json::to_string_pretty(&report).unwrap();
//! assert!(json.contains("\"reportNumber\""));
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::compliance::summary::{summarize_report, ReportSummary};
use crate::compliance::{evaluate_report, ReportEvaluation};
use crate::devices::MeasuringDevice;
use crate::errors::{HvacError, HvacResult};
use crate::measurements::lenient;
use crate::room::Room;

/// Current schema version of stored reports
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Reference standard printed when none is recorded
pub const DEFAULT_STANDARD: &str = "ISO 14644-1";

fn current_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_standard() -> String {
    DEFAULT_STANDARD.to_string()
}

/// Root report container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,

    /// Schema version (for migration)
    #[serde(default = "current_version")]
    pub version: String,

    #[serde(default)]
    pub report_number: String,

    #[serde(default)]
    pub customer_name: String,

    #[serde(default)]
    pub hospital_name: String,

    #[serde(default)]
    pub department: String,

    #[serde(default, deserialize_with = "lenient::option_date", skip_serializing_if = "Option::is_none")]
    pub test_date: Option<NaiveDate>,

    #[serde(default)]
    pub tester_name: String,

    #[serde(default = "default_standard")]
    pub standard: String,

    #[serde(default)]
    pub devices: Vec<MeasuringDevice>,

    #[serde(default)]
    pub rooms: Vec<Room>,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Create a new empty report.
    ///
    /// ```rust
    /// use hvac_core::report::Report;
    ///
    /// let report = Report::new("RPR-001", "Acme Klinik");
    /// assert_eq!(report.standard, "ISO 14644-1");
    /// assert!(report.rooms.is_empty());
    /// ```
    pub fn new(report_number: impl Into<String>, customer_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Report {
            id: Uuid::new_v4().to_string(),
            version: current_version(),
            report_number: report_number.into(),
            customer_name: customer_name.into(),
            hospital_name: String::new(),
            department: String::new(),
            test_date: None,
            tester_name: String::new(),
            standard: default_standard(),
            devices: Vec::new(),
            rooms: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the modified timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Add a room and return its id.
    pub fn add_room(&mut self, room: Room) -> String {
        let id = room.id.clone();
        self.rooms.push(room);
        self.touch();
        id
    }

    pub fn remove_room(&mut self, room_id: &str) -> Option<Room> {
        let position = self.rooms.iter().position(|r| r.id == room_id)?;
        self.touch();
        Some(self.rooms.remove(position))
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }

    /// Mutable room access; marks the report as modified.
    pub fn room_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        let room = self.rooms.iter_mut().find(|r| r.id == room_id)?;
        self.updated_at = Utc::now();
        Some(room)
    }

    pub fn add_device(&mut self, device: MeasuringDevice) -> String {
        let id = device.id.clone();
        self.devices.push(device);
        self.touch();
        id
    }

    pub fn device(&self, device_id: &str) -> Option<&MeasuringDevice> {
        self.devices.iter().find(|d| d.id == device_id)
    }

    /// Devices used by any test instance whose calibration is not valid on
    /// `on`. A reference to a device missing from `devices` is reported as
    /// an error since its calibration cannot be shown.
    pub fn expired_devices(&self, on: NaiveDate) -> HvacResult<Vec<&MeasuringDevice>> {
        let mut expired: Vec<&MeasuringDevice> = Vec::new();
        for device_ref in self.rooms.iter().flat_map(Room::device_refs) {
            let device = self.device(&device_ref.id).ok_or_else(|| {
                HvacError::invalid_input(
                    "device",
                    device_ref.id.clone(),
                    format!("'{}' is not registered in this report", device_ref.name),
                )
            })?;
            if !device.is_calibration_valid(on) && !expired.iter().any(|d| d.id == device.id) {
                expired.push(device);
            }
        }
        Ok(expired)
    }

    pub fn evaluate(&self) -> ReportEvaluation {
        evaluate_report(&self.rooms)
    }

    pub fn summary(&self) -> ReportSummary {
        summarize_report(self)
    }

    /// Normalize before persisting: consolidate instances into the
    /// single-record view and bump `updatedAt`.
    pub fn prepare_for_save(&mut self) {
        for room in &mut self.rooms {
            room.consolidate_instances();
        }
        self.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::ReportOutcome;
    use crate::measurements::{MeasurementRecord, PressureDifference, TestKey};
    use crate::units::{Meters, SquareMeters};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_report_creation() {
        let report = Report::new("RPR-001", "Test Klinik");
        assert_eq!(report.report_number, "RPR-001");
        assert_eq!(report.customer_name, "Test Klinik");
        assert_eq!(report.version, SCHEMA_VERSION);
        assert_eq!(report.evaluate().outcome, ReportOutcome::NoData);
    }

    #[test]
    fn test_room_management() {
        let mut report = Report::new("RPR-001", "Test Klinik");
        let id = report.add_room(Room::new("101", "Oda", SquareMeters(10.0), Meters(3.0)));
        assert!(report.room(&id).is_some());

        report.room_mut(&id).unwrap().select_test(TestKey::PressureDifference);
        assert!(report.room(&id).unwrap().is_selected(TestKey::PressureDifference));

        let removed = report.remove_room(&id).unwrap();
        assert_eq!(removed.room_number, "101");
        assert!(report.remove_room(&id).is_none());
    }

    #[test]
    fn test_minimal_stored_report_gets_defaults() {
        let json = r#"{ "id": "r1", "reportNumber": "RPR-9", "testDate": "2024-05-02T00:00:00.000Z" }"#;
        let report: Report = serde_json::from_str(json).unwrap();
        assert_eq!(report.version, SCHEMA_VERSION);
        assert_eq!(report.standard, DEFAULT_STANDARD);
        assert_eq!(report.test_date, Some(date(2024, 5, 2)));
        assert!(report.rooms.is_empty());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let mut report = Report::new("RPR-001", "Test Klinik");
        report.test_date = Some(date(2024, 3, 15));
        let mut room = Room::new("101", "Oda", SquareMeters(10.0), Meters(3.0));
        room.select_test(TestKey::PressureDifference);
        room.set_record(MeasurementRecord::PressureDifference(PressureDifference {
            pressure: Some(7.5),
            ..Default::default()
        }))
        .unwrap();
        report.add_room(room);

        let json = serde_json::to_string(&report).unwrap();
        let loaded: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, report);
        assert!(loaded.evaluate().is_compliant());
    }

    #[test]
    fn test_expired_devices() {
        let mut report = Report::new("RPR-001", "Test Klinik");
        let valid = MeasuringDevice::new("Manometre", "DP-1")
            .with_calibration(date(2024, 1, 1), date(2025, 1, 1));
        let lapsed = MeasuringDevice::new("Fotometre", "PH-2")
            .with_calibration(date(2023, 1, 1), date(2024, 1, 1));
        let (valid_ref, lapsed_ref) = (valid.to_ref(), lapsed.to_ref());
        report.add_device(valid);
        report.add_device(lapsed);

        let mut room = Room::new("101", "Oda", SquareMeters(10.0), Meters(3.0));
        room.set_test_count(TestKey::HepaLeakage, 2);
        room.assign_device(TestKey::HepaLeakage, 0, Some(valid_ref)).unwrap();
        room.assign_device(TestKey::HepaLeakage, 1, Some(lapsed_ref.clone())).unwrap();
        report.add_room(room);

        let expired = report.expired_devices(date(2024, 6, 1)).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, lapsed_ref.id);
    }

    #[test]
    fn test_unregistered_device_is_an_error() {
        let mut report = Report::new("RPR-001", "Test Klinik");
        let mut room = Room::new("101", "Oda", SquareMeters(10.0), Meters(3.0));
        room.set_test_count(TestKey::NoiseLevel, 1);
        let ghost = MeasuringDevice::new("Ses Ölçer", "SL-1").to_ref();
        room.assign_device(TestKey::NoiseLevel, 0, Some(ghost)).unwrap();
        report.add_room(room);

        let err = report.expired_devices(date(2024, 6, 1)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
