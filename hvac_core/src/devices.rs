//! # Measuring Devices
//!
//! Calibration records for the instruments used during qualification
//! (anemometers, particle counters, manometers, aerosol photometers, sound
//! level meters). Test instances point at a device by id; a report flags
//! instruments whose calibration had lapsed on the test date.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::measurements::lenient;

/// Reference to the device a test instance was measured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRef {
    pub id: String,
    pub name: String,
}

/// A calibrated measuring instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasuringDevice {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: String,
    #[serde(default, deserialize_with = "lenient::option_date", skip_serializing_if = "Option::is_none")]
    pub calibration_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient::option_date", skip_serializing_if = "Option::is_none")]
    pub calibration_due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,
}

impl MeasuringDevice {
    pub fn new(name: impl Into<String>, serial_number: impl Into<String>) -> Self {
        MeasuringDevice {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            manufacturer: None,
            model: None,
            serial_number: serial_number.into(),
            calibration_date: None,
            calibration_due_date: None,
            certificate_number: None,
        }
    }

    /// Builder-style calibration window
    pub fn with_calibration(mut self, calibrated: NaiveDate, due: NaiveDate) -> Self {
        self.calibration_date = Some(calibrated);
        self.calibration_due_date = Some(due);
        self
    }

    pub fn to_ref(&self) -> DeviceRef {
        DeviceRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    /// Valid when a due date is on record and `on` does not pass it.
    pub fn is_calibration_valid(&self, on: NaiveDate) -> bool {
        match self.calibration_due_date {
            Some(due) => on <= due,
            None => false,
        }
    }

    /// Days remaining until the due date (negative once overdue)
    pub fn days_until_due(&self, on: NaiveDate) -> Option<i64> {
        self.calibration_due_date
            .map(|due| due.signed_duration_since(on).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_calibration_window() {
        let device = MeasuringDevice::new("Partikül Sayacı", "PC-3016")
            .with_calibration(date(2024, 1, 10), date(2025, 1, 10));

        assert!(device.is_calibration_valid(date(2024, 6, 1)));
        assert!(device.is_calibration_valid(date(2025, 1, 10)));
        assert!(!device.is_calibration_valid(date(2025, 1, 11)));
        assert_eq!(device.days_until_due(date(2025, 1, 1)), Some(9));
        assert_eq!(device.days_until_due(date(2025, 1, 12)), Some(-2));
    }

    #[test]
    fn test_missing_due_date_is_invalid() {
        let device = MeasuringDevice::new("Manometre", "DP-1");
        assert!(!device.is_calibration_valid(date(2024, 1, 1)));
        assert_eq!(device.days_until_due(date(2024, 1, 1)), None);
    }

    #[test]
    fn test_blank_dates_from_storage() {
        let json = r#"{"id":"d1","name":"Anemometre","serialNumber":"AN-7","calibrationDate":"","calibrationDueDate":"2025-03-01"}"#;
        let device: MeasuringDevice = serde_json::from_str(json).unwrap();
        assert_eq!(device.calibration_date, None);
        assert_eq!(device.calibration_due_date, Some(date(2025, 3, 1)));
        assert_eq!(device.to_ref().name, "Anemometre");
    }
}
