//! # Measurement Records
//!
//! One record shape per qualification test. Records carry only what was
//! measured plus two cached display fields (`criteria`, `meetsCriteria`).
//! Verdicts are always derived by [`crate::compliance`]; the cached flag is
//! rewritten by [`crate::room::Room`] on every mutation.
//!
//! ## JSON Example
//!
//! ```json
//! { "type": "pressureDifference", "pressure": "7,5", "referenceArea": "Koridor" }
//! ```
//!
//! Numeric fields accept JSON numbers or numeric strings (form state is kept
//! as text; a decimal comma is accepted and an empty string means "not
//! measured").

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{HvacError, HvacResult};

// ============================================================================
// Test Keys
// ============================================================================

/// The eight qualification test types, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestKey {
    AirflowData,
    PressureDifference,
    AirFlowDirection,
    HepaLeakage,
    ParticleCount,
    RecoveryTime,
    TemperatureHumidity,
    NoiseLevel,
}

impl TestKey {
    /// All test types in canonical display order
    pub const ALL: [TestKey; 8] = [
        TestKey::AirflowData,
        TestKey::PressureDifference,
        TestKey::AirFlowDirection,
        TestKey::HepaLeakage,
        TestKey::ParticleCount,
        TestKey::RecoveryTime,
        TestKey::TemperatureHumidity,
        TestKey::NoiseLevel,
    ];

    /// Storage key as used in persisted reports
    pub fn as_str(self) -> &'static str {
        match self {
            TestKey::AirflowData => "airflowData",
            TestKey::PressureDifference => "pressureDifference",
            TestKey::AirFlowDirection => "airFlowDirection",
            TestKey::HepaLeakage => "hepaLeakage",
            TestKey::ParticleCount => "particleCount",
            TestKey::RecoveryTime => "recoveryTime",
            TestKey::TemperatureHumidity => "temperatureHumidity",
            TestKey::NoiseLevel => "noiseLevel",
        }
    }

    /// Turkish test name printed on reports
    pub fn display_name(self) -> &'static str {
        match self {
            TestKey::AirflowData => "Hava Debisi ve Hava Değişim Oranı",
            TestKey::PressureDifference => "Basınç Farkı",
            TestKey::AirFlowDirection => "Hava Akış Yönü",
            TestKey::HepaLeakage => "HEPA Filtre Sızdırmazlık Testi",
            TestKey::ParticleCount => "Partikül Sayımı",
            TestKey::RecoveryTime => "Geri Kazanım Süresi",
            TestKey::TemperatureHumidity => "Sıcaklık ve Nem",
            TestKey::NoiseLevel => "Gürültü Seviyesi",
        }
    }
}

impl fmt::Display for TestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestKey {
    type Err = HvacError;

    fn from_str(s: &str) -> HvacResult<Self> {
        TestKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| HvacError::unknown_test_key(s))
    }
}

// ============================================================================
// Record Shapes
// ============================================================================

/// Air flow measurement at the supply filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirflowData {
    /// Mean face velocity at the filter (m/s)
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub velocity: Option<f64>,
    /// Filter width (mm)
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub filter_width_mm: Option<f64>,
    /// Filter height (mm)
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub filter_height_mm: Option<f64>,
    /// Total supply flow into the room (m³/h)
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub flow_rate: Option<f64>,
    /// Air change rate if measured or entered directly (ACH)
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub air_change_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_criteria: Option<bool>,
}

/// Differential pressure against an adjacent area.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressureDifference {
    /// Measured differential pressure (Pa)
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    /// Area the pressure is referenced to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_area: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_criteria: Option<bool>,
}

/// Smoke/visual air flow direction check.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AirFlowDirection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    /// Operator's verdict, "UYGUNDUR" when the flow was as expected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_criteria: Option<bool>,
}

/// HEPA filter integrity (scan) test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HepaLeakage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_id: Option<String>,
    /// Permitted leakage noted on the form (%); descriptive only
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub max_leakage: Option<f64>,
    /// Highest leakage found during the scan (%)
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub actual_leakage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_criteria: Option<bool>,
}

/// Airborne particle concentration (particles/m³).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticleCount {
    /// ≥0.5 µm concentration, already averaged
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub particle05: Option<f64>,
    /// ≥5 µm concentration, already averaged
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub particle5: Option<f64>,
    /// Raw ≥0.5 µm readings per sampling point
    #[serde(default, deserialize_with = "lenient::vec_f64", skip_serializing_if = "Vec::is_empty")]
    pub readings05: Vec<f64>,
    /// Raw ≥5 µm readings per sampling point
    #[serde(default, deserialize_with = "lenient::vec_f64", skip_serializing_if = "Vec::is_empty")]
    pub readings5: Vec<f64>,
    #[serde(default, deserialize_with = "lenient::option_u32", skip_serializing_if = "Option::is_none")]
    pub sampling_points: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_criteria: Option<bool>,
}

/// Cleanliness recovery after a particle challenge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryTime {
    /// Time to return to the target class (minutes)
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub initial_count: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub final_count: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_criteria: Option<bool>,
}

/// Room temperature (°C) and relative humidity (%).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureHumidity {
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_criteria: Option<bool>,
}

/// Equivalent continuous sound level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoiseLevel {
    /// Leq (dB(A))
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub leq: Option<f64>,
    /// Background level with HVAC off (dB(A))
    #[serde(default, deserialize_with = "lenient::option_f64", skip_serializing_if = "Option::is_none")]
    pub background: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meets_criteria: Option<bool>,
}

// ============================================================================
// Tagged Record
// ============================================================================

/// A measurement of one test type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MeasurementRecord {
    AirflowData(AirflowData),
    PressureDifference(PressureDifference),
    AirFlowDirection(AirFlowDirection),
    HepaLeakage(HepaLeakage),
    ParticleCount(ParticleCount),
    RecoveryTime(RecoveryTime),
    TemperatureHumidity(TemperatureHumidity),
    NoiseLevel(NoiseLevel),
}

/// Run `$body` with `$data` bound to the inner struct of any variant.
macro_rules! with_record {
    ($record:expr, $data:ident => $body:expr) => {
        match $record {
            MeasurementRecord::AirflowData($data) => $body,
            MeasurementRecord::PressureDifference($data) => $body,
            MeasurementRecord::AirFlowDirection($data) => $body,
            MeasurementRecord::HepaLeakage($data) => $body,
            MeasurementRecord::ParticleCount($data) => $body,
            MeasurementRecord::RecoveryTime($data) => $body,
            MeasurementRecord::TemperatureHumidity($data) => $body,
            MeasurementRecord::NoiseLevel($data) => $body,
        }
    };
}

impl MeasurementRecord {
    /// An unmeasured record of the given type.
    pub fn empty(key: TestKey) -> Self {
        match key {
            TestKey::AirflowData => MeasurementRecord::AirflowData(AirflowData::default()),
            TestKey::PressureDifference => {
                MeasurementRecord::PressureDifference(PressureDifference::default())
            }
            TestKey::AirFlowDirection => {
                MeasurementRecord::AirFlowDirection(AirFlowDirection::default())
            }
            TestKey::HepaLeakage => MeasurementRecord::HepaLeakage(HepaLeakage::default()),
            TestKey::ParticleCount => MeasurementRecord::ParticleCount(ParticleCount::default()),
            TestKey::RecoveryTime => MeasurementRecord::RecoveryTime(RecoveryTime::default()),
            TestKey::TemperatureHumidity => {
                MeasurementRecord::TemperatureHumidity(TemperatureHumidity::default())
            }
            TestKey::NoiseLevel => MeasurementRecord::NoiseLevel(NoiseLevel::default()),
        }
    }

    /// The test type this record belongs to
    pub fn key(&self) -> TestKey {
        match self {
            MeasurementRecord::AirflowData(_) => TestKey::AirflowData,
            MeasurementRecord::PressureDifference(_) => TestKey::PressureDifference,
            MeasurementRecord::AirFlowDirection(_) => TestKey::AirFlowDirection,
            MeasurementRecord::HepaLeakage(_) => TestKey::HepaLeakage,
            MeasurementRecord::ParticleCount(_) => TestKey::ParticleCount,
            MeasurementRecord::RecoveryTime(_) => TestKey::RecoveryTime,
            MeasurementRecord::TemperatureHumidity(_) => TestKey::TemperatureHumidity,
            MeasurementRecord::NoiseLevel(_) => TestKey::NoiseLevel,
        }
    }

    /// Free-text criteria stored with the record
    pub fn criteria(&self) -> Option<&str> {
        with_record!(self, data => data.criteria.as_deref())
    }

    /// Cached compliance flag. Display only; see [`crate::compliance`].
    pub fn cached_verdict(&self) -> Option<bool> {
        with_record!(self, data => data.meets_criteria)
    }

    pub(crate) fn set_cached_verdict(&mut self, meets: Option<bool>) {
        with_record!(self, data => data.meets_criteria = meets)
    }

    /// Decode a stored record whose type is implied by the key it is filed
    /// under. Older saves omit the `type` tag.
    pub fn from_stored(key: TestKey, value: serde_json::Value) -> HvacResult<Self> {
        let mut value = value;
        match &mut value {
            serde_json::Value::Object(map) => {
                map.entry("type")
                    .or_insert_with(|| serde_json::Value::from(key.as_str()));
            }
            serde_json::Value::Null => return Ok(MeasurementRecord::empty(key)),
            other => {
                return Err(HvacError::invalid_input(
                    key.as_str(),
                    other.to_string(),
                    "Measurement record must be a JSON object",
                ))
            }
        }

        let record: MeasurementRecord = serde_json::from_value(value)?;
        if record.key() != key {
            return Err(HvacError::invalid_input(
                key.as_str(),
                record.key().as_str(),
                "Record type does not match the test it is stored under",
            ));
        }
        Ok(record)
    }

    pub(crate) fn set_default_criteria(&mut self, text: &str) {
        with_record!(self, data => {
            if data.criteria.as_deref().map_or(true, |c| c.trim().is_empty()) {
                data.criteria = Some(text.to_string());
            }
        })
    }
}

// ============================================================================
// Lenient Number Parsing
// ============================================================================

/// Deserializers that accept numbers stored as text.
pub(crate) mod lenient {
    use chrono::NaiveDate;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    impl NumberOrText {
        fn into_f64(self) -> Option<f64> {
            let value = match self {
                NumberOrText::Number(n) => Some(n),
                NumberOrText::Text(s) => parse_text(&s),
            };
            value.filter(|v| v.is_finite())
        }
    }

    /// Parse a form value; accepts a decimal comma, blank means absent.
    pub fn parse_text(s: &str) -> Option<f64> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return None;
        }
        trimmed.replace(',', ".").parse().ok()
    }

    pub fn option_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<NumberOrText>::deserialize(deserializer)?;
        Ok(raw.and_then(NumberOrText::into_f64))
    }

    pub fn option_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(option_f64(deserializer)?
            .filter(|v| *v >= 0.0 && *v <= u32::MAX as f64)
            .map(|v| v.round() as u32))
    }

    /// ISO dates (`YYYY-MM-DD`, optionally with a time part); blank means absent.
    pub fn option_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(text) => {
                let date_part = text.get(..10).unwrap_or(text);
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|e| D::Error::custom(format!("invalid date '{}': {}", text, e)))
            }
        }
    }

    /// Unparseable entries are skipped rather than read as zero.
    pub fn vec_f64<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Vec<Option<NumberOrText>>>::deserialize(deserializer)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .flatten()
            .filter_map(NumberOrText::into_f64)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_from_str() {
        for key in TestKey::ALL {
            assert_eq!(key.as_str().parse::<TestKey>().unwrap(), key);
        }
        let err = "smokeTest".parse::<TestKey>().unwrap_err();
        assert_eq!(err, HvacError::unknown_test_key("smokeTest"));
    }

    #[test]
    fn test_key_serde_matches_as_str() {
        for key in TestKey::ALL {
            let json = serde_json::to_string(&key).unwrap();
            assert_eq!(json, format!("\"{}\"", key.as_str()));
        }
    }

    #[test]
    fn test_record_tagging() {
        let record = MeasurementRecord::PressureDifference(PressureDifference {
            pressure: Some(7.0),
            ..Default::default()
        });
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"type":"pressureDifference","pressure":7.0}"#);
        assert_eq!(record.key(), TestKey::PressureDifference);
    }

    #[test]
    fn test_lenient_numbers_from_form_text() {
        let json = r#"{"type":"temperatureHumidity","temperature":"21,5","humidity":"45"}"#;
        let record: MeasurementRecord = serde_json::from_str(json).unwrap();
        match record {
            MeasurementRecord::TemperatureHumidity(th) => {
                assert_eq!(th.temperature, Some(21.5));
                assert_eq!(th.humidity, Some(45.0));
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_blank_text_is_absent_not_zero() {
        let json = r#"{"type":"pressureDifference","pressure":""}"#;
        let record: MeasurementRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            record,
            MeasurementRecord::PressureDifference(PressureDifference::default())
        );
    }

    #[test]
    fn test_readings_skip_garbage() {
        let json = r#"{"type":"particleCount","readings05":[1000, "2000", "", null, "abc"],"samplingPoints":"4"}"#;
        let record: MeasurementRecord = serde_json::from_str(json).unwrap();
        match record {
            MeasurementRecord::ParticleCount(pc) => {
                assert_eq!(pc.readings05, vec![1000.0, 2000.0]);
                assert_eq!(pc.sampling_points, Some(4));
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_from_stored_without_tag() {
        let value = serde_json::json!({ "actualLeakage": "0,005", "meetsCriteria": false });
        let record = MeasurementRecord::from_stored(TestKey::HepaLeakage, value).unwrap();
        match &record {
            MeasurementRecord::HepaLeakage(h) => assert_eq!(h.actual_leakage, Some(0.005)),
            other => panic!("unexpected record {:?}", other),
        }
        assert_eq!(record.cached_verdict(), Some(false));
    }

    #[test]
    fn test_from_stored_rejects_mismatched_tag() {
        let value = serde_json::json!({ "type": "noiseLevel", "leq": 40 });
        let err = MeasurementRecord::from_stored(TestKey::PressureDifference, value).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_default_criteria_keeps_user_text() {
        let mut record = MeasurementRecord::empty(TestKey::NoiseLevel);
        record.set_default_criteria("≤ 45 dB");
        assert_eq!(record.criteria(), Some("≤ 45 dB"));

        record.set_default_criteria("something else");
        assert_eq!(record.criteria(), Some("≤ 45 dB"));
    }
}
