//! # Rooms
//!
//! A room under qualification: its geometry, operating state, the tests
//! selected for it and their measurements.
//!
//! Invariants held by every method below (and re-established on load):
//!
//! - `volume` is always `room_volume(surface_area, height)`; it has no setter.
//! - Records, counts and instances exist only for selected tests.
//!   Deselecting a test deletes all of its data.
//! - Every record's cached `meetsCriteria` equals a fresh evaluation.
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::measurements::{HepaLeakage, MeasurementRecord, TestKey};
//! use hvac_core::room::Room;
//! use hvac_core::units::{Meters, SquareMeters};
//!
//! let mut room = Room::new("B-12", "Yoğun Bakım", SquareMeters(30.0), Meters(2.8));
//! assert_eq!(room.volume().0, 84.0);
//!
//! // two filters scanned: two instances of the HEPA test
//! room.set_test_count(TestKey::HepaLeakage, 2);
//! room.update_instance(TestKey::HepaLeakage, 0, MeasurementRecord::HepaLeakage(HepaLeakage {
//!     actual_leakage: Some(0.003),
//!     ..Default::default()
//! }))?;
//! assert_eq!(room.test_count(TestKey::HepaLeakage), 2);
//! # Ok::<(), hvac_core::errors::HvacError>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::compliance::conversions::room_volume;
use crate::compliance::criteria::{criteria_text, EvaluationContext};
use crate::compliance::summary::{summarize_room, RoomSummary};
use crate::compliance::{evaluate_room, evaluate_test, RoomEvaluation, Verdict};
use crate::devices::DeviceRef;
use crate::errors::{HvacError, HvacResult};
use crate::measurements::{lenient, MeasurementRecord, TestKey};
use crate::units::{CubicMeters, Meters, SquareMeters};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// ============================================================================
// Room Attributes
// ============================================================================

/// Occupancy state during the measurements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestMode {
    #[default]
    #[serde(alias = "at-rest")]
    AtRest,
    #[serde(alias = "in-operation")]
    InOperation,
}

impl TestMode {
    pub fn display_name(self) -> &'static str {
        match self {
            TestMode::AtRest => "Dinlenme Halinde (At Rest)",
            TestMode::InOperation => "Çalışma Halinde (In Operation)",
        }
    }
}

/// Air distribution pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FlowType {
    #[default]
    Turbulence,
    Laminar,
    Unidirectional,
}

impl FlowType {
    pub fn display_name(self) -> &'static str {
        match self {
            FlowType::Turbulence => "Türbülanslı",
            FlowType::Laminar => "Laminer",
            FlowType::Unidirectional => "Tek Yönlü",
        }
    }
}

/// Hospital room class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoomClass {
    #[serde(rename = "classIB", alias = "class1B")]
    ClassIB,
    #[serde(rename = "classII", alias = "class2")]
    ClassII,
    IntensiveCare,
    #[default]
    Other,
}

impl RoomClass {
    pub fn display_name(self) -> &'static str {
        match self {
            RoomClass::ClassIB => "Sınıf IB",
            RoomClass::ClassII => "Sınıf II",
            RoomClass::IntensiveCare => "Yoğun Bakım",
            RoomClass::Other => "Diğer",
        }
    }
}

// ============================================================================
// Test Instances
// ============================================================================

/// One repetition of a selected test (e.g. one of several filters scanned).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestInstance {
    pub id: String,
    pub test_key: TestKey,
    /// Zero-based position among instances of the same type
    pub index: usize,
    pub data: MeasurementRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceRef>,
}

impl TestInstance {
    fn new(test_key: TestKey, index: usize) -> Self {
        TestInstance {
            id: new_id(),
            test_key,
            index,
            data: MeasurementRecord::empty(test_key),
            device: None,
        }
    }
}

// ============================================================================
// Room
// ============================================================================

/// A room and its qualification tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredRoom")]
pub struct Room {
    pub id: String,
    pub room_number: String,
    pub room_name: String,
    surface_area: SquareMeters,
    height: Meters,
    volume: CubicMeters,
    pub test_mode: TestMode,
    pub flow_type: FlowType,
    pub room_class: RoomClass,
    selected_tests: BTreeSet<TestKey>,
    test_counts: BTreeMap<TestKey, usize>,
    test_instances: Vec<TestInstance>,
    tests: BTreeMap<TestKey, MeasurementRecord>,
}

impl Room {
    /// Create a room with no tests selected.
    ///
    /// Negative or non-finite dimensions are stored as zero, which leaves
    /// the volume unusable for air change rates instead of poisoning it.
    pub fn new(
        room_number: impl Into<String>,
        room_name: impl Into<String>,
        surface_area: SquareMeters,
        height: Meters,
    ) -> Self {
        let room_number = room_number.into();
        let surface_area =
            SquareMeters(sanitize_dimension(&room_number, "surfaceArea", surface_area.0));
        let height = Meters(sanitize_dimension(&room_number, "height", height.0));
        Room {
            id: new_id(),
            room_number,
            room_name: room_name.into(),
            surface_area,
            height,
            volume: room_volume(surface_area, height),
            test_mode: TestMode::default(),
            flow_type: FlowType::default(),
            room_class: RoomClass::default(),
            selected_tests: BTreeSet::new(),
            test_counts: BTreeMap::new(),
            test_instances: Vec::new(),
            tests: BTreeMap::new(),
        }
    }

    pub fn surface_area(&self) -> SquareMeters {
        self.surface_area
    }

    pub fn height(&self) -> Meters {
        self.height
    }

    /// Derived from surface area and height
    pub fn volume(&self) -> CubicMeters {
        self.volume
    }

    pub fn set_surface_area(&mut self, surface_area: SquareMeters) -> HvacResult<()> {
        check_dimension("surfaceArea", surface_area.0)?;
        self.surface_area = surface_area;
        self.geometry_changed();
        Ok(())
    }

    pub fn set_height(&mut self, height: Meters) -> HvacResult<()> {
        check_dimension("height", height.0)?;
        self.height = height;
        self.geometry_changed();
        Ok(())
    }

    fn geometry_changed(&mut self) {
        self.volume = room_volume(self.surface_area, self.height);
        // air change rate depends on the volume
        self.refresh_verdicts();
    }

    pub fn evaluation_context(&self) -> EvaluationContext {
        EvaluationContext::new(self.volume)
    }

    // ------------------------------------------------------------------
    // Selection
    // ------------------------------------------------------------------

    pub fn selected_tests(&self) -> &BTreeSet<TestKey> {
        &self.selected_tests
    }

    pub fn is_selected(&self, key: TestKey) -> bool {
        self.selected_tests.contains(&key)
    }

    /// Returns true if the test was not selected before.
    pub fn select_test(&mut self, key: TestKey) -> bool {
        self.selected_tests.insert(key)
    }

    /// Select by storage key, rejecting unknown test types.
    pub fn select_test_by_name(&mut self, key: &str) -> HvacResult<TestKey> {
        let key: TestKey = key.parse()?;
        self.select_test(key);
        Ok(key)
    }

    /// Deselect a test and delete its record, count and instances.
    pub fn deselect_test(&mut self, key: TestKey) -> bool {
        let removed = self.selected_tests.remove(&key);
        self.tests.remove(&key);
        self.test_counts.remove(&key);
        self.test_instances.retain(|i| i.test_key != key);
        removed
    }

    /// Replace the whole selection.
    pub fn set_selected_tests(&mut self, keys: impl IntoIterator<Item = TestKey>) {
        let wanted: BTreeSet<TestKey> = keys.into_iter().collect();
        let dropped: Vec<TestKey> = self.selected_tests.difference(&wanted).copied().collect();
        for key in dropped {
            self.deselect_test(key);
        }
        self.selected_tests.extend(wanted);
    }

    // ------------------------------------------------------------------
    // Single records
    // ------------------------------------------------------------------

    pub fn tests(&self) -> &BTreeMap<TestKey, MeasurementRecord> {
        &self.tests
    }

    pub fn record(&self, key: TestKey) -> Option<&MeasurementRecord> {
        self.tests.get(&key)
    }

    /// Store the single record for a selected test.
    ///
    /// When the test has instances, compliance is decided by the instances
    /// and this record is only the consolidated view.
    pub fn set_record(&mut self, record: MeasurementRecord) -> HvacResult<()> {
        let key = record.key();
        if !self.is_selected(key) {
            return Err(HvacError::test_not_selected(&self.room_number, key.as_str()));
        }
        self.tests.insert(key, record);
        self.refresh_verdicts();
        Ok(())
    }

    pub fn remove_record(&mut self, key: TestKey) -> Option<MeasurementRecord> {
        self.tests.remove(&key)
    }

    // ------------------------------------------------------------------
    // Instances
    // ------------------------------------------------------------------

    pub fn test_instances(&self) -> &[TestInstance] {
        &self.test_instances
    }

    pub fn instances_of(&self, key: TestKey) -> impl Iterator<Item = &TestInstance> {
        self.test_instances.iter().filter(move |i| i.test_key == key)
    }

    pub fn test_count(&self, key: TestKey) -> usize {
        self.test_counts.get(&key).copied().unwrap_or(0)
    }

    /// Grow or shrink the instances of a test to exactly `count`.
    ///
    /// A positive count selects the test; zero deselects it.
    pub fn set_test_count(&mut self, key: TestKey, count: usize) {
        if count == 0 {
            self.deselect_test(key);
            return;
        }
        self.select_test(key);

        let current = self.instances_of(key).count();
        if count > current {
            self.test_instances
                .extend((current..count).map(|index| TestInstance::new(key, index)));
        } else {
            self.test_instances
                .retain(|i| i.test_key != key || i.index < count);
        }
        self.test_counts.insert(key, count);
        self.refresh_verdicts();
    }

    /// Replace the measurement of one instance.
    pub fn update_instance(
        &mut self,
        key: TestKey,
        index: usize,
        record: MeasurementRecord,
    ) -> HvacResult<()> {
        if record.key() != key {
            return Err(HvacError::invalid_input(
                key.as_str(),
                record.key().as_str(),
                "Record type does not match the instance's test",
            ));
        }
        self.instance_mut(key, index)?.data = record;
        self.refresh_verdicts();
        Ok(())
    }

    /// Record which device an instance was measured with.
    pub fn assign_device(
        &mut self,
        key: TestKey,
        index: usize,
        device: Option<DeviceRef>,
    ) -> HvacResult<()> {
        self.instance_mut(key, index)?.device = device;
        Ok(())
    }

    fn instance_mut(&mut self, key: TestKey, index: usize) -> HvacResult<&mut TestInstance> {
        let room = self.room_number.clone();
        self.test_instances
            .iter_mut()
            .find(|i| i.test_key == key && i.index == index)
            .ok_or(HvacError::InstanceNotFound {
                room,
                key: key.to_string(),
                index,
            })
    }

    /// Devices referenced by any instance
    pub fn device_refs(&self) -> impl Iterator<Item = &DeviceRef> {
        self.test_instances.iter().filter_map(|i| i.device.as_ref())
    }

    /// Copy the last instance of each test into the single-record view.
    ///
    /// Only legacy single-record readers see this; compliance still
    /// requires every instance to pass.
    pub fn consolidate_instances(&mut self) {
        let keys: Vec<TestKey> = self.selected_tests.iter().copied().collect();
        for key in keys {
            let last = self.instances_of(key).last().map(|i| i.data.clone());
            if let Some(data) = last {
                self.tests.insert(key, data);
            }
        }
    }

    /// Every record that decides this test: its instances, or else the
    /// single record.
    pub fn records_for(&self, key: TestKey) -> Vec<&MeasurementRecord> {
        let instances: Vec<&MeasurementRecord> = self.instances_of(key).map(|i| &i.data).collect();
        if !instances.is_empty() {
            return instances;
        }
        self.tests.get(&key).into_iter().collect()
    }

    // ------------------------------------------------------------------
    // Evaluation
    // ------------------------------------------------------------------

    pub fn evaluate(&self) -> RoomEvaluation {
        evaluate_room(self)
    }

    pub fn summary(&self) -> RoomSummary {
        summarize_room(self)
    }

    /// Re-derive every cached verdict. Returns how many were stale.
    fn refresh_verdicts(&mut self) -> usize {
        let ctx = self.evaluation_context();
        let records = self
            .tests
            .values_mut()
            .chain(self.test_instances.iter_mut().map(|i| &mut i.data));
        for record in records {
            record.refresh_derived(&ctx);
        }

        // airflow instances share the verdict of their summed flow
        let airflow = evaluate_test(self, TestKey::AirflowData).map(Verdict::is_pass);

        let mut stale = 0;
        for record in self.tests.values_mut() {
            let derived = record.evaluate(&ctx).map(Verdict::is_pass);
            stale += usize::from(store_verdict(record, derived));
        }
        for instance in &mut self.test_instances {
            let mut derived = instance.data.evaluate(&ctx).map(Verdict::is_pass);
            if instance.test_key == TestKey::AirflowData {
                derived = derived.and(airflow);
            }
            stale += usize::from(store_verdict(&mut instance.data, derived));
        }
        stale
    }

    fn reindex_instances(&mut self) {
        self.test_instances.sort_by_key(|i| (i.test_key, i.index));
        self.test_counts.clear();
        for instance in &mut self.test_instances {
            let next = self.test_counts.entry(instance.test_key).or_insert(0);
            instance.index = *next;
            *next += 1;
        }
    }
}

/// Replace the cached verdict; true when a cached one disagreed.
fn store_verdict(record: &mut MeasurementRecord, derived: Option<bool>) -> bool {
    let cached = record.cached_verdict();
    let stale = cached.is_some() && cached != derived;
    if stale {
        debug!(test = %record.key(), ?cached, ?derived, "replacing stale cached verdict");
    }
    record.set_cached_verdict(derived);
    record.set_default_criteria(criteria_text(record.key()));
    stale
}

fn sanitize_dimension(room: &str, field: &str, value: f64) -> f64 {
    if check_dimension(field, value).is_err() {
        warn!(room, field, value, "invalid room dimension, using 0");
        return 0.0;
    }
    value
}

fn check_dimension(field: &str, value: f64) -> HvacResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(HvacError::invalid_input(
            field,
            value.to_string(),
            "Must be a non-negative number",
        ));
    }
    Ok(())
}

// ============================================================================
// Stored Layout
// ============================================================================

/// Room as found in storage; normalized into [`Room`] on load.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredRoom {
    #[serde(default = "new_id")]
    id: String,
    #[serde(default)]
    room_number: String,
    #[serde(default)]
    room_name: String,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    surface_area: Option<f64>,
    #[serde(default, deserialize_with = "lenient::option_f64")]
    height: Option<f64>,
    #[serde(default)]
    test_mode: TestMode,
    #[serde(default)]
    flow_type: FlowType,
    #[serde(default)]
    room_class: RoomClass,
    #[serde(default)]
    selected_tests: Vec<TestKey>,
    #[serde(default)]
    test_instances: Vec<StoredInstance>,
    #[serde(default)]
    tests: BTreeMap<TestKey, serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredInstance {
    #[serde(default = "new_id")]
    id: String,
    test_key: TestKey,
    #[serde(default)]
    index: usize,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    device: Option<DeviceRef>,
}

impl TryFrom<StoredRoom> for Room {
    type Error = HvacError;

    fn try_from(stored: StoredRoom) -> HvacResult<Room> {
        let mut room = Room::new(
            stored.room_number,
            stored.room_name,
            SquareMeters(stored.surface_area.unwrap_or(0.0)),
            Meters(stored.height.unwrap_or(0.0)),
        );
        room.id = stored.id;
        room.test_mode = stored.test_mode;
        room.flow_type = stored.flow_type;
        room.room_class = stored.room_class;
        room.selected_tests.extend(stored.selected_tests);

        for (key, value) in stored.tests {
            if !room.is_selected(key) {
                warn!(room = %room.room_number, test = %key, "dropping record of unselected test");
                continue;
            }
            let record = MeasurementRecord::from_stored(key, value)?;
            room.tests.insert(key, record);
        }

        for instance in stored.test_instances {
            if !room.is_selected(instance.test_key) {
                warn!(
                    room = %room.room_number,
                    test = %instance.test_key,
                    "dropping instance of unselected test"
                );
                continue;
            }
            let data = MeasurementRecord::from_stored(instance.test_key, instance.data)?;
            room.test_instances.push(TestInstance {
                id: instance.id,
                test_key: instance.test_key,
                index: instance.index,
                data,
                device: instance.device,
            });
        }
        room.reindex_instances();

        let stale = room.refresh_verdicts();
        if stale > 0 {
            warn!(room = %room.room_number, stale, "corrected stale compliance flags on load");
        }
        Ok(room)
    }
}
