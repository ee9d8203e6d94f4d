//! End-to-end compliance scenarios through the public API.

use hvac_core::compliance::criteria::{
    validate_hepa_leakage, validate_pressure, validate_recovery_time, validate_temp_humidity,
};
use hvac_core::compliance::{evaluate_report, evaluate_room, summarize_room, IsoClass};
use hvac_core::measurements::{
    AirFlowDirection, AirflowData, ParticleCount, PressureDifference, TemperatureHumidity,
};
use hvac_core::store::{JsonFileStore, ReportStore};
use hvac_core::units::{CubicMeters, Meters, SquareMeters};
use hvac_core::{MeasurementRecord, Report, ReportOutcome, Room, TestKey, Verdict};

fn room(number: &str) -> Room {
    Room::new(number, "Ameliyathane", SquareMeters(14.0), Meters(3.0))
}

fn room_with(key: TestKey, record: MeasurementRecord) -> Room {
    let mut room = room("101");
    room.select_test(key);
    room.set_record(record).unwrap();
    room
}

fn pressure(p: f64) -> MeasurementRecord {
    MeasurementRecord::PressureDifference(PressureDifference {
        pressure: Some(p),
        ..Default::default()
    })
}

fn particles(count: f64) -> MeasurementRecord {
    MeasurementRecord::ParticleCount(ParticleCount {
        particle05: Some(count),
        ..Default::default()
    })
}

#[test]
fn pressure_above_threshold_is_compliant() {
    let room = room_with(TestKey::PressureDifference, pressure(7.0));
    let evaluation = evaluate_room(&room);
    assert!(evaluation.compliant);
    assert_eq!(evaluation.verdict_label(), "UYGUNDUR");
}

#[test]
fn pressure_below_threshold_is_not_compliant() {
    let room = room_with(TestKey::PressureDifference, pressure(5.0));
    let evaluation = evaluate_room(&room);
    assert!(!evaluation.compliant);
    assert_eq!(evaluation.verdict_label(), "UYGUN DEĞİL");
}

#[test]
fn particle_count_classifies_and_decides() {
    let clean = room_with(TestKey::ParticleCount, particles(3_000.0));
    assert_eq!(IsoClass::classify(3_000.0).label(), "5");
    assert!(evaluate_room(&clean).compliant);

    let dirty = room_with(TestKey::ParticleCount, particles(400_000.0));
    assert_eq!(IsoClass::classify(400_000.0).label(), "8");
    assert!(!evaluate_room(&dirty).compliant);
}

#[test]
fn low_air_change_rate_fails() {
    let room = room_with(
        TestKey::AirflowData,
        MeasurementRecord::AirflowData(AirflowData {
            flow_rate: Some(500.0),
            ..Default::default()
        }),
    );
    assert_eq!(room.volume(), CubicMeters(42.0));

    let summary = summarize_room(&room);
    let airflow = &summary.tests[0];
    assert_eq!(airflow.display_value, "500.00 m³/h, 11.90 ACH");
    assert_eq!(airflow.verdict, Some(Verdict::Fail));
    assert!(!summary.compliant);
}

#[test]
fn one_failing_room_fails_the_report() {
    let mut report = Report::new("RPR-001", "Şehir Hastanesi");
    report.add_room(room_with(TestKey::PressureDifference, pressure(8.0)));
    report.add_room(room_with(TestKey::PressureDifference, pressure(2.0)));

    let evaluation = report.evaluate();
    assert_eq!(evaluation.outcome, ReportOutcome::NonCompliant);
    assert_eq!(evaluation.assessment(), "Sistem, referans standartlara UYGUN DEĞİL.");
}

#[test]
fn selected_test_without_record_fails_the_room() {
    let mut room = room("101");
    room.select_test(TestKey::HepaLeakage);
    assert!(!evaluate_room(&room).compliant);
}

#[test]
fn direction_and_climate_tests() {
    let mut room = room("102");
    room.select_test(TestKey::AirFlowDirection);
    room.select_test(TestKey::TemperatureHumidity);
    room.set_record(MeasurementRecord::AirFlowDirection(AirFlowDirection {
        direction: Some("Temiz alandan kirli alana".to_string()),
        result: Some("UYGUNDUR".to_string()),
        ..Default::default()
    }))
    .unwrap();
    room.set_record(MeasurementRecord::TemperatureHumidity(TemperatureHumidity {
        temperature: Some(22.0),
        humidity: Some(45.0),
        ..Default::default()
    }))
    .unwrap();
    assert!(evaluate_room(&room).compliant);

    room.set_record(MeasurementRecord::TemperatureHumidity(TemperatureHumidity {
        temperature: Some(22.0),
        humidity: Some(65.0),
        ..Default::default()
    }))
    .unwrap();
    assert!(!evaluate_room(&room).compliant);
}

#[test]
fn validator_properties_hold_over_a_sweep() {
    for step in 0..=200 {
        let x = step as f64 * 0.25;
        assert_eq!(validate_pressure(x), x >= 6.0, "pressure {}", x);
        assert_eq!(validate_recovery_time(x), x <= 25.0, "recovery {}", x);
        let leak = step as f64 * 0.0001;
        assert_eq!(validate_hepa_leakage(leak), leak <= 0.01, "leak {}", leak);
    }
    for t in 15..30 {
        for h in (30..70).step_by(5) {
            let (t, h) = (t as f64, h as f64);
            assert_eq!(
                validate_temp_humidity(t, h),
                (20.0..=24.0).contains(&t) && (40.0..=60.0).contains(&h)
            );
        }
    }
}

#[test]
fn iso_classification_is_monotonic() {
    let counts = [0.0, 3_520.0, 3_521.0, 35_200.0, 35_201.0, 352_000.0, 352_001.0, 1e9];
    for pair in counts.windows(2) {
        assert!(IsoClass::classify(pair[0]).rank() <= IsoClass::classify(pair[1]).rank());
    }
}

#[test]
fn report_over_single_room_matches_room() {
    for p in [2.0, 6.0, 9.0] {
        let room = room_with(TestKey::PressureDifference, pressure(p));
        let room_verdict = evaluate_room(&room).compliant;
        let report = evaluate_report(std::slice::from_ref(&room));
        assert_eq!(report.is_compliant(), room_verdict);
    }
    assert_eq!(evaluate_report(&[]).outcome, ReportOutcome::NoData);
}

#[test]
fn stored_reports_survive_a_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = JsonFileStore::new(dir.path().join("hvac-reports.json"), "test");

    let mut report = Report::new("RPR-002", "Devlet Hastanesi");
    let mut room = Room::new("201", "İzolasyon", SquareMeters(12.345), Meters(2.7));
    room.select_test(TestKey::PressureDifference);
    room.set_record(pressure(7.0)).unwrap();
    let volume = room.volume();
    report.add_room(room);
    let id = report.id.clone();
    let before = report.evaluate();
    store.upsert(report).unwrap();

    let loaded = store.get(&id).unwrap();
    assert_eq!(loaded.rooms[0].volume(), volume);
    assert_eq!(loaded.evaluate(), before);
}

#[test]
fn legacy_records_with_stale_flags_are_re_derived() {
    let json = r#"[{
        "id": "legacy-1",
        "reportNumber": "RPR-OLD",
        "rooms": [{
            "id": "r1",
            "roomNumber": "101",
            "roomName": "Ameliyathane",
            "surfaceArea": 14,
            "height": 3,
            "selectedTests": ["hepaLeakage"],
            "tests": {
                "hepaLeakage": { "maxLeakage": "0,01", "actualLeakage": "0,05", "meetsCriteria": true }
            }
        }]
    }]"#;
    let reports = hvac_core::store::parse_reports(json).unwrap();
    let room = &reports[0].rooms[0];
    assert_eq!(
        room.record(TestKey::HepaLeakage).and_then(MeasurementRecord::cached_verdict),
        Some(false)
    );
    assert!(!reports[0].evaluate().is_compliant());
}
