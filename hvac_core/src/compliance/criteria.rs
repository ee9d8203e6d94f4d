//! # Per-Test Validators
//!
//! Fixed acceptance thresholds and the predicates that apply them. The
//! `validate_*` predicates are total over `f64`; record evaluation returns
//! `None` when the quantity a rule needs was not measured, so an absent value
//! can never pass by being read as zero.
//!
//! | Test | Pass when |
//! |---|---|
//! | Air change rate | ≥ 20 ACH |
//! | Pressure difference | ≥ 6 Pa |
//! | Air flow direction | result is "UYGUNDUR" |
//! | HEPA leakage | ≤ 0.01 % |
//! | Particle count | ISO class 7 or cleaner |
//! | Recovery time | ≤ 25 min |
//! | Temperature / humidity | 20–24 °C and 40–60 % |
//! | Noise | Leq ≤ 45 dB(A) |

use crate::compliance::conversions::{
    air_change_rate, air_flow_rate_from_velocity, average, round2,
};
use crate::compliance::iso::IsoClass;
use crate::compliance::Verdict;
use crate::measurements::{AirflowData, MeasurementRecord, ParticleCount, TestKey};
use crate::units::{
    AirChangesPerHour, CubicMeters, CubicMetersPerHour, MetersPerSecond, Millimeters,
};

pub const MIN_AIR_CHANGE_RATE: f64 = 20.0;
pub const MIN_PRESSURE_PA: f64 = 6.0;
pub const MAX_HEPA_LEAKAGE_PCT: f64 = 0.01;
pub const MAX_RECOVERY_MINUTES: f64 = 25.0;
pub const TEMPERATURE_RANGE_C: (f64, f64) = (20.0, 24.0);
pub const HUMIDITY_RANGE_PCT: (f64, f64) = (40.0, 60.0);
pub const MAX_NOISE_DB: f64 = 45.0;

/// Literal result an operator records for an acceptable flow direction
pub const DIRECTION_PASS: &str = "UYGUNDUR";

// ============================================================================
// Predicates
// ============================================================================

pub fn validate_air_change_rate(ach: f64) -> bool {
    ach >= MIN_AIR_CHANGE_RATE
}

pub fn validate_pressure(pressure_pa: f64) -> bool {
    pressure_pa >= MIN_PRESSURE_PA
}

pub fn validate_hepa_leakage(leakage_pct: f64) -> bool {
    leakage_pct <= MAX_HEPA_LEAKAGE_PCT
}

pub fn validate_recovery_time(minutes: f64) -> bool {
    minutes <= MAX_RECOVERY_MINUTES
}

pub fn validate_temperature(celsius: f64) -> bool {
    let (min, max) = TEMPERATURE_RANGE_C;
    (min..=max).contains(&celsius)
}

pub fn validate_humidity(percent: f64) -> bool {
    let (min, max) = HUMIDITY_RANGE_PCT;
    (min..=max).contains(&percent)
}

pub fn validate_temp_humidity(celsius: f64, percent: f64) -> bool {
    validate_temperature(celsius) && validate_humidity(percent)
}

pub fn validate_noise(leq_db: f64) -> bool {
    leq_db <= MAX_NOISE_DB
}

pub fn validate_air_flow_direction(result: &str) -> bool {
    result.trim() == DIRECTION_PASS
}

/// Acceptance criterion printed next to each test.
pub fn criteria_text(key: TestKey) -> &'static str {
    match key {
        TestKey::AirflowData => "≥ 20 hava değişimi/saat (ACH)",
        TestKey::PressureDifference => "≥ 6 Pa",
        TestKey::AirFlowDirection => "Temiz alandan daha az temiz alana doğru",
        TestKey::HepaLeakage => "Sızıntı ≤ %0,01",
        TestKey::ParticleCount => "ISO Sınıf 7 (≥0,5 µm ≤ 352.000 partikül/m³)",
        TestKey::RecoveryTime => "≤ 25 dakika",
        TestKey::TemperatureHumidity => "20–24 °C, %40–60 bağıl nem",
        TestKey::NoiseLevel => "Leq ≤ 45 dB(A)",
    }
}

// ============================================================================
// Record Evaluation
// ============================================================================

/// Room-level inputs some rules need.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EvaluationContext {
    pub room_volume: CubicMeters,
}

impl EvaluationContext {
    pub fn new(room_volume: CubicMeters) -> Self {
        EvaluationContext { room_volume }
    }

    /// Flow can only be turned into air changes for a positive, finite volume.
    pub fn has_volume(&self) -> bool {
        self.room_volume.0.is_finite() && self.room_volume.0 > 0.0
    }
}

fn measured(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Total supply flow, from the stored flow rate or the filter face velocity.
pub fn resolve_flow_rate(data: &AirflowData) -> Option<CubicMetersPerHour> {
    if let Some(flow) = measured(data.flow_rate) {
        return Some(CubicMetersPerHour(flow));
    }
    match (
        measured(data.velocity),
        measured(data.filter_width_mm),
        measured(data.filter_height_mm),
    ) {
        (Some(v), Some(w), Some(h)) => Some(air_flow_rate_from_velocity(
            MetersPerSecond(v),
            Millimeters(w),
            Millimeters(h),
        )),
        _ => None,
    }
}

/// Air change rate of one record.
///
/// A resolvable flow rate is always divided by the current room volume; the
/// stored `airChangeRate` is read only for records without any flow data.
pub fn resolve_air_change_rate(
    data: &AirflowData,
    ctx: &EvaluationContext,
) -> Option<AirChangesPerHour> {
    match resolve_flow_rate(data) {
        Some(flow) if ctx.has_volume() => Some(air_change_rate(flow, ctx.room_volume)),
        Some(_) => None,
        None => measured(data.air_change_rate).map(AirChangesPerHour),
    }
}

/// Room airflow summed over every supply record (one per supply filter).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirflowTotal {
    /// Present only when every record has a flow rate
    pub flow_rate: Option<CubicMetersPerHour>,
    pub air_change_rate: AirChangesPerHour,
}

impl AirflowTotal {
    pub fn display(&self) -> String {
        match self.flow_rate {
            Some(flow) => format!("Toplam {:.2} m³/h, {:.2} ACH", flow.0, self.air_change_rate.0),
            None => format!("Toplam {:.2} ACH", self.air_change_rate.0),
        }
    }
}

/// Total supply across airflow records. `None` when there are none or any
/// of them cannot be resolved.
pub fn airflow_total(
    records: &[&MeasurementRecord],
    ctx: &EvaluationContext,
) -> Option<AirflowTotal> {
    let data: Vec<&AirflowData> = records
        .iter()
        .filter_map(|record| match record {
            MeasurementRecord::AirflowData(d) => Some(d),
            _ => None,
        })
        .collect();
    if data.is_empty() {
        return None;
    }

    let flows: Option<Vec<f64>> = data.iter().map(|d| resolve_flow_rate(d).map(|f| f.0)).collect();
    if let Some(flows) = flows {
        if !ctx.has_volume() {
            return None;
        }
        let total = CubicMetersPerHour(round2(flows.iter().sum()));
        return Some(AirflowTotal {
            flow_rate: Some(total),
            air_change_rate: air_change_rate(total, ctx.room_volume),
        });
    }

    let rates: Option<Vec<f64>> = data
        .iter()
        .map(|d| resolve_air_change_rate(d, ctx).map(|a| a.0))
        .collect();
    rates.map(|rates| AirflowTotal {
        flow_rate: None,
        air_change_rate: AirChangesPerHour(round2(rates.iter().sum())),
    })
}

/// The 0.5 µm value used for classification: mean of raw readings if any.
pub fn particle_count_05(data: &ParticleCount) -> Option<f64> {
    if !data.readings05.is_empty() {
        return Some(average(&data.readings05));
    }
    measured(data.particle05)
}

fn direction_result(result: &Option<String>) -> Option<&str> {
    result.as_deref().map(str::trim).filter(|r| !r.is_empty())
}

impl MeasurementRecord {
    /// Verdict for this record, `None` when the rule's input is missing.
    pub fn evaluate(&self, ctx: &EvaluationContext) -> Option<Verdict> {
        let passes = match self {
            MeasurementRecord::AirflowData(d) => {
                resolve_air_change_rate(d, ctx).map(|ach| validate_air_change_rate(ach.0))
            }
            MeasurementRecord::PressureDifference(d) => measured(d.pressure).map(validate_pressure),
            MeasurementRecord::AirFlowDirection(d) => {
                direction_result(&d.result).map(validate_air_flow_direction)
            }
            MeasurementRecord::HepaLeakage(d) => {
                measured(d.actual_leakage).map(validate_hepa_leakage)
            }
            MeasurementRecord::ParticleCount(d) => {
                particle_count_05(d).map(|count| IsoClass::classify(count).passes())
            }
            MeasurementRecord::RecoveryTime(d) => {
                measured(d.duration).map(validate_recovery_time)
            }
            MeasurementRecord::TemperatureHumidity(d) => {
                match (measured(d.temperature), measured(d.humidity)) {
                    (Some(t), Some(h)) => Some(validate_temp_humidity(t, h)),
                    _ => None,
                }
            }
            MeasurementRecord::NoiseLevel(d) => measured(d.leq).map(validate_noise),
        };
        passes.map(Verdict::from)
    }

    /// Rewrite the stored air change rate from the flow and current volume.
    pub(crate) fn refresh_derived(&mut self, ctx: &EvaluationContext) {
        if let MeasurementRecord::AirflowData(d) = self {
            if let Some(flow) = resolve_flow_rate(d) {
                d.air_change_rate = ctx
                    .has_volume()
                    .then(|| air_change_rate(flow, ctx.room_volume).0);
            }
        }
    }

    /// Measured value formatted for documents; empty when not evaluable.
    pub fn display_value(&self, ctx: &EvaluationContext) -> String {
        match self {
            MeasurementRecord::AirflowData(d) => match resolve_air_change_rate(d, ctx) {
                Some(ach) => match resolve_flow_rate(d) {
                    Some(flow) => format!("{:.2} m³/h, {:.2} ACH", flow.0, ach.0),
                    None => format!("{:.2} ACH", ach.0),
                },
                None => resolve_flow_rate(d)
                    .map(|flow| format!("{:.2} m³/h", flow.0))
                    .unwrap_or_default(),
            },
            MeasurementRecord::PressureDifference(d) => measured(d.pressure)
                .map(|p| format!("{:.1} Pa", p))
                .unwrap_or_default(),
            MeasurementRecord::AirFlowDirection(d) => match (direction_result(&d.result), &d.direction) {
                (Some(result), Some(direction)) if !direction.trim().is_empty() => {
                    format!("{} ({})", result, direction.trim())
                }
                (Some(result), _) => result.to_string(),
                (None, _) => String::new(),
            },
            MeasurementRecord::HepaLeakage(d) => measured(d.actual_leakage)
                .map(|l| format!("%{:.4}", l))
                .unwrap_or_default(),
            MeasurementRecord::ParticleCount(d) => particle_count_05(d)
                .map(|count| {
                    format!("{:.0} partikül/m³ ({})", count, IsoClass::classify(count))
                })
                .unwrap_or_default(),
            MeasurementRecord::RecoveryTime(d) => measured(d.duration)
                .map(|m| format!("{:.1} dk", m))
                .unwrap_or_default(),
            MeasurementRecord::TemperatureHumidity(d) => {
                match (measured(d.temperature), measured(d.humidity)) {
                    (Some(t), Some(h)) => format!("{:.1} °C, %{:.1} RH", t, h),
                    (Some(t), None) => format!("{:.1} °C", t),
                    (None, Some(h)) => format!("%{:.1} RH", h),
                    (None, None) => String::new(),
                }
            }
            MeasurementRecord::NoiseLevel(d) => measured(d.leq)
                .map(|leq| format!("{:.1} dB(A)", leq))
                .unwrap_or_default(),
        }
    }
}
