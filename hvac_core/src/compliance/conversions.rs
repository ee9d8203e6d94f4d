//! # Unit Converters
//!
//! Pure numeric helpers feeding the validators. Results are rounded to two
//! decimals, the precision printed on reports.

use crate::units::{
    AirChangesPerHour, CubicMeters, CubicMetersPerHour, Meters, MetersPerSecond, Millimeters,
    SquareMeters,
};

/// Minimum number of sampling locations per ISO 14644-1
pub const MIN_SAMPLING_POINTS: u32 = 4;

/// Round half away from zero to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Room volume `area × height`.
///
/// ```rust
/// use hvac_core::compliance::conversions::room_volume;
/// use hvac_core::units::{Meters, SquareMeters};
///
/// assert_eq!(room_volume(SquareMeters(14.0), Meters(3.0)).0, 42.0);
/// ```
pub fn room_volume(surface_area: SquareMeters, height: Meters) -> CubicMeters {
    CubicMeters(round2(surface_area.0 * height.0))
}

/// Flow through one filter face: `v × w × h × 3600` (m³/h).
pub fn air_flow_rate_from_velocity(
    velocity: MetersPerSecond,
    filter_width: Millimeters,
    filter_height: Millimeters,
) -> CubicMetersPerHour {
    let width: Meters = filter_width.into();
    let height: Meters = filter_height.into();
    CubicMetersPerHour(round2(velocity.0 * width.0 * height.0 * 3600.0))
}

/// Air changes per hour. A zero volume yields `0.0`, meaning "cannot evaluate".
pub fn air_change_rate(total_flow: CubicMetersPerHour, volume: CubicMeters) -> AirChangesPerHour {
    if volume.0 == 0.0 {
        return AirChangesPerHour(0.0);
    }
    AirChangesPerHour(round2(total_flow.0 / volume.0))
}

/// ISO 14644-1 sampling locations: `max(4, round(sqrt(10 × area)))`.
pub fn sampling_point_count(area: SquareMeters) -> u32 {
    let points = (10.0 * area.0.max(0.0)).sqrt().round() as u32;
    points.max(MIN_SAMPLING_POINTS)
}

/// Arithmetic mean; `0.0` for no readings.
pub fn average(readings: &[f64]) -> f64 {
    if readings.is_empty() {
        return 0.0;
    }
    readings.iter().sum::<f64>() / readings.len() as f64
}
