//! # Unit Types
//!
//! Type-safe wrappers for the SI quantities that appear in cleanroom
//! qualification. These are plain `f64` newtypes so that JSON stays a bare
//! number while the converters cannot be called with swapped arguments.
//!
//! ## Quantities
//!
//! - Length: metres (m), millimetres (mm, filter dimensions)
//! - Area / volume: m², m³
//! - Air: velocity (m/s), flow rate (m³/h), air changes per hour (ACH)
//!
//! ## Example
//!
//! ```rust
//! use hvac_core::units::{Meters, Millimeters};
//!
//! let width: Meters = Millimeters(610.0).into();
//! assert_eq!(width.0, 0.61);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Div, Mul, Sub};

// ============================================================================
// Length, Area, Volume
// ============================================================================

/// Length in metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Meters(pub f64);

/// Length in millimetres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Millimeters> for Meters {
    fn from(mm: Millimeters) -> Self {
        Meters(mm.0 / 1000.0)
    }
}

impl From<Meters> for Millimeters {
    fn from(m: Meters) -> Self {
        Millimeters(m.0 * 1000.0)
    }
}

/// Area in square metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SquareMeters(pub f64);

/// Volume in cubic metres
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicMeters(pub f64);

// ============================================================================
// Air Movement
// ============================================================================

/// Air velocity in metres per second
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetersPerSecond(pub f64);

/// Volumetric air flow in cubic metres per hour
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CubicMetersPerHour(pub f64);

/// Air change rate (room volumes per hour)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AirChangesPerHour(pub f64);

// ============================================================================
// Arithmetic Implementations (macro to reduce boilerplate)
// ============================================================================

macro_rules! impl_arithmetic {
    ($type:ty) => {
        impl Add for $type {
            type Output = Self;
            fn add(self, rhs: Self) -> Self::Output {
                Self(self.0 + rhs.0)
            }
        }

        impl Sub for $type {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self::Output {
                Self(self.0 - rhs.0)
            }
        }

        impl Mul<f64> for $type {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self::Output {
                Self(self.0 * rhs)
            }
        }

        impl Div<f64> for $type {
            type Output = Self;
            fn div(self, rhs: f64) -> Self::Output {
                Self(self.0 / rhs)
            }
        }

        impl $type {
            /// Get the raw f64 value
            pub fn value(self) -> f64 {
                self.0
            }

            /// Create from raw f64 value
            pub fn new(value: f64) -> Self {
                Self(value)
            }
        }
    };
}

impl_arithmetic!(Meters);
impl_arithmetic!(Millimeters);
impl_arithmetic!(SquareMeters);
impl_arithmetic!(CubicMeters);
impl_arithmetic!(MetersPerSecond);
impl_arithmetic!(CubicMetersPerHour);
impl_arithmetic!(AirChangesPerHour);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millimeters_to_meters() {
        let m: Meters = Millimeters(1220.0).into();
        assert_eq!(m.0, 1.22);

        let mm: Millimeters = Meters(0.5).into();
        assert_eq!(mm.0, 500.0);
    }

    #[test]
    fn test_arithmetic() {
        let a = CubicMetersPerHour(300.0);
        let b = CubicMetersPerHour(200.0);
        assert_eq!((a + b).0, 500.0);
        assert_eq!((a - b).0, 100.0);
        assert_eq!((a * 2.0).0, 600.0);
        assert_eq!((a / 3.0).0, 100.0);
    }

    #[test]
    fn test_serialization_is_bare_number() {
        let p = CubicMeters(42.5);
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "42.5");

        let roundtrip: CubicMeters = serde_json::from_str(&json).unwrap();
        assert_eq!(p, roundtrip);
    }
}
