//! # ISO 14644-1 Classifier
//!
//! Maps a ≥0.5 µm particle concentration (particles/m³) to a cleanliness
//! class. Classes are reported by their bare number ("5" .. "8").
//!
//! | Upper bound (inclusive) | Class |
//! |---|---|
//! | 3 520 | 5 |
//! | 35 200 | 6 |
//! | 352 000 | 7 |
//! | above | 8 |
//!
//! A room passes when its class is 7 or cleaner.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Cleanliness class resolved from the 0.5 µm count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IsoClass {
    #[serde(rename = "5")]
    Class5,
    #[serde(rename = "6")]
    Class6,
    #[serde(rename = "7")]
    Class7,
    #[serde(rename = "8")]
    Class8,
}

/// Ordered `(upper bound, class)` pairs; first match wins.
const BREAKPOINTS: [(f64, IsoClass); 3] = [
    (3_520.0, IsoClass::Class5),
    (35_200.0, IsoClass::Class6),
    (352_000.0, IsoClass::Class7),
];

impl IsoClass {
    /// Dirtiest class that still passes
    pub const PASS_LIMIT: IsoClass = IsoClass::Class7;

    /// Classify a 0.5 µm concentration.
    ///
    /// ```rust
    /// use hvac_core::compliance::iso::IsoClass;
    ///
    /// assert_eq!(IsoClass::classify(3_000.0), IsoClass::Class5);
    /// assert_eq!(IsoClass::classify(400_000.0), IsoClass::Class8);
    /// ```
    pub fn classify(count_05: f64) -> IsoClass {
        BREAKPOINTS
            .iter()
            .find(|(limit, _)| count_05 <= *limit)
            .map(|(_, class)| *class)
            .unwrap_or(IsoClass::Class8)
    }

    /// Numeric ISO class
    pub fn rank(self) -> u8 {
        match self {
            IsoClass::Class5 => 5,
            IsoClass::Class6 => 6,
            IsoClass::Class7 => 7,
            IsoClass::Class8 => 8,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IsoClass::Class5 => "5",
            IsoClass::Class6 => "6",
            IsoClass::Class7 => "7",
            IsoClass::Class8 => "8",
        }
    }

    /// True when this class is at least as clean as `target`.
    pub fn meets(self, target: IsoClass) -> bool {
        self.rank() <= target.rank()
    }

    pub fn passes(self) -> bool {
        self.meets(Self::PASS_LIMIT)
    }
}

impl fmt::Display for IsoClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ISO Sınıf {}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_breakpoints_inclusive() {
        assert_eq!(IsoClass::classify(0.0), IsoClass::Class5);
        assert_eq!(IsoClass::classify(3_520.0), IsoClass::Class5);
        assert_eq!(IsoClass::classify(3_520.5), IsoClass::Class6);
        assert_eq!(IsoClass::classify(35_200.0), IsoClass::Class6);
        assert_eq!(IsoClass::classify(352_000.0), IsoClass::Class7);
        assert_eq!(IsoClass::classify(352_001.0), IsoClass::Class8);
    }

    #[test]
    fn test_pass_iff_count_within_class_7() {
        for count in [0.0, 3_000.0, 35_200.0, 352_000.0, 352_000.1, 1.0e7] {
            assert_eq!(IsoClass::classify(count).passes(), count <= 352_000.0);
        }
    }

    #[test]
    fn test_classification_is_monotonic() {
        let counts: Vec<f64> = (0..200).map(|i| (i as f64) * 2_500.0).collect();
        for pair in counts.windows(2) {
            let a = IsoClass::classify(pair[0]).rank();
            let b = IsoClass::classify(pair[1]).rank();
            assert!(a <= b, "{} -> {} but {} -> {}", pair[0], a, pair[1], b);
        }
    }

    #[test]
    fn test_serializes_as_bare_number_label() {
        assert_eq!(serde_json::to_string(&IsoClass::Class7).unwrap(), "\"7\"");
        assert_eq!(IsoClass::Class6.to_string(), "ISO Sınıf 6");
    }
}
