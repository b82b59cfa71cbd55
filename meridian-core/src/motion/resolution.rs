//! Microstep resolution and mode line table

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Microstep subdivision of one full step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "u8", into = "u8"))]
pub enum Resolution {
    #[default]
    Full,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

/// Resolution persisted positions are expressed in
pub const CANONICAL_RESOLUTION: Resolution = Resolution::ThirtySecond;

impl Resolution {
    /// All resolutions, coarsest first
    pub const ALL: [Resolution; 6] = [
        Resolution::Full,
        Resolution::Half,
        Resolution::Quarter,
        Resolution::Eighth,
        Resolution::Sixteenth,
        Resolution::ThirtySecond,
    ];

    /// Microsteps per full step
    pub fn divisor(self) -> i32 {
        match self {
            Resolution::Full => 1,
            Resolution::Half => 2,
            Resolution::Quarter => 4,
            Resolution::Eighth => 8,
            Resolution::Sixteenth => 16,
            Resolution::ThirtySecond => 32,
        }
    }

    /// Parse a divisor; anything unknown is full step
    pub fn from_divisor(divisor: u8) -> Self {
        match divisor {
            2 => Resolution::Half,
            4 => Resolution::Quarter,
            8 => Resolution::Eighth,
            16 => Resolution::Sixteenth,
            32 => Resolution::ThirtySecond,
            _ => Resolution::Full,
        }
    }

    /// Driver mode line levels `[M0, M1, M2]`
    pub fn mode_lines(self) -> [bool; 3] {
        match self {
            Resolution::Full => [false, false, false],
            Resolution::Half => [true, false, false],
            Resolution::Quarter => [false, true, false],
            Resolution::Eighth => [true, true, false],
            Resolution::Sixteenth => [false, false, true],
            Resolution::ThirtySecond => [true, true, true],
        }
    }

    /// Rescale a step count from `from` to this resolution (truncating)
    pub fn rescale(self, value: i32, from: Resolution) -> i32 {
        ((value as i64 * self.divisor() as i64) / from.divisor() as i64) as i32
    }

    /// Position at this resolution as a canonical position
    pub fn to_canonical(self, position: i32) -> i32 {
        CANONICAL_RESOLUTION.rescale(position, self)
    }

    /// Canonical position at this resolution
    pub fn from_canonical(self, canonical: i32) -> i32 {
        self.rescale(canonical, CANONICAL_RESOLUTION)
    }
}

impl From<u8> for Resolution {
    fn from(divisor: u8) -> Self {
        Resolution::from_divisor(divisor)
    }
}

impl From<Resolution> for u8 {
    fn from(resolution: Resolution) -> u8 {
        resolution.divisor() as u8
    }
}
